use bounty_board::config::AppConfig;
use bounty_board::init;
use bounty_board::middleware::error::AppResult;
use bounty_board::utils::logging::init_logging;

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);
    init::start(config).await
}
