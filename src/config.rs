use dotenvy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_namespace: String,
    pub db_database: String,
    pub db_password: Option<String>,
    pub db_username: Option<String>,
    pub db_url: String,
    pub log_filter: String,
    pub default_currency: String,
    pub gateway_timeout_ms: u64,
    pub gateway_latency_ms: u64,
    pub reputation_contribution_base: i64,
    pub reputation_bounty_divisor: i64,
    pub reputation_endorsement_score: i64,
    pub reputation_mentor_score: i64,
    pub release_inline: bool,
    pub release_retry_interval_secs: u64,
    pub release_lock_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let db_namespace = std::env::var("DB_NAMESPACE").unwrap_or("namespace".to_string());
        let db_database = std::env::var("DB_DATABASE").unwrap_or("database".to_string());
        let db_password = std::env::var("DB_PASSWORD").ok();
        let db_username = std::env::var("DB_USERNAME").ok();
        let db_url = std::env::var("DB_URL").unwrap_or("mem://".to_string());
        let log_filter = std::env::var("RUST_LOG").unwrap_or("bounty_board=info".to_string());
        let default_currency = std::env::var("DEFAULT_CURRENCY").unwrap_or("USD".to_string());

        let gateway_timeout_ms = std::env::var("GATEWAY_TIMEOUT_MS").map_or(5000, |t| {
            t.parse::<u64>()
                .expect("GATEWAY_TIMEOUT_MS must be number")
        });
        let gateway_latency_ms = std::env::var("GATEWAY_LATENCY_MS").map_or(50, |t| {
            t.parse::<u64>()
                .expect("GATEWAY_LATENCY_MS must be number")
        });

        let reputation_contribution_base = std::env::var("REPUTATION_CONTRIBUTION_BASE")
            .map_or(100, |t| {
                t.parse::<i64>()
                    .expect("REPUTATION_CONTRIBUTION_BASE must be number")
            });
        let reputation_bounty_divisor = std::env::var("REPUTATION_BOUNTY_DIVISOR").map_or(10, |t| {
            t.parse::<i64>()
                .expect("REPUTATION_BOUNTY_DIVISOR must be number")
        });
        let reputation_endorsement_score = std::env::var("REPUTATION_ENDORSEMENT_SCORE")
            .map_or(20, |t| {
                t.parse::<i64>()
                    .expect("REPUTATION_ENDORSEMENT_SCORE must be number")
            });
        let reputation_mentor_score = std::env::var("REPUTATION_MENTOR_SCORE").map_or(5, |t| {
            t.parse::<i64>()
                .expect("REPUTATION_MENTOR_SCORE must be number")
        });

        let release_inline = std::env::var("RELEASE_INLINE")
            .map(|v| v.eq("true"))
            .unwrap_or(true);
        let release_retry_interval_secs = std::env::var("RELEASE_RETRY_INTERVAL_SECS")
            .map_or(60, |t| {
                t.parse::<u64>()
                    .expect("RELEASE_RETRY_INTERVAL_SECS must be number")
            });
        let release_lock_secs = std::env::var("RELEASE_LOCK_SECS").map_or(60, |t| {
            t.parse::<u64>().expect("RELEASE_LOCK_SECS must be number")
        });

        Self {
            db_namespace,
            db_database,
            db_password,
            db_username,
            db_url,
            log_filter,
            default_currency,
            gateway_timeout_ms,
            gateway_latency_ms,
            reputation_contribution_base,
            reputation_bounty_divisor,
            reputation_endorsement_score,
            reputation_mentor_score,
            release_inline,
            release_retry_interval_secs,
            release_lock_secs,
        }
    }
}
