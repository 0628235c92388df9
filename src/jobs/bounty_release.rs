use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    database::surrdb_utils::record_key,
    interfaces::repositories::contribution::ContributionRepositoryInterface,
    middleware::{ctx::Ctx, error::AppResult, mw_ctx::CtxState},
};

const BATCH_SIZE: u32 = 50;

/// Releases escrow for verified contributions still missing a payout. Returns the
/// number released.
pub async fn retry_pending_releases(state: &CtxState) -> AppResult<usize> {
    let ctx = Ctx::system("bounty_release");
    let pending = state.db.contributions.list_pending_release(BATCH_SIZE).await?;
    if pending.is_empty() {
        return Ok(0);
    }
    debug!(req_id = %ctx.req_id(), "{} contributions waiting for release", pending.len());

    let escrow_service = state.escrow_service(&ctx);
    let results = join_all(pending.iter().map(|contribution| {
        let contribution_id = record_key(&contribution.id);
        let escrow_service = &escrow_service;
        async move {
            let result = escrow_service
                .release_bounty_to_contributor(&contribution_id)
                .await;
            (contribution_id, result)
        }
    }))
    .await;

    let mut released = 0;
    for (contribution_id, result) in results {
        match result {
            Ok(payment) => {
                released += 1;
                debug!(
                    req_id = %ctx.req_id(),
                    "released {contribution_id} as payment {}",
                    payment.id
                );
            }
            Err(err) => {
                warn!(req_id = %ctx.req_id(), "retry release of {contribution_id} failed: {err}")
            }
        }
    }
    if released > 0 {
        info!(req_id = %ctx.req_id(), "released {released} pending bounties");
    }
    Ok(released)
}

pub fn run(state: Arc<CtxState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if let Err(err) = retry_pending_releases(&state).await {
                warn!("pending release sweep failed: {err}");
            }
        }
    })
}
