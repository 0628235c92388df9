use async_trait::async_trait;

use crate::entities::contribution::Contribution;
use crate::entities::task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Failed { reason: String },
}

#[async_trait]
pub trait ContributionVerifierInterface: Send + Sync {
    async fn verify(&self, task: &Task, contribution: &Contribution) -> Verdict;
}
