use async_trait::async_trait;
use validator::ValidateUrl;

use crate::entities::contribution::Contribution;
use crate::entities::task::Task;
use crate::interfaces::contribution_verifier::{ContributionVerifierInterface, Verdict};

/// Accepts a contribution whose reference is an http(s) URL.
#[derive(Debug, Clone, Default)]
pub struct ReferenceVerifier;

#[async_trait]
impl ContributionVerifierInterface for ReferenceVerifier {
    async fn verify(&self, _task: &Task, contribution: &Contribution) -> Verdict {
        let reference = contribution.reference.trim();
        let is_http = reference.starts_with("https://") || reference.starts_with("http://");
        if is_http && reference.validate_url() {
            Verdict::Verified
        } else {
            Verdict::Failed {
                reason: format!("reference '{reference}' is not a http(s) url"),
            }
        }
    }
}
