use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::money::{Amount, Currency};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("gateway rejected the request: {0}")]
    Rejected(String),
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),
}

impl GatewayError {
    /// The request may have been applied by the gateway.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }
}

/// Money movement primitives. Returned ids are opaque gateway references.
#[async_trait]
pub trait PaymentGatewayInterface: Send + Sync {
    fn name(&self) -> &str;

    async fn escrow(
        &self,
        amount: Amount,
        currency: &Currency,
        description: &str,
    ) -> Result<String, GatewayError>;

    async fn release_escrow(
        &self,
        escrow_id: &str,
        amount: Amount,
        currency: &Currency,
        recipient_user_id: &str,
    ) -> Result<String, GatewayError>;

    async fn refund_escrow(&self, escrow_id: &str) -> Result<(), GatewayError>;

    async fn process_withdrawal(
        &self,
        user_id: &str,
        amount: Amount,
        currency: &Currency,
    ) -> Result<String, GatewayError>;
}
