use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::entities::money::{Amount, Currency};
use crate::interfaces::payment_gateway::{GatewayError, PaymentGatewayInterface};

pub const GATEWAY_NAME: &str = "simulated";

/// In-process gateway that approves every request after a fixed latency.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentGateway {
    latency: Duration,
}

impl SimulatedPaymentGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    async fn settle(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PaymentGatewayInterface for SimulatedPaymentGateway {
    fn name(&self) -> &str {
        GATEWAY_NAME
    }

    async fn escrow(
        &self,
        amount: Amount,
        currency: &Currency,
        description: &str,
    ) -> Result<String, GatewayError> {
        self.settle().await;
        if !amount.is_positive() {
            return Err(GatewayError::Rejected(format!("invalid amount {amount}")));
        }
        let id = format!("esc_{}", Uuid::new_v4());
        debug!("escrowed {amount} {currency} as {id}: {description}");
        Ok(id)
    }

    async fn release_escrow(
        &self,
        escrow_id: &str,
        amount: Amount,
        currency: &Currency,
        recipient_user_id: &str,
    ) -> Result<String, GatewayError> {
        self.settle().await;
        let id = format!("txn_{}", Uuid::new_v4());
        debug!("released {amount} {currency} from {escrow_id} to {recipient_user_id} as {id}");
        Ok(id)
    }

    async fn refund_escrow(&self, escrow_id: &str) -> Result<(), GatewayError> {
        self.settle().await;
        debug!("refunded escrow {escrow_id}");
        Ok(())
    }

    async fn process_withdrawal(
        &self,
        user_id: &str,
        amount: Amount,
        currency: &Currency,
    ) -> Result<String, GatewayError> {
        self.settle().await;
        let id = format!("wdr_{}", Uuid::new_v4());
        debug!("withdrew {amount} {currency} for {user_id} as {id}");
        Ok(id)
    }
}
