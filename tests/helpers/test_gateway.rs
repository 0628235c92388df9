use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bounty_board::entities::money::{Amount, Currency};
use bounty_board::interfaces::payment_gateway::{GatewayError, PaymentGatewayInterface};
use uuid::Uuid;

/// Gateway double with switchable failures and call counters.
#[derive(Debug, Default)]
pub struct TestGateway {
    pub fail_escrow: AtomicBool,
    pub fail_release: AtomicBool,
    pub fail_refund: AtomicBool,
    pub hang_release: AtomicBool,
    pub latency_ms: AtomicU64,
    pub refunded: Mutex<Vec<String>>,
    pub escrows: AtomicUsize,
    pub releases: AtomicUsize,
    pub refunds: AtomicUsize,
    pub withdrawals: AtomicUsize,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn set_fail_escrow(&self, fail: bool) {
        self.fail_escrow.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_release(&self, fail: bool) {
        self.fail_release.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_refund(&self, fail: bool) {
        self.fail_refund.store(fail, Ordering::SeqCst);
    }

    pub fn set_hang_release(&self, hang: bool) {
        self.hang_release.store(hang, Ordering::SeqCst);
    }

    /// Delay applied to escrow, release and refund calls.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn refunded_escrows(&self) -> Vec<String> {
        self.refunded.lock().unwrap().clone()
    }

    async fn lag(&self) {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    pub fn escrow_count(&self) -> usize {
        self.escrows.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn withdrawal_count(&self) -> usize {
        self.withdrawals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGatewayInterface for TestGateway {
    fn name(&self) -> &str {
        "test"
    }

    async fn escrow(
        &self,
        _amount: Amount,
        _currency: &Currency,
        _description: &str,
    ) -> Result<String, GatewayError> {
        self.lag().await;
        if self.fail_escrow.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("escrow down".to_string()));
        }
        self.escrows.fetch_add(1, Ordering::SeqCst);
        Ok(format!("esc_{}", Uuid::new_v4().simple()))
    }

    async fn release_escrow(
        &self,
        _escrow_id: &str,
        _amount: Amount,
        _currency: &Currency,
        _recipient_user_id: &str,
    ) -> Result<String, GatewayError> {
        self.lag().await;
        if self.hang_release.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected("release refused".to_string()));
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(format!("txn_{}", Uuid::new_v4().simple()))
    }

    async fn refund_escrow(&self, escrow_id: &str) -> Result<(), GatewayError> {
        self.lag().await;
        if self.fail_refund.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("refund down".to_string()));
        }
        self.refunds.fetch_add(1, Ordering::SeqCst);
        self.refunded.lock().unwrap().push(escrow_id.to_string());
        Ok(())
    }

    async fn process_withdrawal(
        &self,
        _user_id: &str,
        _amount: Amount,
        _currency: &Currency,
    ) -> Result<String, GatewayError> {
        self.withdrawals.fetch_add(1, Ordering::SeqCst);
        Ok(format!("wdr_{}", Uuid::new_v4().simple()))
    }
}
