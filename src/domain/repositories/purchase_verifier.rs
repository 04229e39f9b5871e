use async_trait::async_trait;

use crate::{domain::entities::in_app_billing_purchase::InAppBillingPurchase, errors::BillingError};

/// Checks that a purchase reported by the device is genuine.
#[async_trait]
pub trait PurchaseVerifier: Send + Sync {
    /// Returns `Ok(false)` for purchases that are not genuine. Errors are
    /// treated as failed verification by callers.
    async fn verify_purchase(&self, purchase: &InAppBillingPurchase) -> Result<bool, BillingError>;
}
