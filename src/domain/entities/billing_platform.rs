use serde::{Deserialize, Serialize};

/// Platform billing service a facade talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingPlatform {
    #[default]
    GooglePlay,
    AppStore,
}

/// Optional operations a platform supports. Calls to unsupported operations
/// fail with `BillingError::NotSupported` (or are skipped, for
/// fire-and-forget calls).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub purchase_history: bool,
    pub subscription_replacement: bool,
    pub code_redemption: bool,
    pub receipt_data: bool,
    pub pending_purchases: bool,
}

impl BillingPlatform {
    pub fn capabilities(&self) -> PlatformCapabilities {
        match self {
            BillingPlatform::GooglePlay => PlatformCapabilities {
                purchase_history: true,
                subscription_replacement: true,
                code_redemption: false,
                receipt_data: false,
                pending_purchases: true,
            },
            BillingPlatform::AppStore => PlatformCapabilities {
                purchase_history: false,
                subscription_replacement: false,
                code_redemption: true,
                receipt_data: true,
                pending_purchases: true,
            },
        }
    }
}
