use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Response code reported by the platform billing service.
///
/// Values follow Google Play Billing's BillingResponseCode:
/// https://developer.android.com/reference/com/android/billingclient/api/BillingClient.BillingResponseCode
///
/// StoreKit bridges are expected to map SKError codes onto the closest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum BillingResponseCode {
    /// The request has reached the maximum timeout before Google Play
    /// responds.
    ServiceTimeout = -3,
    /// The requested feature is not supported by the Play Store on the current
    /// device.
    FeatureNotSupported = -2,
    /// The app is not connected to the Play Store service via the Google Play
    /// Billing Library.
    ServiceDisconnected = -1,
    /// Success.
    Ok = 0,
    /// Transaction was canceled by the user.
    UserCanceled = 1,
    /// The service is currently unavailable.
    ServiceUnavailable = 2,
    /// A user billing error occurred during processing.
    BillingUnavailable = 3,
    /// The requested product is not available for purchase.
    ItemUnavailable = 4,
    /// Error resulting from incorrect usage of the API.
    DeveloperError = 5,
    /// Fatal error during the API action.
    Error = 6,
    /// The purchase failed because the item is already owned.
    ItemAlreadyOwned = 7,
    /// Requested action on the item failed since it is not owned by the user.
    ItemNotOwned = 8,
    /// A network error occurred during the operation.
    NetworkError = 12,
}

/// Failed billing result, as handed back by a platform bridge.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{code:?}: {debug_message}")]
pub struct BillingServiceError {
    pub code: BillingResponseCode,
    #[serde(default)]
    pub debug_message: String,
}

impl BillingServiceError {
    pub fn new(code: BillingResponseCode, debug_message: impl Into<String>) -> Self {
        Self {
            code,
            debug_message: debug_message.into(),
        }
    }
}
