use thiserror::Error;

use crate::data::models::billing_service::billing_result_model::{
    BillingResponseCode, BillingServiceError,
};

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Not connected to the billing service.")]
    NotConnected,
    #[error("Operation was cancelled.")]
    Cancelled,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid product ids: {product_ids:?}")]
    InvalidProducts { product_ids: Vec<String> },
    #[error("'{0}' is not supported on this platform.")]
    NotSupported(&'static str),
    #[error(transparent)]
    Purchase(#[from] PurchaseError),
    #[error("Purchase verification failed: {0}")]
    Verification(String),
    #[error("Invalid billing configuration: {0}")]
    Config(String),
}

/// Failure of a purchase flow. All underlying causes (user cancellation,
/// payment decline, network failure, ...) collapse into this one error, with
/// the cause kept in `reason`.
#[derive(Debug, Error)]
#[error("Purchase failed ({reason:?}): {message}")]
pub struct PurchaseError {
    pub reason: PurchaseErrorReason,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseErrorReason {
    AppStoreUnavailable,
    BillingUnavailable,
    PaymentInvalid,
    PaymentNotAllowed,
    ProductRequestFailed,
    RestoreFailed,
    ServiceUnavailable,
    InvalidProduct,
    ItemUnavailable,
    GeneralError,
    UserCancelled,
    DeveloperError,
    AlreadyOwned,
    NotOwned,
    ServiceDisconnected,
    ServiceTimeout,
    FeatureNotSupported,
    NetworkError,
    /// Another purchase flow for the same product has not completed yet.
    PurchaseInProgress,
}

impl PurchaseError {
    pub fn new(reason: PurchaseErrorReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl From<BillingResponseCode> for PurchaseErrorReason {
    fn from(code: BillingResponseCode) -> Self {
        match code {
            BillingResponseCode::ServiceTimeout => PurchaseErrorReason::ServiceTimeout,
            BillingResponseCode::FeatureNotSupported => PurchaseErrorReason::FeatureNotSupported,
            BillingResponseCode::ServiceDisconnected => PurchaseErrorReason::ServiceDisconnected,
            BillingResponseCode::UserCanceled => PurchaseErrorReason::UserCancelled,
            BillingResponseCode::ServiceUnavailable => PurchaseErrorReason::ServiceUnavailable,
            BillingResponseCode::BillingUnavailable => PurchaseErrorReason::BillingUnavailable,
            BillingResponseCode::ItemUnavailable => PurchaseErrorReason::ItemUnavailable,
            BillingResponseCode::DeveloperError => PurchaseErrorReason::DeveloperError,
            BillingResponseCode::ItemAlreadyOwned => PurchaseErrorReason::AlreadyOwned,
            BillingResponseCode::ItemNotOwned => PurchaseErrorReason::NotOwned,
            BillingResponseCode::NetworkError => PurchaseErrorReason::NetworkError,
            BillingResponseCode::Ok | BillingResponseCode::Error => {
                PurchaseErrorReason::GeneralError
            }
        }
    }
}

impl From<BillingServiceError> for PurchaseError {
    fn from(e: BillingServiceError) -> Self {
        Self {
            reason: e.code.into(),
            message: e.debug_message,
        }
    }
}
