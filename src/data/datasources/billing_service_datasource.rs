use async_trait::async_trait;

use crate::{
    data::models::billing_service::{
        billing_result_model::BillingServiceError, product_details_model::ProductDetailsModel,
        purchase_model::PurchaseModel, storefront_model::StorefrontModel,
    },
    domain::entities::{
        billing_platform::BillingPlatform,
        item_type::{ProductKind, SubscriptionReplacementMode},
    },
};

/// Bridge to a platform billing service (Google Play Billing, StoreKit).
///
/// Implementations wrap the native SDK and translate its results into the
/// models below. They are not expected to track connection state for the
/// caller, nor to deduplicate finalize/consume calls; the facade does both.
#[async_trait]
pub trait BillingServiceDatasource: Send + Sync {
    fn platform(&self) -> BillingPlatform;

    /// Establishes the connection to the billing service.
    ///
    /// enablePendingPurchases:
    ///   Whether purchases that complete asynchronously (e.g. cash payments)
    ///   are accepted. When disabled, pending purchase flows fail.
    async fn start_connection(&self, enable_pending_purchases: bool)
        -> Result<(), BillingServiceError>;

    /// Releases the connection. Synchronous so that it can run while dropping
    /// the owning facade.
    fn end_connection(&self);

    /// Returns details for the subset of `product_ids` known to the store as
    /// products of the given kind. Unknown ids are left out, in no particular
    /// order.
    async fn query_product_details(
        &self,
        kind: ProductKind,
        product_ids: &[String],
    ) -> Result<Vec<ProductDetailsModel>, BillingServiceError>;

    /// Active (owned, unconsumed, not cancelled) purchases of the given kind.
    async fn query_purchases(&self, kind: ProductKind)
        -> Result<Vec<PurchaseModel>, BillingServiceError>;

    /// All purchases of the given kind, including expired, cancelled and
    /// consumed ones.
    async fn query_purchase_history(
        &self,
        kind: ProductKind,
    ) -> Result<Vec<PurchaseModel>, BillingServiceError>;

    async fn launch_purchase_flow(
        &self,
        params: PurchaseFlowParams<'_>,
    ) -> Result<PurchaseModel, BillingServiceError>;

    async fn launch_replace_subscription_flow(
        &self,
        new_product_id: &str,
        original_purchase_token: &str,
        replacement_mode: SubscriptionReplacementMode,
    ) -> Result<PurchaseModel, BillingServiceError>;

    /// transactionIdentifier:
    ///   Purchase token (Google Play) or transaction id (App Store) of the
    ///   purchase to consume.
    async fn consume_purchase(
        &self,
        product_id: &str,
        transaction_identifier: &str,
    ) -> Result<(), BillingServiceError>;

    /// Acknowledges (Google Play) or finishes (App Store) a transaction.
    /// Finalizing an already finalized transaction succeeds.
    async fn finalize_transaction(&self, transaction_identifier: &str)
        -> Result<(), BillingServiceError>;

    async fn storefront(&self) -> Option<StorefrontModel>;

    /// Raw receipt bytes, if the platform keeps an app receipt.
    async fn receipt(&self) -> Option<Vec<u8>>;

    async fn can_make_payments(&self) -> bool;

    fn present_code_redemption(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct PurchaseFlowParams<'a> {
    pub product_id: &'a str,
    pub kind: ProductKind,
    pub obfuscated_account_id: Option<&'a str>,
    pub obfuscated_profile_id: Option<&'a str>,
    /// Offer to purchase. Only meaningful for subscriptions.
    pub offer_token: Option<&'a str>,
}
