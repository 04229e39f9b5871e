use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::entities::{
        billing_platform::{BillingPlatform, PlatformCapabilities},
        finalize_result::FinalizeResult,
        in_app_billing_product::InAppBillingProduct,
        in_app_billing_purchase::InAppBillingPurchase,
        item_type::{ItemType, SubscriptionReplacementMode},
        storefront::Storefront,
    },
    errors::BillingError,
};

/// Optional parameters of a purchase flow.
#[derive(Debug, Clone, Default)]
pub struct PurchaseOptions {
    /// Google Play: an obfuscated string that is uniquely associated with the
    /// user's account in your app.
    pub obfuscated_account_id: Option<String>,
    /// Google Play: an obfuscated string that is uniquely associated with the
    /// user's profile in your app.
    pub obfuscated_profile_id: Option<String>,
    /// Offer token of the subscription offer to purchase. Defaults to the
    /// product's first offer.
    pub sub_offer_token: Option<String>,
}

/// Uniform asynchronous surface over a platform billing service.
///
/// Every async operation can be cancelled through its token, in which case it
/// resolves with `BillingError::Cancelled`. Purchase, upgrade, consume and
/// finalize calls fail with `BillingError::NotConnected` outside of a
/// connection.
#[async_trait]
pub trait InAppBilling: Send + Sync {
    /// Whether a connection to the billing service is active.
    fn is_connected(&self) -> bool;
    fn set_is_connected(&self, connected: bool);

    fn in_testing_mode(&self) -> bool;
    /// In testing mode, purchase verification is skipped.
    fn set_in_testing_mode(&self, in_testing_mode: bool);

    /// Whether unknown product ids are silently dropped by
    /// `get_product_info`, rather than failing the call.
    fn ignore_invalid_products(&self) -> bool;
    fn set_ignore_invalid_products(&self, ignore_invalid_products: bool);

    fn platform(&self) -> BillingPlatform;
    fn capabilities(&self) -> PlatformCapabilities;

    /// Connects to the billing service. Returns `false` if the service could
    /// not be reached.
    async fn connect(
        &self,
        enable_pending_purchases: bool,
        cancel: &CancellationToken,
    ) -> Result<bool, BillingError>;

    async fn disconnect(&self, cancel: &CancellationToken) -> Result<(), BillingError>;

    /// Returns product information for the given ids, in input order.
    async fn get_product_info(
        &self,
        item_type: ItemType,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingProduct>, BillingError>;

    /// Returns all current purchases of the item type. If a verifier is
    /// configured and it rejects a purchase, that purchase is not contained in
    /// the result.
    async fn get_purchases(
        &self,
        item_type: ItemType,
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingPurchase>, BillingError>;

    /// Returns the most recent purchases made by the user, even if expired,
    /// cancelled or consumed. Only available on platforms that keep a
    /// purchase history.
    async fn get_purchases_history(
        &self,
        item_type: ItemType,
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingPurchase>, BillingError>;

    /// Purchases a product or subscription. Any failure of the flow is
    /// reported as `BillingError::Purchase`.
    async fn purchase(
        &self,
        product_id: &str,
        item_type: ItemType,
        options: PurchaseOptions,
        cancel: &CancellationToken,
    ) -> Result<InAppBillingPurchase, BillingError>;

    /// Upgrades/downgrades a previously purchased subscription.
    ///
    /// originalPurchaseToken:
    ///   Purchase token of the subscription to replace. Must not be empty.
    async fn upgrade_purchased_subscription(
        &self,
        new_product_id: &str,
        original_purchase_token: &str,
        replacement_mode: SubscriptionReplacementMode,
        cancel: &CancellationToken,
    ) -> Result<InAppBillingPurchase, BillingError>;

    /// Consumes a purchase so that it can be bought again. Returns `false` if
    /// the transaction was already consumed.
    ///
    /// `cancel` is only observed before the request reaches the billing
    /// service.
    async fn consume_purchase(
        &self,
        product_id: &str,
        transaction_identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, BillingError>;

    /// Acknowledges/finalizes purchases by transaction identifier. Returns one
    /// result per input id, in input order.
    async fn finalize_purchase(
        &self,
        transaction_identifiers: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FinalizeResult>, BillingError>;

    /// Acknowledges/finalizes all purchases of the given products. Returns one
    /// result per input id, in input order.
    async fn finalize_purchase_of_product(
        &self,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FinalizeResult>, BillingError>;

    async fn storefront(&self) -> Option<Storefront>;

    /// Base64-encoded app receipt, where the platform keeps one.
    async fn receipt_data(&self) -> Option<String>;

    /// Whether the user is allowed to make payments.
    async fn can_make_payments(&self) -> bool;

    /// Shows the platform sheet for redeeming subscription offer codes.
    fn present_code_redemption(&self);
}
