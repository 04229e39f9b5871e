use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct InAppBillingPurchase {
    /// Transaction identifier (App Store transaction id, Google Play order
    /// id).
    pub id: String,
    pub product_id: String,
    /// All products contained in this purchase. Usually just `product_id`.
    pub product_ids: Vec<String>,
    /// Token used to acknowledge, consume or replace the purchase. On the App
    /// Store this is the original transaction id.
    pub purchase_token: String,
    pub transaction_date: DateTime<Utc>,
    pub state: PurchaseState,
    pub consumption_state: ConsumptionState,
    /// Whether the purchase was acknowledged/finalized.
    pub is_acknowledged: bool,
    pub auto_renewing: bool,
    pub quantity: u32,
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
    /// Signed data as handed out by the platform (Google Play original JSON,
    /// or the App Store JWS representation). Input for purchase
    /// verification.
    pub original_json: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    Purchased,
    Canceled,
    Pending,
    Restored,
    Deferred,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionState {
    NotYetConsumed,
    Consumed,
}
