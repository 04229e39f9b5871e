use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::domain::entities::item_type::ProductKind;

/// Product details as handed over by a platform bridge.
///
/// Shape follows Google Play Billing's ProductDetails:
/// https://developer.android.com/reference/com/android/billingclient/api/ProductDetails
///
/// StoreKit bridges fill one-time products through
/// `one_time_purchase_offer_details` and subscriptions through a single
/// `subscription_offer_details` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsModel {
    pub product_id: String,
    pub product_type: ProductKind,
    /// Title, usually suffixed with the app name on Google Play.
    pub title: String,
    /// Plain product name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Present for one-time products.
    pub one_time_purchase_offer_details: Option<OneTimePurchaseOfferDetailsModel>,
    /// Present for subscriptions, one entry per base plan / offer.
    pub subscription_offer_details: Option<Vec<SubscriptionOfferDetailsModel>>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimePurchaseOfferDetailsModel {
    pub formatted_price: String,
    /// Bridges send this either as a number or as a string, depending on the
    /// JSON encoder used on the native side.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub price_amount_micros: i64,
    pub price_currency_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOfferDetailsModel {
    pub base_plan_id: Option<String>,
    pub offer_id: Option<String>,
    pub offer_token: String,
    #[serde(default)]
    pub offer_tags: Vec<String>,
    pub pricing_phases: PricingPhasesModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPhasesModel {
    pub pricing_phase_list: Vec<PricingPhaseModel>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPhaseModel {
    pub formatted_price: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    /// ISO 8601 duration, e.g. "P1W" or "P1M".
    pub billing_period: String,
    #[serde(default)]
    pub billing_cycle_count: u32,
    pub recurrence_mode: RecurrenceModeModel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum RecurrenceModeModel {
    /// The billing plan payment recurs for infinite billing periods unless
    /// cancelled.
    InfiniteRecurring = 1,
    /// The billing plan payment recurs for a fixed number of billing periods
    /// set in `billing_cycle_count`.
    FiniteRecurring = 2,
    /// The billing plan payment is a one time charge that does not repeat.
    NonRecurring = 3,
}
