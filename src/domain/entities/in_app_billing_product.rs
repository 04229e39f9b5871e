use super::item_type::ItemType;

/// Product information as reported by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct InAppBillingProduct {
    pub product_id: String,
    pub item_type: ItemType,
    /// Localized title of the product.
    pub name: String,
    pub description: String,
    /// Localized, formatted price (e.g. "$0.99").
    pub localized_price: String,
    /// ISO 4217 currency code of the price.
    pub currency_code: String,
    /// Price in micro-units, where 1,000,000 micro-units equal one unit of
    /// the currency.
    pub micros_price: i64,
    /// Only set for subscriptions that have an introductory offer.
    pub introductory_price: Option<PricingPhase>,
    /// Empty for one-time products.
    pub subscription_offers: Vec<SubscriptionOffer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionOffer {
    /// Token to pass as `sub_offer_token` when purchasing this offer.
    pub offer_token: String,
    pub base_plan_id: Option<String>,
    pub offer_id: Option<String>,
    pub tags: Vec<String>,
    pub pricing_phases: Vec<PricingPhase>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingPhase {
    pub formatted_price: String,
    pub micros_price: i64,
    pub currency_code: String,
    /// ISO 8601 duration, e.g. "P1M".
    pub billing_period: String,
    pub billing_cycle_count: u32,
    pub recurrence_mode: RecurrenceMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceMode {
    InfiniteRecurring,
    FiniteRecurring,
    NonRecurring,
}
