use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Product item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// Single purchase (managed).
    InAppPurchase,
    /// Single purchase that needs to be consumed manually before it can be
    /// bought again.
    InAppPurchaseConsumable,
    /// Ongoing subscription.
    Subscription,
}

/// Kind of product as known to the billing service. Consumable and
/// non-consumable products are both one-time `InApp` products; whether they
/// get consumed is up to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    InApp,
    Subs,
}

impl ItemType {
    pub fn product_kind(&self) -> ProductKind {
        match self {
            ItemType::InAppPurchase | ItemType::InAppPurchaseConsumable => ProductKind::InApp,
            ItemType::Subscription => ProductKind::Subs,
        }
    }
}

/// How an in-flight subscription upgrade/downgrade replaces the previous
/// subscription. Values are the platform-defined replacement modes:
/// https://developer.android.com/reference/com/android/billingclient/api/BillingFlowParams.SubscriptionUpdateParams.ReplacementMode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum SubscriptionReplacementMode {
    UnknownReplacementMode = 0,
    /// The new plan takes effect immediately, and the remaining time will be
    /// prorated and credited to the user.
    #[default]
    WithTimeProration = 1,
    /// The new plan takes effect immediately, and the billing cycle remains
    /// the same. The price for the remaining period will be charged.
    ChargeProratedPrice = 2,
    /// The new plan takes effect immediately, and the new price will be
    /// charged on the next recurrence time.
    WithoutProration = 3,
    /// The new plan takes effect immediately, and the user is charged the full
    /// price of the new plan right away.
    ChargeFullPrice = 5,
    /// The new purchase takes effect immediately, the new plan will take
    /// effect when the old plan expires.
    Deferred = 6,
}
