use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::domain::entities::item_type::ProductKind;

/// Purchase record as handed over by a platform bridge.
///
/// Shape follows the original JSON of a Google Play Billing Purchase:
/// https://developer.android.com/reference/com/android/billingclient/api/Purchase
///
/// StoreKit bridges put the transaction id in `order_id`, the original
/// transaction id in `purchase_token`, and the JWS representation in
/// `original_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseModel {
    /// Unique order identifier for the transaction. May be missing for
    /// pending purchases.
    pub order_id: Option<String>,
    pub package_name: Option<String>,
    pub product_ids: Vec<String>,
    /// Not part of Google's JSON; bridges tag each purchase with the kind it
    /// was queried as.
    pub product_kind: ProductKind,
    /// The time the product was purchased, in milliseconds since the epoch
    /// (Jan 1, 1970).
    #[serde(with = "ts_milliseconds")]
    pub purchase_time: DateTime<Utc>,
    pub purchase_state: PurchaseStateModel,
    pub purchase_token: String,
    /// If not present, the quantity is 1.
    pub quantity: Option<u32>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub auto_renewing: bool,
    #[serde(default)]
    pub consumed: bool,
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
    /// Raw signed data, kept verbatim for verification.
    #[serde(skip)]
    pub original_json: Option<String>,
    #[serde(skip)]
    pub signature: Option<String>,
}

/// Values 0 to 2 match Google Play's purchase states. 3 and 4 are only
/// reported by StoreKit bridges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PurchaseStateModel {
    Purchased = 0,
    Canceled = 1,
    Pending = 2,
    Restored = 3,
    Deferred = 4,
}

impl PurchaseModel {
    /// Parses a purchase out of a platform's original JSON, keeping the raw
    /// JSON and signature around for verification.
    pub fn from_original_json(
        original_json: &str,
        signature: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        let mut m: PurchaseModel = serde_json::from_str(original_json)?;
        m.original_json = Some(original_json.to_string());
        m.signature = signature;
        Ok(m)
    }

    pub fn primary_product_id(&self) -> Option<&str> {
        self.product_ids.first().map(String::as_str)
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|p| p == product_id)
    }
}
