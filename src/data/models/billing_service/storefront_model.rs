use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontModel {
    pub id: Option<String>,
    /// ISO 3166-1 country code. Google Play reports alpha-2, StoreKit
    /// reports alpha-3.
    pub country_code: String,
}
