use serde::Deserialize;
use serde_repr::Deserialize_repr;

type TimestampType = u64;

/// Decoded payload of a signed transaction (JWSTransaction), as carried by a
/// StoreKit purchase's JWS representation.
///
/// https://developer.apple.com/documentation/appstoreserverapi/jwstransactiondecodedpayload
///
/// Only the fields needed to match a payload against a purchase are kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JwsTransactionDecodedPayloadModel {
    /// The bundle identifier of the app.
    pub(crate) bundle_id: Option<String>,
    /// The unique identifier of the product.
    pub(crate) product_id: String,
    /// The UNIX time, in milliseconds, that the App Store refunded the
    /// transaction or revoked it from Family Sharing.
    pub(crate) revocation_date: Option<TimestampType>,
    /// The reason that the App Store refunded the transaction or revoked it
    /// from Family Sharing.
    pub(crate) revocation_reason: Option<RevocationReason>,
    /// The unique identifier of the transaction.
    pub(crate) transaction_id: String,
}

#[derive(Debug, Deserialize_repr, PartialEq)]
#[repr(u8)]
pub(crate) enum RevocationReason {
    /// The App Store refunded the transaction on behalf of the customer for
    /// other reasons, for example, an accidental purchase.
    Other = 0,
    /// The App Store refunded the transaction on behalf of the customer due to
    /// an actual or perceived issue within your app.
    Issue = 1,
}

impl JwsTransactionDecodedPayloadModel {
    pub(crate) fn is_revoked(&self) -> bool {
        self.revocation_date.is_some() || self.revocation_reason.is_some()
    }
}
