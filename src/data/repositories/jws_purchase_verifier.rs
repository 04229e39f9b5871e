use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::{
    data::{
        datasources::utils::decode_verified_jws_payload,
        models::app_store::jws_transaction_decoded_payload_model::JwsTransactionDecodedPayloadModel,
    },
    domain::{
        entities::in_app_billing_purchase::InAppBillingPurchase,
        repositories::purchase_verifier::PurchaseVerifier,
    },
    errors::BillingError,
};

/// Verifies purchases whose `original_json` is a signed transaction (the JWS
/// representation StoreKit hands out), against a fixed verification key.
///
/// The key is taken as trusted; certificate chains embedded in the JWS header
/// are not evaluated.
pub struct JwsPurchaseVerifier {
    key: DecodingKey,
    algorithm: Algorithm,
    bundle_id: Option<String>,
}

impl JwsPurchaseVerifier {
    pub fn new(key: DecodingKey, algorithm: Algorithm) -> Self {
        Self {
            key,
            algorithm,
            bundle_id: None,
        }
    }

    /// Only accept transactions of the given app.
    pub fn with_bundle_id(mut self, bundle_id: impl Into<String>) -> Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }
}

#[async_trait]
impl PurchaseVerifier for JwsPurchaseVerifier {
    async fn verify_purchase(&self, purchase: &InAppBillingPurchase) -> Result<bool, BillingError> {
        let Some(jws) = purchase.original_json.as_deref() else {
            return Ok(false);
        };
        let payload: JwsTransactionDecodedPayloadModel =
            decode_verified_jws_payload(jws, &self.key, self.algorithm)?;
        let bundle_matches = match (&self.bundle_id, &payload.bundle_id) {
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
            (None, _) => true,
        };
        Ok(bundle_matches
            && payload.product_id == purchase.product_id
            && payload.transaction_id == purchase.id
            && !payload.is_revoked())
    }
}
