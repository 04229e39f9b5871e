use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;

use crate::errors::BillingError;

/// Decodes the payload of a compact JWS, after validating its signature
/// against `key`.
///
/// Signed transactions carry no registered claims (exp, aud, ...), so none
/// are required or validated.
pub(crate) fn decode_verified_jws_payload<T: DeserializeOwned>(
    jws: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
) -> Result<T, BillingError> {
    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_aud = false;
    jsonwebtoken::decode::<T>(jws, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| BillingError::Verification(format!("invalid JWS: {e}")))
}
