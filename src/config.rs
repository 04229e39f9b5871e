use std::env;

use serde::Deserialize;

use crate::{domain::entities::billing_platform::BillingPlatform, errors::BillingError};

pub const IN_APP_BILLING_PLATFORM: &str = "IN_APP_BILLING_PLATFORM";
pub const IN_APP_BILLING_IN_TESTING_MODE: &str = "IN_APP_BILLING_IN_TESTING_MODE";
pub const IN_APP_BILLING_IGNORE_INVALID_PRODUCTS: &str = "IN_APP_BILLING_IGNORE_INVALID_PRODUCTS";
pub const IN_APP_BILLING_ENABLE_PENDING_PURCHASES: &str =
    "IN_APP_BILLING_ENABLE_PENDING_PURCHASES";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    pub platform: BillingPlatform,
    pub in_testing_mode: bool,
    pub ignore_invalid_products: bool,
    pub enable_pending_purchases: bool,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            platform: BillingPlatform::GooglePlay,
            in_testing_mode: false,
            ignore_invalid_products: false,
            enable_pending_purchases: true,
        }
    }
}

impl BillingConfig {
    pub fn from_json(json: &str) -> Result<Self, BillingError> {
        serde_json::from_str(json).map_err(|e| BillingError::Config(e.to_string()))
    }

    /// Reads the config from `IN_APP_BILLING_*` environment variables. Unset
    /// variables keep their default.
    pub fn from_env() -> Result<Self, BillingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BillingError> {
        let mut config = Self::default();
        if let Some(platform) = lookup(IN_APP_BILLING_PLATFORM) {
            config.platform =
                serde_json::from_value(serde_json::Value::String(platform.trim().to_lowercase()))
                    .map_err(|_| {
                        BillingError::Config(format!(
                            "{IN_APP_BILLING_PLATFORM} must be 'google_play' or 'app_store', got '{platform}'"
                        ))
                    })?;
        }
        for (key, field) in [
            (IN_APP_BILLING_IN_TESTING_MODE, &mut config.in_testing_mode),
            (
                IN_APP_BILLING_IGNORE_INVALID_PRODUCTS,
                &mut config.ignore_invalid_products,
            ),
            (
                IN_APP_BILLING_ENABLE_PENDING_PURCHASES,
                &mut config.enable_pending_purchases,
            ),
        ] {
            if let Some(value) = lookup(key) {
                *field = parse_bool(key, &value)?;
            }
        }
        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, BillingError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(BillingError::Config(format!(
            "{key} must be a boolean, got '{value}'"
        ))),
    }
}
