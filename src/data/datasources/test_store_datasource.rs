use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use async_trait::async_trait;
use base64::{prelude::BASE64_URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use tokio::sync::Notify;

use crate::{
    data::models::billing_service::{
        billing_result_model::{BillingResponseCode, BillingServiceError},
        product_details_model::{
            OneTimePurchaseOfferDetailsModel, PricingPhaseModel, PricingPhasesModel,
            ProductDetailsModel, RecurrenceModeModel, SubscriptionOfferDetailsModel,
        },
        purchase_model::{PurchaseModel, PurchaseStateModel},
        storefront_model::StorefrontModel,
    },
    domain::entities::{
        billing_platform::BillingPlatform,
        item_type::{ProductKind, SubscriptionReplacementMode},
    },
};

use super::billing_service_datasource::{BillingServiceDatasource, PurchaseFlowParams};

/// In-memory store emulating a platform billing service. Used for tests,
/// desktop builds and sandbox runs.
///
/// Calls complete instantly, unless a failure or a pending purchase was
/// queued for the next flow, or the call was held with `hold_next`.
pub struct TestStoreDatasourceImpl {
    platform: BillingPlatform,
    state: Mutex<TestStoreState>,
    holds: [Hold; 4],
}

/// A store call that can be kept waiting with
/// [`TestStoreDatasourceImpl::hold_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeldCall {
    /// Held after the connection was established.
    Connection = 0,
    /// Held before the purchase flow starts, like an open payment sheet.
    Purchase = 1,
    /// Held after the purchase was consumed.
    Consumption = 2,
    /// Held before the transaction is finalized.
    Finalization = 3,
}

#[derive(Default)]
struct Hold {
    armed: AtomicBool,
    release: Notify,
}

impl Hold {
    async fn pass(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

struct TestStoreState {
    catalog: Vec<ProductDetailsModel>,
    ledger: Vec<PurchaseModel>,
    connection_available: bool,
    connected: bool,
    pending_purchases_enabled: bool,
    can_make_payments: bool,
    storefront: Option<StorefrontModel>,
    next_purchase_error: Option<BillingServiceError>,
    next_purchase_pending: bool,
    failing_finalizations: HashSet<String>,
    sequence: u64,
    stats: TestStoreStats,
}

/// Counters of calls that reached the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestStoreStats {
    pub connections_started: usize,
    pub connections_ended: usize,
    pub purchase_flows: usize,
    pub consumptions: usize,
    pub finalizations: usize,
    pub code_redemptions_presented: usize,
}

impl TestStoreDatasourceImpl {
    pub fn new(platform: BillingPlatform) -> Self {
        Self {
            platform,
            state: Mutex::new(TestStoreState {
                catalog: Vec::new(),
                ledger: Vec::new(),
                connection_available: true,
                connected: false,
                pending_purchases_enabled: false,
                can_make_payments: true,
                storefront: Some(StorefrontModel {
                    id: None,
                    country_code: "US".to_string(),
                }),
                next_purchase_error: None,
                next_purchase_pending: false,
                failing_finalizations: HashSet::new(),
                sequence: 0,
                stats: TestStoreStats::default(),
            }),
            holds: Default::default(),
        }
    }

    pub fn with_product(self, product: ProductDetailsModel) -> Self {
        self.state().catalog.push(product);
        self
    }

    /// Adds a one-time product priced in USD.
    pub fn with_one_time_product(self, product_id: &str, price_micros: i64) -> Self {
        self.with_product(ProductDetailsModel {
            product_id: product_id.to_string(),
            product_type: ProductKind::InApp,
            title: format!("{product_id} (Test Store)"),
            name: product_id.to_string(),
            description: String::new(),
            one_time_purchase_offer_details: Some(OneTimePurchaseOfferDetailsModel {
                formatted_price: format_usd(price_micros),
                price_amount_micros: price_micros,
                price_currency_code: "USD".to_string(),
            }),
            subscription_offer_details: None,
        })
    }

    /// Adds a monthly subscription priced in USD with a single base plan.
    pub fn with_subscription(self, product_id: &str, price_micros: i64) -> Self {
        self.with_product(ProductDetailsModel {
            product_id: product_id.to_string(),
            product_type: ProductKind::Subs,
            title: format!("{product_id} (Test Store)"),
            name: product_id.to_string(),
            description: String::new(),
            one_time_purchase_offer_details: None,
            subscription_offer_details: Some(vec![SubscriptionOfferDetailsModel {
                base_plan_id: Some("monthly".to_string()),
                offer_id: None,
                offer_token: format!("{product_id}-monthly"),
                offer_tags: Vec::new(),
                pricing_phases: PricingPhasesModel {
                    pricing_phase_list: vec![PricingPhaseModel {
                        formatted_price: format_usd(price_micros),
                        price_amount_micros: price_micros,
                        price_currency_code: "USD".to_string(),
                        billing_period: "P1M".to_string(),
                        billing_cycle_count: 0,
                        recurrence_mode: RecurrenceModeModel::InfiniteRecurring,
                    }],
                },
            }]),
        })
    }

    pub fn with_storefront(self, storefront: Option<StorefrontModel>) -> Self {
        self.state().storefront = storefront;
        self
    }

    /// Adds a purchase to the ledger as if it was made on another device.
    pub fn grant_purchase(&self, purchase: PurchaseModel) {
        self.state().ledger.push(purchase);
    }

    pub fn set_connection_available(&self, available: bool) {
        self.state().connection_available = available;
    }

    pub fn set_can_make_payments(&self, can_make_payments: bool) {
        self.state().can_make_payments = can_make_payments;
    }

    pub fn fail_next_purchase(&self, code: BillingResponseCode) {
        self.state().next_purchase_error = Some(BillingServiceError::new(
            code,
            "Failure injected by the test store.",
        ));
    }

    pub fn make_next_purchase_pending(&self) {
        self.state().next_purchase_pending = true;
    }

    /// Keeps the next `call` waiting until `release_held` is called.
    pub fn hold_next(&self, call: HeldCall) {
        self.holds[call as usize].armed.store(true, Ordering::SeqCst);
    }

    pub fn release_held(&self, call: HeldCall) {
        self.holds[call as usize].release.notify_one();
    }

    /// Makes every finalization of the given transaction identifier fail.
    pub fn fail_finalization_of(&self, transaction_identifier: &str) {
        self.state()
            .failing_finalizations
            .insert(transaction_identifier.to_string());
    }

    pub fn stats(&self) -> TestStoreStats {
        self.state().stats
    }

    pub fn ledger(&self) -> Vec<PurchaseModel> {
        self.state().ledger.clone()
    }

    fn state(&self) -> MutexGuard<'_, TestStoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BillingServiceDatasource for TestStoreDatasourceImpl {
    fn platform(&self) -> BillingPlatform {
        self.platform
    }

    async fn start_connection(
        &self,
        enable_pending_purchases: bool,
    ) -> Result<(), BillingServiceError> {
        {
            let mut state = self.state();
            if !state.connection_available {
                return Err(BillingServiceError::new(
                    BillingResponseCode::BillingUnavailable,
                    "Test store connection is disabled.",
                ));
            }
            state.connected = true;
            state.pending_purchases_enabled = enable_pending_purchases;
            state.stats.connections_started += 1;
        }
        self.holds[HeldCall::Connection as usize].pass().await;
        Ok(())
    }

    fn end_connection(&self) {
        let mut state = self.state();
        state.connected = false;
        state.stats.connections_ended += 1;
    }

    async fn query_product_details(
        &self,
        kind: ProductKind,
        product_ids: &[String],
    ) -> Result<Vec<ProductDetailsModel>, BillingServiceError> {
        let state = self.state();
        state.ensure_connected()?;
        Ok(state
            .catalog
            .iter()
            .filter(|p| p.product_type == kind && product_ids.contains(&p.product_id))
            .cloned()
            .collect())
    }

    async fn query_purchases(
        &self,
        kind: ProductKind,
    ) -> Result<Vec<PurchaseModel>, BillingServiceError> {
        let state = self.state();
        state.ensure_connected()?;
        Ok(state
            .ledger
            .iter()
            .filter(|p| p.product_kind == kind && is_active(p))
            .cloned()
            .collect())
    }

    async fn query_purchase_history(
        &self,
        kind: ProductKind,
    ) -> Result<Vec<PurchaseModel>, BillingServiceError> {
        let state = self.state();
        state.ensure_connected()?;
        Ok(state
            .ledger
            .iter()
            .filter(|p| p.product_kind == kind)
            .cloned()
            .collect())
    }

    async fn launch_purchase_flow(
        &self,
        params: PurchaseFlowParams<'_>,
    ) -> Result<PurchaseModel, BillingServiceError> {
        self.holds[HeldCall::Purchase as usize].pass().await;
        let mut state = self.state();
        state.ensure_connected()?;
        state.stats.purchase_flows += 1;
        if let Some(e) = state.next_purchase_error.take() {
            return Err(e);
        }
        if !state.can_make_payments {
            return Err(BillingServiceError::new(
                BillingResponseCode::BillingUnavailable,
                "Payments are disabled on this device.",
            ));
        }
        let product = state
            .catalog
            .iter()
            .find(|p| p.product_id == params.product_id && p.product_type == params.kind)
            .ok_or_else(|| {
                BillingServiceError::new(
                    BillingResponseCode::ItemUnavailable,
                    format!("Product '{}' is not available.", params.product_id),
                )
            })?;
        if let (Some(offer_token), Some(offers)) =
            (params.offer_token, &product.subscription_offer_details)
        {
            if !offers.iter().any(|o| o.offer_token == offer_token) {
                return Err(BillingServiceError::new(
                    BillingResponseCode::DeveloperError,
                    format!("Unknown offer token '{offer_token}'."),
                ));
            }
        }
        if state
            .ledger
            .iter()
            .any(|p| p.contains_product(params.product_id) && is_active(p))
        {
            return Err(BillingServiceError::new(
                BillingResponseCode::ItemAlreadyOwned,
                format!("Product '{}' is already owned.", params.product_id),
            ));
        }
        let pending = std::mem::take(&mut state.next_purchase_pending);
        if pending && !state.pending_purchases_enabled {
            return Err(BillingServiceError::new(
                BillingResponseCode::DeveloperError,
                "Pending purchases are not enabled.",
            ));
        }

        let mut purchase = state.new_purchase(self.platform, params.product_id, params.kind);
        purchase.obfuscated_account_id = params.obfuscated_account_id.map(str::to_string);
        purchase.obfuscated_profile_id = params.obfuscated_profile_id.map(str::to_string);
        if pending {
            purchase.purchase_state = PurchaseStateModel::Pending;
            if self.platform == BillingPlatform::GooglePlay {
                // Google Play only assigns an order id once payment clears.
                purchase.order_id = None;
            }
        }
        state.ledger.push(purchase.clone());
        Ok(purchase)
    }

    async fn launch_replace_subscription_flow(
        &self,
        new_product_id: &str,
        original_purchase_token: &str,
        replacement_mode: SubscriptionReplacementMode,
    ) -> Result<PurchaseModel, BillingServiceError> {
        let mut state = self.state();
        state.ensure_connected()?;
        state.stats.purchase_flows += 1;
        if let Some(e) = state.next_purchase_error.take() {
            return Err(e);
        }
        if !state
            .catalog
            .iter()
            .any(|p| p.product_id == new_product_id && p.product_type == ProductKind::Subs)
        {
            return Err(BillingServiceError::new(
                BillingResponseCode::ItemUnavailable,
                format!("Subscription '{new_product_id}' is not available."),
            ));
        }
        let original = state
            .ledger
            .iter_mut()
            .find(|p| {
                p.purchase_token == original_purchase_token
                    && p.product_kind == ProductKind::Subs
                    && is_active(p)
            })
            .ok_or_else(|| {
                BillingServiceError::new(
                    BillingResponseCode::ItemNotOwned,
                    "Original subscription is not owned.",
                )
            })?;
        if original.contains_product(new_product_id) {
            return Err(BillingServiceError::new(
                BillingResponseCode::ItemAlreadyOwned,
                format!("Subscription '{new_product_id}' is already owned."),
            ));
        }
        original.auto_renewing = false;
        if replacement_mode != SubscriptionReplacementMode::Deferred {
            original.purchase_state = PurchaseStateModel::Canceled;
        }

        let purchase = state.new_purchase(self.platform, new_product_id, ProductKind::Subs);
        state.ledger.push(purchase.clone());
        Ok(purchase)
    }

    async fn consume_purchase(
        &self,
        product_id: &str,
        transaction_identifier: &str,
    ) -> Result<(), BillingServiceError> {
        {
            let mut state = self.state();
            state.ensure_connected()?;
            state.stats.consumptions += 1;
            let purchase = state
                .ledger
                .iter_mut()
                .find(|p| {
                    matches_transaction(p, transaction_identifier)
                        && p.contains_product(product_id)
                        && p.product_kind == ProductKind::InApp
                        && is_active(p)
                })
                .ok_or_else(|| {
                    BillingServiceError::new(
                        BillingResponseCode::ItemNotOwned,
                        format!(
                            "No unconsumed purchase '{transaction_identifier}' of '{product_id}'."
                        ),
                    )
                })?;
            purchase.consumed = true;
        }
        self.holds[HeldCall::Consumption as usize].pass().await;
        Ok(())
    }

    async fn finalize_transaction(
        &self,
        transaction_identifier: &str,
    ) -> Result<(), BillingServiceError> {
        self.holds[HeldCall::Finalization as usize].pass().await;
        let mut state = self.state();
        state.ensure_connected()?;
        state.stats.finalizations += 1;
        if state.failing_finalizations.contains(transaction_identifier) {
            return Err(BillingServiceError::new(
                BillingResponseCode::Error,
                "Finalization failure injected by the test store.",
            ));
        }
        let purchase = state
            .ledger
            .iter_mut()
            .find(|p| matches_transaction(p, transaction_identifier))
            .ok_or_else(|| {
                BillingServiceError::new(
                    BillingResponseCode::ItemNotOwned,
                    format!("Unknown transaction '{transaction_identifier}'."),
                )
            })?;
        if purchase.purchase_state == PurchaseStateModel::Pending {
            return Err(BillingServiceError::new(
                BillingResponseCode::DeveloperError,
                "Pending purchases can not be finalized.",
            ));
        }
        purchase.acknowledged = true;
        Ok(())
    }

    async fn storefront(&self) -> Option<StorefrontModel> {
        self.state().storefront.clone()
    }

    async fn receipt(&self) -> Option<Vec<u8>> {
        serde_json::to_vec(&self.state().ledger).ok()
    }

    async fn can_make_payments(&self) -> bool {
        self.state().can_make_payments
    }

    fn present_code_redemption(&self) {
        self.state().stats.code_redemptions_presented += 1;
    }
}

impl TestStoreState {
    fn ensure_connected(&self) -> Result<(), BillingServiceError> {
        if self.connected {
            Ok(())
        } else {
            Err(BillingServiceError::new(
                BillingResponseCode::ServiceDisconnected,
                "Test store is not connected.",
            ))
        }
    }

    fn new_purchase(
        &mut self,
        platform: BillingPlatform,
        product_id: &str,
        kind: ProductKind,
    ) -> PurchaseModel {
        self.sequence += 1;
        let now = Utc::now();
        let (order_id, purchase_token) = match platform {
            BillingPlatform::GooglePlay => (
                format!("GPA.0000-0000-0000-{:05}", self.sequence),
                BASE64_URL_SAFE_NO_PAD.encode(format!(
                    "{product_id}:{}:{}",
                    self.sequence,
                    now.timestamp_millis()
                )),
            ),
            BillingPlatform::AppStore => {
                let transaction_id = format!("{}", 2_000_000_000_000_000u64 + self.sequence);
                (transaction_id.clone(), transaction_id)
            }
        };
        PurchaseModel {
            order_id: Some(order_id),
            package_name: Some("com.example.teststore".to_string()),
            product_ids: vec![product_id.to_string()],
            product_kind: kind,
            purchase_time: now,
            purchase_state: PurchaseStateModel::Purchased,
            purchase_token,
            quantity: Some(1),
            acknowledged: false,
            auto_renewing: kind == ProductKind::Subs,
            consumed: false,
            obfuscated_account_id: None,
            obfuscated_profile_id: None,
            original_json: None,
            signature: None,
        }
    }
}

fn is_active(p: &PurchaseModel) -> bool {
    !p.consumed
        && matches!(
            p.purchase_state,
            PurchaseStateModel::Purchased
                | PurchaseStateModel::Pending
                | PurchaseStateModel::Restored
        )
}

fn matches_transaction(p: &PurchaseModel, transaction_identifier: &str) -> bool {
    p.purchase_token == transaction_identifier
        || p.order_id.as_deref() == Some(transaction_identifier)
}

fn format_usd(micros: i64) -> String {
    format!("${}.{:02}", micros / 1_000_000, (micros % 1_000_000) / 10_000)
}
