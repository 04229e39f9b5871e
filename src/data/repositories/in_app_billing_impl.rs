use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine as _};
use tokio_util::sync::CancellationToken;

use crate::{
    config::BillingConfig,
    data::{
        datasources::billing_service_datasource::{BillingServiceDatasource, PurchaseFlowParams},
        models::billing_service::{
            product_details_model as pd, purchase_model as pm, storefront_model::StorefrontModel,
        },
    },
    domain::{
        entities::{
            billing_platform::{BillingPlatform, PlatformCapabilities},
            finalize_result::FinalizeResult,
            in_app_billing_product::{
                InAppBillingProduct, PricingPhase, RecurrenceMode, SubscriptionOffer,
            },
            in_app_billing_purchase::{ConsumptionState, InAppBillingPurchase, PurchaseState},
            item_type::{ItemType, ProductKind, SubscriptionReplacementMode},
            storefront::Storefront,
        },
        repositories::{
            in_app_billing::{InAppBilling, PurchaseOptions},
            purchase_verifier::PurchaseVerifier,
        },
    },
    errors::{BillingError, PurchaseError, PurchaseErrorReason},
};

/// `InAppBilling` on top of a platform billing service.
///
/// Owns the connection: it is released on `disconnect`, on
/// `set_is_connected(false)`, and when the facade is dropped.
///
/// Consumed and finalized transaction identifiers are remembered for the
/// lifetime of the facade, across reconnects, and are never evicted.
pub struct InAppBillingImpl<S: BillingServiceDatasource> {
    billing_service: S,
    verifier: Option<Arc<dyn PurchaseVerifier>>,
    is_connected: AtomicBool,
    in_testing_mode: AtomicBool,
    ignore_invalid_products: AtomicBool,
    // Held for the duration of a connect attempt.
    connect_lock: tokio::sync::Mutex<()>,
    // Product ids with a purchase flow in progress.
    purchases_in_flight: Mutex<HashSet<String>>,
    consumed_transactions: Mutex<HashSet<String>>,
    finalized_transactions: Mutex<HashSet<String>>,
    // Serializes finalization per transaction identifier.
    finalizations_in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: BillingServiceDatasource> InAppBillingImpl<S> {
    pub fn new(billing_service: S, config: &BillingConfig) -> Result<Self, BillingError> {
        if billing_service.platform() != config.platform {
            return Err(BillingError::Config(format!(
                "configured platform {:?} does not match billing service platform {:?}",
                config.platform,
                billing_service.platform()
            )));
        }
        Ok(Self {
            billing_service,
            verifier: None,
            is_connected: AtomicBool::new(false),
            in_testing_mode: AtomicBool::new(config.in_testing_mode),
            ignore_invalid_products: AtomicBool::new(config.ignore_invalid_products),
            connect_lock: tokio::sync::Mutex::new(()),
            purchases_in_flight: Mutex::new(HashSet::new()),
            consumed_transactions: Mutex::new(HashSet::new()),
            finalized_transactions: Mutex::new(HashSet::new()),
            finalizations_in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Purchases rejected by `verifier` are left out of `get_purchases`.
    pub fn with_verifier(mut self, verifier: Arc<dyn PurchaseVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn billing_service(&self) -> &S {
        &self.billing_service
    }

    fn ensure_connected(&self) -> Result<(), BillingError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BillingError::NotConnected)
        }
    }

    fn release_connection(&self) {
        if self.is_connected.swap(false, Ordering::SeqCst) {
            tracing::debug!(platform = ?self.platform(), "Ending billing service connection");
            self.billing_service.end_connection();
        }
    }

    async fn query_purchases(
        &self,
        kind: ProductKind,
        reason: PurchaseErrorReason,
    ) -> Result<Vec<InAppBillingPurchase>, BillingError> {
        Ok(self
            .billing_service
            .query_purchases(kind)
            .await
            .map_err(|e| PurchaseError::new(reason, e.to_string()))?
            .into_iter()
            .map(InAppBillingPurchase::from_purchase_model)
            .collect())
    }

    async fn retain_verified(
        &self,
        purchases: Vec<InAppBillingPurchase>,
    ) -> Vec<InAppBillingPurchase> {
        let verifier = match &self.verifier {
            Some(v) if !self.in_testing_mode() => v,
            _ => return purchases,
        };
        let mut verified = Vec::with_capacity(purchases.len());
        for purchase in purchases {
            match verifier.verify_purchase(&purchase).await {
                Ok(true) => verified.push(purchase),
                Ok(false) => {
                    tracing::warn!(
                        transaction_id = %purchase.id,
                        product_id = %purchase.product_id,
                        "Excluding purchase that failed verification"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        transaction_id = %purchase.id,
                        product_id = %purchase.product_id,
                        error = %e,
                        "Excluding purchase that could not be verified"
                    );
                }
            }
        }
        verified
    }

    async fn resolve_offer_token(&self, product_id: &str) -> Result<Option<String>, BillingError> {
        let details = self
            .billing_service
            .query_product_details(ProductKind::Subs, &[product_id.to_string()])
            .await
            .map_err(|e| PurchaseError::new(PurchaseErrorReason::ProductRequestFailed, e.to_string()))?;
        let product = details
            .into_iter()
            .find(|d| d.product_id == product_id)
            .ok_or_else(|| {
                PurchaseError::new(
                    PurchaseErrorReason::InvalidProduct,
                    format!("Subscription '{product_id}' was not found."),
                )
            })?;
        Ok(product
            .subscription_offer_details
            .and_then(|offers| offers.into_iter().next())
            .map(|offer| offer.offer_token))
    }

    async fn finalize_one(&self, transaction_identifier: &str) -> bool {
        let in_flight = InFlight::enter(&self.finalizations_in_flight, transaction_identifier);
        let _serialized = in_flight.entry.lock().await;
        if lock(&self.finalized_transactions).contains(transaction_identifier) {
            tracing::debug!(transaction_identifier, "Transaction was already finalized");
            return true;
        }
        match self
            .billing_service
            .finalize_transaction(transaction_identifier)
            .await
        {
            Ok(()) => {
                lock(&self.finalized_transactions).insert(transaction_identifier.to_string());
                true
            }
            Err(e) => {
                tracing::warn!(transaction_identifier, error = %e, "Failed to finalize transaction");
                false
            }
        }
    }
}

#[async_trait]
impl<S: BillingServiceDatasource> InAppBilling for InAppBillingImpl<S> {
    fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    fn set_is_connected(&self, connected: bool) {
        if connected {
            self.is_connected.store(true, Ordering::SeqCst);
        } else {
            self.release_connection();
        }
    }

    fn in_testing_mode(&self) -> bool {
        self.in_testing_mode.load(Ordering::SeqCst)
    }

    fn set_in_testing_mode(&self, in_testing_mode: bool) {
        self.in_testing_mode.store(in_testing_mode, Ordering::SeqCst);
    }

    fn ignore_invalid_products(&self) -> bool {
        self.ignore_invalid_products.load(Ordering::SeqCst)
    }

    fn set_ignore_invalid_products(&self, ignore_invalid_products: bool) {
        self.ignore_invalid_products
            .store(ignore_invalid_products, Ordering::SeqCst);
    }

    fn platform(&self) -> BillingPlatform {
        self.billing_service.platform()
    }

    fn capabilities(&self) -> PlatformCapabilities {
        self.platform().capabilities()
    }

    async fn connect(
        &self,
        enable_pending_purchases: bool,
        cancel: &CancellationToken,
    ) -> Result<bool, BillingError> {
        let _guard = cancellable(cancel, async { Ok(self.connect_lock.lock().await) }).await?;
        if self.is_connected() {
            return Ok(true);
        }
        let enable_pending_purchases =
            enable_pending_purchases && self.capabilities().pending_purchases;
        // Ends a connection the backend may have opened if this call is
        // cancelled or dropped before the result is recorded.
        let mut abandoned = AbandonedConnection {
            billing_service: &self.billing_service,
            armed: true,
        };
        let result = cancellable(cancel, async {
            Ok(self
                .billing_service
                .start_connection(enable_pending_purchases)
                .await)
        })
        .await?;
        abandoned.armed = false;
        match result {
            Ok(()) => {
                self.is_connected.store(true, Ordering::SeqCst);
                tracing::debug!(platform = ?self.platform(), "Connected to billing service");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(platform = ?self.platform(), error = %e, "Could not connect to billing service");
                Ok(false)
            }
        }
    }

    async fn disconnect(&self, cancel: &CancellationToken) -> Result<(), BillingError> {
        if cancel.is_cancelled() {
            return Err(BillingError::Cancelled);
        }
        self.release_connection();
        Ok(())
    }

    async fn get_product_info(
        &self,
        item_type: ItemType,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingProduct>, BillingError> {
        self.ensure_connected()?;
        if product_ids.is_empty() {
            return Err(BillingError::InvalidArgument(
                "product_ids must not be empty".to_string(),
            ));
        }
        let models = cancellable(cancel, async {
            self.billing_service
                .query_product_details(item_type.product_kind(), product_ids)
                .await
                .map_err(|e| {
                    BillingError::from(PurchaseError::new(
                        PurchaseErrorReason::ProductRequestFailed,
                        e.to_string(),
                    ))
                })
        })
        .await?;

        let mut products = Vec::with_capacity(product_ids.len());
        let mut invalid = Vec::new();
        for product_id in product_ids {
            match models
                .iter()
                .find(|m| &m.product_id == product_id)
                .and_then(|m| InAppBillingProduct::from_product_details_model(m, item_type))
            {
                Some(product) => products.push(product),
                None => invalid.push(product_id.clone()),
            }
        }
        if !invalid.is_empty() {
            if !self.ignore_invalid_products() {
                return Err(BillingError::InvalidProducts {
                    product_ids: invalid,
                });
            }
            tracing::debug!(?invalid, "Ignoring invalid product ids");
        }
        Ok(products)
    }

    async fn get_purchases(
        &self,
        item_type: ItemType,
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingPurchase>, BillingError> {
        self.ensure_connected()?;
        cancellable(cancel, async {
            let purchases = self
                .query_purchases(item_type.product_kind(), PurchaseErrorReason::RestoreFailed)
                .await?;
            Ok(self.retain_verified(purchases).await)
        })
        .await
    }

    async fn get_purchases_history(
        &self,
        item_type: ItemType,
        cancel: &CancellationToken,
    ) -> Result<Vec<InAppBillingPurchase>, BillingError> {
        if !self.capabilities().purchase_history {
            return Err(BillingError::NotSupported("get_purchases_history"));
        }
        self.ensure_connected()?;
        cancellable(cancel, async {
            Ok(self
                .billing_service
                .query_purchase_history(item_type.product_kind())
                .await
                .map_err(|e| PurchaseError::new(PurchaseErrorReason::RestoreFailed, e.to_string()))?
                .into_iter()
                .map(InAppBillingPurchase::from_purchase_model)
                .collect())
        })
        .await
    }

    async fn purchase(
        &self,
        product_id: &str,
        item_type: ItemType,
        options: PurchaseOptions,
        cancel: &CancellationToken,
    ) -> Result<InAppBillingPurchase, BillingError> {
        self.ensure_connected()?;
        if product_id.is_empty() {
            return Err(BillingError::InvalidArgument(
                "product_id must not be empty".to_string(),
            ));
        }
        let _claim = Claim::acquire(&self.purchases_in_flight, product_id).ok_or_else(|| {
            PurchaseError::new(
                PurchaseErrorReason::PurchaseInProgress,
                format!("A purchase of '{product_id}' is already in progress."),
            )
        })?;

        cancellable(cancel, async {
            let kind = item_type.product_kind();
            let offer_token = match (&options.sub_offer_token, kind) {
                (Some(token), _) => Some(token.clone()),
                (None, ProductKind::Subs) => self.resolve_offer_token(product_id).await?,
                (None, ProductKind::InApp) => None,
            };
            let model = self
                .billing_service
                .launch_purchase_flow(PurchaseFlowParams {
                    product_id,
                    kind,
                    obfuscated_account_id: options.obfuscated_account_id.as_deref(),
                    obfuscated_profile_id: options.obfuscated_profile_id.as_deref(),
                    offer_token: offer_token.as_deref(),
                })
                .await
                .map_err(PurchaseError::from)?;
            let purchase = expect_purchase_of(
                InAppBillingPurchase::from_purchase_model(model),
                product_id,
            )?;
            tracing::info!(
                product_id,
                transaction_id = %purchase.id,
                state = ?purchase.state,
                "Purchase completed"
            );
            Ok(purchase)
        })
        .await
    }

    async fn upgrade_purchased_subscription(
        &self,
        new_product_id: &str,
        original_purchase_token: &str,
        replacement_mode: SubscriptionReplacementMode,
        cancel: &CancellationToken,
    ) -> Result<InAppBillingPurchase, BillingError> {
        if !self.capabilities().subscription_replacement {
            return Err(BillingError::NotSupported("upgrade_purchased_subscription"));
        }
        self.ensure_connected()?;
        if new_product_id.is_empty() {
            return Err(BillingError::InvalidArgument(
                "new_product_id must not be empty".to_string(),
            ));
        }
        if original_purchase_token.is_empty() {
            return Err(BillingError::InvalidArgument(
                "original_purchase_token must not be empty".to_string(),
            ));
        }
        let _claim = Claim::acquire(&self.purchases_in_flight, new_product_id).ok_or_else(|| {
            PurchaseError::new(
                PurchaseErrorReason::PurchaseInProgress,
                format!("A purchase of '{new_product_id}' is already in progress."),
            )
        })?;

        cancellable(cancel, async {
            let model = self
                .billing_service
                .launch_replace_subscription_flow(
                    new_product_id,
                    original_purchase_token,
                    replacement_mode,
                )
                .await
                .map_err(PurchaseError::from)?;
            let purchase = expect_purchase_of(
                InAppBillingPurchase::from_purchase_model(model),
                new_product_id,
            )?;
            tracing::info!(
                product_id = new_product_id,
                transaction_id = %purchase.id,
                ?replacement_mode,
                "Subscription replaced"
            );
            Ok(purchase)
        })
        .await
    }

    async fn consume_purchase(
        &self,
        product_id: &str,
        transaction_identifier: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, BillingError> {
        self.ensure_connected()?;
        if transaction_identifier.is_empty() {
            return Err(BillingError::InvalidArgument(
                "transaction_identifier must not be empty".to_string(),
            ));
        }
        let Some(mut claim) = Claim::acquire(&self.consumed_transactions, transaction_identifier)
        else {
            tracing::debug!(transaction_identifier, "Transaction was already consumed");
            return Ok(false);
        };
        if cancel.is_cancelled() {
            return Err(BillingError::Cancelled);
        }
        // Not raced against `cancel`; a sent consume is always recorded.
        self.billing_service
            .consume_purchase(product_id, transaction_identifier)
            .await
            .map_err(PurchaseError::from)?;
        claim.keep();
        Ok(true)
    }

    async fn finalize_purchase(
        &self,
        transaction_identifiers: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FinalizeResult>, BillingError> {
        self.ensure_connected()?;
        cancellable(cancel, async {
            let mut results = Vec::with_capacity(transaction_identifiers.len());
            for id in transaction_identifiers {
                results.push(FinalizeResult::new(id, self.finalize_one(id).await));
            }
            Ok(results)
        })
        .await
    }

    async fn finalize_purchase_of_product(
        &self,
        product_ids: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<FinalizeResult>, BillingError> {
        self.ensure_connected()?;
        cancellable(cancel, async {
            let mut purchases = Vec::new();
            for kind in [ProductKind::InApp, ProductKind::Subs] {
                match self
                    .query_purchases(kind, PurchaseErrorReason::RestoreFailed)
                    .await
                {
                    Ok(p) => purchases.extend(p),
                    Err(e) => {
                        tracing::warn!(?kind, error = %e, "Failed to query purchases to finalize");
                        return Ok(product_ids
                            .iter()
                            .map(|id| FinalizeResult::new(id, false))
                            .collect());
                    }
                }
            }

            let mut results = Vec::with_capacity(product_ids.len());
            for product_id in product_ids {
                let matching: Vec<_> = purchases
                    .iter()
                    .filter(|p| p.product_ids.iter().any(|id| id == product_id))
                    .collect();
                let mut success = !matching.is_empty();
                for purchase in matching.into_iter().filter(|p| !p.is_acknowledged) {
                    success &= self.finalize_one(&purchase.purchase_token).await;
                }
                results.push(FinalizeResult::new(product_id, success));
            }
            Ok(results)
        })
        .await
    }

    async fn storefront(&self) -> Option<Storefront> {
        let model = self.billing_service.storefront().await?;
        let storefront = Storefront::from_storefront_model(&model);
        if storefront.is_none() {
            tracing::warn!(country_code = %model.country_code, "Storefront has an invalid country code");
        }
        storefront
    }

    async fn receipt_data(&self) -> Option<String> {
        if !self.capabilities().receipt_data {
            return None;
        }
        self.billing_service
            .receipt()
            .await
            .map(|receipt| BASE64_STANDARD.encode(receipt))
    }

    async fn can_make_payments(&self) -> bool {
        self.billing_service.can_make_payments().await
    }

    fn present_code_redemption(&self) {
        if self.capabilities().code_redemption {
            self.billing_service.present_code_redemption();
        } else {
            tracing::warn!(platform = ?self.platform(), "Code redemption is not available");
        }
    }
}

impl<S: BillingServiceDatasource> Drop for InAppBillingImpl<S> {
    fn drop(&mut self) {
        self.release_connection();
    }
}

/// Runs `fut` until it completes or `cancel` fires, whichever is first.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, BillingError>
where
    F: Future<Output = Result<T, BillingError>>,
{
    if cancel.is_cancelled() {
        return Err(BillingError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BillingError::Cancelled),
        result = fut => result,
    }
}

/// Fails unless the billing service returned a purchase of `product_id`.
fn expect_purchase_of(
    purchase: InAppBillingPurchase,
    product_id: &str,
) -> Result<InAppBillingPurchase, BillingError> {
    if purchase.id.is_empty() || !purchase.product_ids.iter().any(|p| p == product_id) {
        return Err(PurchaseError::new(
            PurchaseErrorReason::GeneralError,
            format!("Billing service returned an unexpected purchase for '{product_id}'."),
        )
        .into());
    }
    Ok(purchase)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct AbandonedConnection<'a, S: BillingServiceDatasource> {
    billing_service: &'a S,
    armed: bool,
}

impl<S: BillingServiceDatasource> Drop for AbandonedConnection<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("Connect was cancelled, ending billing service connection");
            self.billing_service.end_connection();
        }
    }
}

/// Shared per-key lock, removed from the map by the last holder.
struct InFlight<'a> {
    map: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    key: String,
    entry: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn enter(map: &'a Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>, key: &str) -> Self {
        let entry = lock(map).entry(key.to_string()).or_default().clone();
        Self {
            map,
            key: key.to_string(),
            entry,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut map = lock(self.map);
        // One reference in the map, one here.
        if Arc::strong_count(&self.entry) <= 2 {
            map.remove(&self.key);
        }
    }
}

/// Membership of `key` in a shared set, removed again on drop unless kept.
struct Claim<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
    keep: bool,
}

impl<'a> Claim<'a> {
    /// Returns `None` if `key` is already in the set.
    fn acquire(set: &'a Mutex<HashSet<String>>, key: &str) -> Option<Self> {
        if !lock(set).insert(key.to_string()) {
            return None;
        }
        Some(Self {
            set,
            key: key.to_string(),
            keep: false,
        })
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.keep {
            lock(self.set).remove(&self.key);
        }
    }
}

// Model conversions:
// ----------------------------

impl InAppBillingProduct {
    /// Returns `None` for products without any price information, which can
    /// not be offered.
    fn from_product_details_model(
        m: &pd::ProductDetailsModel,
        item_type: ItemType,
    ) -> Option<Self> {
        let subscription_offers: Vec<SubscriptionOffer> = m
            .subscription_offer_details
            .iter()
            .flatten()
            .map(SubscriptionOffer::from_offer_details_model)
            .collect();
        let (base_price, introductory_price) = match &m.one_time_purchase_offer_details {
            Some(o) => (
                PricingPhase {
                    formatted_price: o.formatted_price.clone(),
                    micros_price: o.price_amount_micros,
                    currency_code: o.price_currency_code.clone(),
                    billing_period: String::new(),
                    billing_cycle_count: 0,
                    recurrence_mode: RecurrenceMode::NonRecurring,
                },
                None,
            ),
            None => {
                // The last phase of an offer is its recurring base price; any
                // phase before it is introductory.
                let phases = &subscription_offers.first()?.pricing_phases;
                let base = phases.last()?.clone();
                let intro = (phases.len() > 1).then(|| phases[0].clone());
                (base, intro)
            }
        };
        Some(Self {
            product_id: m.product_id.clone(),
            item_type,
            name: m.name.clone(),
            description: m.description.clone(),
            localized_price: base_price.formatted_price,
            currency_code: base_price.currency_code,
            micros_price: base_price.micros_price,
            introductory_price,
            subscription_offers,
        })
    }
}

impl SubscriptionOffer {
    fn from_offer_details_model(m: &pd::SubscriptionOfferDetailsModel) -> Self {
        Self {
            offer_token: m.offer_token.clone(),
            base_plan_id: m.base_plan_id.clone(),
            offer_id: m.offer_id.clone(),
            tags: m.offer_tags.clone(),
            pricing_phases: m
                .pricing_phases
                .pricing_phase_list
                .iter()
                .map(|p| PricingPhase {
                    formatted_price: p.formatted_price.clone(),
                    micros_price: p.price_amount_micros,
                    currency_code: p.price_currency_code.clone(),
                    billing_period: p.billing_period.clone(),
                    billing_cycle_count: p.billing_cycle_count,
                    recurrence_mode: match p.recurrence_mode {
                        pd::RecurrenceModeModel::InfiniteRecurring => {
                            RecurrenceMode::InfiniteRecurring
                        }
                        pd::RecurrenceModeModel::FiniteRecurring => RecurrenceMode::FiniteRecurring,
                        pd::RecurrenceModeModel::NonRecurring => RecurrenceMode::NonRecurring,
                    },
                })
                .collect(),
        }
    }
}

impl InAppBillingPurchase {
    fn from_purchase_model(m: pm::PurchaseModel) -> Self {
        Self {
            id: m.order_id.clone().unwrap_or_else(|| m.purchase_token.clone()),
            product_id: m.primary_product_id().unwrap_or_default().to_string(),
            product_ids: m.product_ids,
            purchase_token: m.purchase_token,
            transaction_date: m.purchase_time,
            state: match m.purchase_state {
                pm::PurchaseStateModel::Purchased => PurchaseState::Purchased,
                pm::PurchaseStateModel::Canceled => PurchaseState::Canceled,
                pm::PurchaseStateModel::Pending => PurchaseState::Pending,
                pm::PurchaseStateModel::Restored => PurchaseState::Restored,
                pm::PurchaseStateModel::Deferred => PurchaseState::Deferred,
            },
            consumption_state: if m.consumed {
                ConsumptionState::Consumed
            } else {
                ConsumptionState::NotYetConsumed
            },
            is_acknowledged: m.acknowledged,
            auto_renewing: m.auto_renewing,
            quantity: m.quantity.unwrap_or(1),
            obfuscated_account_id: m.obfuscated_account_id,
            obfuscated_profile_id: m.obfuscated_profile_id,
            original_json: m.original_json,
            signature: m.signature,
        }
    }
}

impl Storefront {
    /// Normalizes the country code to ISO 3166-1 alpha-3. Returns `None` for
    /// unknown codes.
    fn from_storefront_model(m: &StorefrontModel) -> Option<Self> {
        let code = m.country_code.to_ascii_uppercase();
        let country = match code.len() {
            2 => rust_iso3166::from_alpha2(&code),
            3 => rust_iso3166::from_alpha3(&code),
            _ => None,
        }?;
        Some(Self {
            id: m.id.clone().unwrap_or_default(),
            country_code: country.alpha3.to_string(),
        })
    }
}
