use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fractic_inapp_billing::{
    config::BillingConfig,
    data::{
        datasources::test_store_datasource::{HeldCall, TestStoreDatasourceImpl},
        models::billing_service::{
            billing_result_model::BillingResponseCode,
            purchase_model::{PurchaseModel, PurchaseStateModel},
            storefront_model::StorefrontModel,
        },
        repositories::in_app_billing_impl::InAppBillingImpl,
    },
    domain::{
        entities::{
            billing_platform::BillingPlatform,
            finalize_result::FinalizeResult,
            in_app_billing_purchase::{InAppBillingPurchase, PurchaseState},
            item_type::{ItemType, ProductKind, SubscriptionReplacementMode},
        },
        repositories::{
            in_app_billing::{InAppBilling, PurchaseOptions},
            purchase_verifier::PurchaseVerifier,
        },
    },
    errors::{BillingError, PurchaseError, PurchaseErrorReason},
    util::BillingSession,
};
use tokio_util::sync::CancellationToken;

fn config(platform: BillingPlatform) -> BillingConfig {
    BillingConfig {
        platform,
        ..BillingConfig::default()
    }
}

fn billing(platform: BillingPlatform) -> InAppBillingImpl<TestStoreDatasourceImpl> {
    InAppBillingImpl::with_test_store(&config(platform), |store| {
        store
            .with_one_time_product("sku_a", 990_000)
            .with_one_time_product("coins_100", 1_990_000)
            .with_subscription("premium", 4_990_000)
            .with_subscription("premium_plus", 9_990_000)
    })
    .unwrap()
}

async fn connected(platform: BillingPlatform) -> InAppBillingImpl<TestStoreDatasourceImpl> {
    let b = billing(platform);
    assert!(b.connect(true, &CancellationToken::new()).await.unwrap());
    b
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn purchase_reason(result: Result<InAppBillingPurchase, BillingError>) -> PurchaseErrorReason {
    match result {
        Err(BillingError::Purchase(PurchaseError { reason, .. })) => reason,
        other => panic!("expected purchase error, got {other:?}"),
    }
}

#[tokio::test]
async fn connect_reports_unreachable_service_as_false() {
    let b = billing(BillingPlatform::GooglePlay);
    let cancel = CancellationToken::new();
    b.billing_service().set_connection_available(false);
    assert!(!b.connect(true, &cancel).await.unwrap());
    assert!(!b.is_connected());

    b.billing_service().set_connection_available(true);
    assert!(b.connect(true, &cancel).await.unwrap());
    // Reconnecting while connected does not reach the store again.
    assert!(b.connect(true, &cancel).await.unwrap());
    assert_eq!(b.billing_service().stats().connections_started, 1);
}

#[tokio::test]
async fn product_info_ignoring_invalid_products_returns_valid_subset() {
    let b = connected(BillingPlatform::GooglePlay).await;
    b.set_ignore_invalid_products(true);
    let products = b
        .get_product_info(
            ItemType::InAppPurchase,
            &ids(&["sku_a", "sku_unknown"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product_id, "sku_a");
    assert_eq!(products[0].localized_price, "$0.99");
    assert_eq!(products[0].micros_price, 990_000);
    assert_eq!(products[0].item_type, ItemType::InAppPurchase);
}

#[tokio::test]
async fn product_info_reports_invalid_products_unless_ignored() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let result = b
        .get_product_info(
            ItemType::InAppPurchase,
            &ids(&["sku_a", "sku_unknown", "premium"]),
            &CancellationToken::new(),
        )
        .await;
    match result {
        Err(BillingError::InvalidProducts { product_ids }) => {
            // "premium" exists, but is a subscription.
            assert_eq!(product_ids, ids(&["sku_unknown", "premium"]));
        }
        other => panic!("expected invalid products, got {other:?}"),
    }
}

#[tokio::test]
async fn product_info_keeps_input_order() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let products = b
        .get_product_info(
            ItemType::InAppPurchaseConsumable,
            &ids(&["coins_100", "sku_a"]),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    let returned: Vec<_> = products.iter().map(|p| p.product_id.as_str()).collect();
    assert_eq!(returned, ["coins_100", "sku_a"]);
    assert!(products
        .iter()
        .all(|p| p.item_type == ItemType::InAppPurchaseConsumable));
}

#[tokio::test]
async fn product_info_rejects_empty_id_list() {
    let b = connected(BillingPlatform::GooglePlay).await;
    assert!(matches!(
        b.get_product_info(ItemType::Subscription, &[], &CancellationToken::new())
            .await,
        Err(BillingError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn purchase_returns_matching_purchase() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase(
            "sku_a",
            ItemType::InAppPurchase,
            PurchaseOptions {
                obfuscated_account_id: Some("account-1".to_string()),
                ..PurchaseOptions::default()
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(purchase.product_id, "sku_a");
    assert!(!purchase.id.is_empty());
    assert_eq!(purchase.state, PurchaseState::Purchased);
    assert_eq!(purchase.obfuscated_account_id.as_deref(), Some("account-1"));

    let owned = b
        .get_purchases(ItemType::InAppPurchase, &cancel)
        .await
        .unwrap();
    assert_eq!(owned, vec![purchase]);
}

#[tokio::test]
async fn purchase_failures_collapse_into_purchase_error() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();

    b.billing_service()
        .fail_next_purchase(BillingResponseCode::UserCanceled);
    assert_eq!(
        purchase_reason(
            b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await
        ),
        PurchaseErrorReason::UserCancelled
    );

    b.billing_service()
        .fail_next_purchase(BillingResponseCode::NetworkError);
    assert_eq!(
        purchase_reason(
            b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await
        ),
        PurchaseErrorReason::NetworkError
    );

    assert_eq!(
        purchase_reason(
            b.purchase(
                "sku_missing",
                ItemType::InAppPurchase,
                PurchaseOptions::default(),
                &cancel
            )
            .await
        ),
        PurchaseErrorReason::ItemUnavailable
    );

    b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(
        purchase_reason(
            b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await
        ),
        PurchaseErrorReason::AlreadyOwned
    );
}

#[tokio::test]
async fn subscription_purchase_defaults_to_first_offer() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase("premium", ItemType::Subscription, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    assert!(purchase.auto_renewing);

    let unknown_offer = b
        .purchase(
            "premium_plus",
            ItemType::Subscription,
            PurchaseOptions {
                sub_offer_token: Some("no-such-offer".to_string()),
                ..PurchaseOptions::default()
            },
            &cancel,
        )
        .await;
    assert_eq!(
        purchase_reason(unknown_offer),
        PurchaseErrorReason::DeveloperError
    );
}

#[tokio::test]
async fn operations_after_disconnect_fail() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    b.disconnect(&cancel).await.unwrap();
    assert!(!b.is_connected());
    assert_eq!(b.billing_service().stats().connections_ended, 1);

    assert!(matches!(
        b.purchase("coins_100", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
            .await,
        Err(BillingError::NotConnected)
    ));
    assert!(matches!(
        b.consume_purchase("sku_a", &purchase.purchase_token, &cancel)
            .await,
        Err(BillingError::NotConnected)
    ));
    assert!(matches!(
        b.finalize_purchase(&[purchase.id.clone()], &cancel).await,
        Err(BillingError::NotConnected)
    ));
    assert!(matches!(
        b.finalize_purchase_of_product(&ids(&["sku_a"]), &cancel)
            .await,
        Err(BillingError::NotConnected)
    ));
    assert!(matches!(
        b.upgrade_purchased_subscription(
            "premium_plus",
            "token",
            SubscriptionReplacementMode::default(),
            &cancel
        )
        .await,
        Err(BillingError::NotConnected)
    ));
    // Nothing reached the store after disconnecting.
    assert_eq!(b.billing_service().stats().purchase_flows, 1);
    assert_eq!(b.billing_service().stats().finalizations, 0);
}

#[tokio::test]
async fn consuming_twice_reports_success_once() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase(
            "coins_100",
            ItemType::InAppPurchaseConsumable,
            PurchaseOptions::default(),
            &cancel,
        )
        .await
        .unwrap();

    assert!(b
        .consume_purchase("coins_100", &purchase.purchase_token, &cancel)
        .await
        .unwrap());
    assert!(!b
        .consume_purchase("coins_100", &purchase.purchase_token, &cancel)
        .await
        .unwrap());
    assert_eq!(b.billing_service().stats().consumptions, 1);

    // Consumed products can be bought again.
    b.purchase(
        "coins_100",
        ItemType::InAppPurchaseConsumable,
        PurchaseOptions::default(),
        &cancel,
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn failed_consumption_can_be_retried() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let result = b.consume_purchase("coins_100", "unknown-token", &cancel).await;
    assert!(matches!(
        result,
        Err(BillingError::Purchase(PurchaseError {
            reason: PurchaseErrorReason::NotOwned,
            ..
        }))
    ));
    // The failed attempt did not mark the transaction as consumed.
    assert!(b
        .consume_purchase("coins_100", "unknown-token", &cancel)
        .await
        .is_err());
    assert_eq!(b.billing_service().stats().consumptions, 2);
}

#[tokio::test]
async fn finalize_reports_one_result_per_id_in_order() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let a = b
        .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    let coins = b
        .purchase("coins_100", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    b.billing_service().fail_finalization_of(&coins.id);

    let results = b
        .finalize_purchase(
            &[
                coins.id.clone(),
                "unknown".to_string(),
                a.id.clone(),
                a.id.clone(),
            ],
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(
        results,
        vec![
            FinalizeResult {
                id: coins.id.clone(),
                success: false
            },
            FinalizeResult {
                id: "unknown".to_string(),
                success: false
            },
            FinalizeResult {
                id: a.id.clone(),
                success: true
            },
            FinalizeResult {
                id: a.id.clone(),
                success: true
            },
        ]
    );
    // The duplicate id was not acknowledged twice.
    assert_eq!(b.billing_service().stats().finalizations, 3);

    let owned = b
        .get_purchases(ItemType::InAppPurchase, &cancel)
        .await
        .unwrap();
    let acknowledged: Vec<_> = owned
        .iter()
        .filter(|p| p.is_acknowledged)
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(acknowledged, [a.id.as_str()]);
}

#[tokio::test]
async fn finalize_of_product_finalizes_all_its_purchases() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    b.purchase("premium", ItemType::Subscription, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();

    let results = b
        .finalize_purchase_of_product(&ids(&["premium", "never_bought", "sku_a"]), &cancel)
        .await
        .unwrap();
    assert_eq!(
        results,
        vec![
            FinalizeResult {
                id: "premium".to_string(),
                success: true
            },
            FinalizeResult {
                id: "never_bought".to_string(),
                success: false
            },
            FinalizeResult {
                id: "sku_a".to_string(),
                success: true
            },
        ]
    );
    assert!(b
        .billing_service()
        .ledger()
        .iter()
        .all(|p| p.acknowledged));

    // Already finalized purchases are not sent to the store again.
    let again = b
        .finalize_purchase_of_product(&ids(&["sku_a"]), &cancel)
        .await
        .unwrap();
    assert_eq!(
        again,
        vec![FinalizeResult {
            id: "sku_a".to_string(),
            success: true
        }]
    );
    assert_eq!(b.billing_service().stats().finalizations, 2);
}

#[tokio::test]
async fn concurrent_finalization_reaches_store_once() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    let id = [purchase.id.clone()];

    b.billing_service().hold_next(HeldCall::Finalization);
    let (first, second, _) = tokio::join!(
        b.finalize_purchase(&id, &cancel),
        b.finalize_purchase(&id, &cancel),
        async { b.billing_service().release_held(HeldCall::Finalization) },
    );
    assert!(first.unwrap()[0].success);
    assert!(second.unwrap()[0].success);
    assert_eq!(b.billing_service().stats().finalizations, 1);
}

#[tokio::test]
async fn cancelled_connect_ends_store_connection() {
    let b = billing(BillingPlatform::GooglePlay);
    let cancel = CancellationToken::new();
    b.billing_service().hold_next(HeldCall::Connection);
    let (connected, _) = tokio::join!(b.connect(true, &cancel), async { cancel.cancel() });
    assert!(matches!(connected, Err(BillingError::Cancelled)));
    assert!(!b.is_connected());
    let stats = b.billing_service().stats();
    assert_eq!(stats.connections_started, 1);
    assert_eq!(stats.connections_ended, 1);

    // The facade can connect again afterwards.
    assert!(b.connect(true, &CancellationToken::new()).await.unwrap());
}

#[tokio::test]
async fn consumption_cancelled_in_flight_is_still_recorded() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase(
            "coins_100",
            ItemType::InAppPurchaseConsumable,
            PurchaseOptions::default(),
            &cancel,
        )
        .await
        .unwrap();

    let consume_cancel = CancellationToken::new();
    b.billing_service().hold_next(HeldCall::Consumption);
    let (consumed, _) = tokio::join!(
        b.consume_purchase("coins_100", &purchase.purchase_token, &consume_cancel),
        async {
            consume_cancel.cancel();
            b.billing_service().release_held(HeldCall::Consumption);
        },
    );
    assert!(consumed.unwrap());
    assert!(!b
        .consume_purchase("coins_100", &purchase.purchase_token, &cancel)
        .await
        .unwrap());
    assert_eq!(b.billing_service().stats().consumptions, 1);
}

#[tokio::test]
async fn consumed_transactions_are_remembered_across_reconnects() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let purchase = b
        .purchase(
            "coins_100",
            ItemType::InAppPurchaseConsumable,
            PurchaseOptions::default(),
            &cancel,
        )
        .await
        .unwrap();
    assert!(b
        .consume_purchase("coins_100", &purchase.purchase_token, &cancel)
        .await
        .unwrap());

    b.disconnect(&cancel).await.unwrap();
    assert!(b.connect(true, &cancel).await.unwrap());
    assert!(!b
        .consume_purchase("coins_100", &purchase.purchase_token, &cancel)
        .await
        .unwrap());
    assert_eq!(b.billing_service().stats().consumptions, 1);
}

#[tokio::test]
async fn concurrent_purchase_of_same_product_is_rejected() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    b.billing_service().hold_next(HeldCall::Purchase);
    let (first, (second, other)) = tokio::join!(
        b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel),
        async {
            // The first flow is waiting on the store at this point.
            let second = b
                .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await;
            let other = b
                .purchase("coins_100", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await;
            b.billing_service().release_held(HeldCall::Purchase);
            (second, other)
        },
    );
    assert_eq!(first.unwrap().product_id, "sku_a");
    assert_eq!(purchase_reason(second), PurchaseErrorReason::PurchaseInProgress);
    assert_eq!(other.unwrap().product_id, "coins_100");
    assert_eq!(b.billing_service().stats().purchase_flows, 2);
}

#[tokio::test]
async fn cancelled_purchase_releases_product() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    b.billing_service().hold_next(HeldCall::Purchase);
    let held = CancellationToken::new();
    let (cancelled, _) = tokio::join!(
        b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &held),
        async { held.cancel() },
    );
    assert!(matches!(cancelled, Err(BillingError::Cancelled)));

    b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_token_cancels_operations() {
    let b = billing(BillingPlatform::GooglePlay);
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert!(matches!(
        b.connect(true, &cancel).await,
        Err(BillingError::Cancelled)
    ));
    assert!(!b.is_connected());
}

#[tokio::test]
async fn upgrade_replaces_subscription() {
    let b = connected(BillingPlatform::GooglePlay).await;
    let cancel = CancellationToken::new();
    let original = b
        .purchase("premium", ItemType::Subscription, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();

    assert!(matches!(
        b.upgrade_purchased_subscription(
            "premium_plus",
            "",
            SubscriptionReplacementMode::ChargeProratedPrice,
            &cancel
        )
        .await,
        Err(BillingError::InvalidArgument(_))
    ));

    let upgraded = b
        .upgrade_purchased_subscription(
            "premium_plus",
            &original.purchase_token,
            SubscriptionReplacementMode::ChargeProratedPrice,
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(upgraded.product_id, "premium_plus");

    let active = b
        .get_purchases(ItemType::Subscription, &cancel)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].product_id, "premium_plus");

    let history = b
        .get_purchases_history(ItemType::Subscription, &cancel)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .any(|p| p.product_id == "premium" && p.state == PurchaseState::Canceled));
}

#[tokio::test]
async fn app_store_capabilities_gate_operations() {
    let b = connected(BillingPlatform::AppStore).await;
    let cancel = CancellationToken::new();
    assert!(matches!(
        b.get_purchases_history(ItemType::InAppPurchase, &cancel)
            .await,
        Err(BillingError::NotSupported(_))
    ));
    assert!(matches!(
        b.upgrade_purchased_subscription(
            "premium_plus",
            "token",
            SubscriptionReplacementMode::Deferred,
            &cancel
        )
        .await,
        Err(BillingError::NotSupported(_))
    ));

    b.present_code_redemption();
    assert_eq!(b.billing_service().stats().code_redemptions_presented, 1);

    b.purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    let receipt = b.receipt_data().await.unwrap();
    let ledger: Vec<PurchaseModel> = serde_json::from_slice(
        &base64::Engine::decode(&base64::prelude::BASE64_STANDARD, receipt).unwrap(),
    )
    .unwrap();
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn google_play_has_no_receipt_or_code_redemption() {
    let b = connected(BillingPlatform::GooglePlay).await;
    assert_eq!(b.receipt_data().await, None);
    b.present_code_redemption();
    assert_eq!(b.billing_service().stats().code_redemptions_presented, 0);
}

#[tokio::test]
async fn storefront_and_payment_availability() {
    let b = InAppBillingImpl::with_test_store(&config(BillingPlatform::AppStore), |store| {
        store.with_storefront(Some(StorefrontModel {
            id: Some("143443".to_string()),
            country_code: "DEU".to_string(),
        }))
    })
    .unwrap();
    let storefront = b.storefront().await.unwrap();
    assert_eq!(storefront.country_code, "DEU");
    assert_eq!(storefront.id, "143443");

    assert!(b.can_make_payments().await);
    b.billing_service().set_can_make_payments(false);
    assert!(!b.can_make_payments().await);
}

#[tokio::test]
async fn mismatched_platform_is_a_config_error() {
    let result = InAppBillingImpl::new(
        TestStoreDatasourceImpl::new(BillingPlatform::AppStore),
        &config(BillingPlatform::GooglePlay),
    );
    assert!(matches!(result, Err(BillingError::Config(_))));
}

struct RejectProduct(&'static str);

#[async_trait]
impl PurchaseVerifier for RejectProduct {
    async fn verify_purchase(&self, purchase: &InAppBillingPurchase) -> Result<bool, BillingError> {
        if purchase.product_id == "coins_100" {
            return Err(BillingError::Verification("malformed signature".to_string()));
        }
        Ok(purchase.product_id != self.0)
    }
}

#[tokio::test]
async fn purchases_failing_verification_are_excluded() {
    let b = billing(BillingPlatform::GooglePlay).with_verifier(Arc::new(RejectProduct("sku_a")));
    let cancel = CancellationToken::new();
    assert!(b.connect(true, &cancel).await.unwrap());
    for product_id in ["sku_a", "coins_100"] {
        b.purchase(product_id, ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
            .await
            .unwrap();
    }
    b.billing_service().grant_purchase(PurchaseModel {
        order_id: Some("GPA.9999".to_string()),
        package_name: None,
        product_ids: vec!["legacy".to_string()],
        product_kind: ProductKind::InApp,
        purchase_time: Utc::now(),
        purchase_state: PurchaseStateModel::Purchased,
        purchase_token: "legacy-token".to_string(),
        quantity: None,
        acknowledged: true,
        auto_renewing: false,
        consumed: false,
        obfuscated_account_id: None,
        obfuscated_profile_id: None,
        original_json: None,
        signature: None,
    });

    let purchases = b
        .get_purchases(ItemType::InAppPurchase, &cancel)
        .await
        .unwrap();
    let product_ids: Vec<_> = purchases.iter().map(|p| p.product_id.as_str()).collect();
    assert_eq!(product_ids, ["legacy"]);

    // Testing mode skips verification.
    b.set_in_testing_mode(true);
    assert_eq!(
        b.get_purchases(ItemType::InAppPurchase, &cancel)
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn pending_purchases_follow_connect_setting() {
    let b = billing(BillingPlatform::GooglePlay);
    let cancel = CancellationToken::new();
    assert!(b.connect(true, &cancel).await.unwrap());
    b.billing_service().make_next_purchase_pending();
    let purchase = b
        .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
        .await
        .unwrap();
    assert_eq!(purchase.state, PurchaseState::Pending);
    assert_eq!(purchase.id, purchase.purchase_token);

    // Pending purchases can not be finalized yet.
    let results = b
        .finalize_purchase(&[purchase.id.clone()], &cancel)
        .await
        .unwrap();
    assert!(!results[0].success);

    // Without pending purchases enabled, the store rejects the flow.
    b.disconnect(&cancel).await.unwrap();
    assert!(b.connect(false, &cancel).await.unwrap());
    b.billing_service().make_next_purchase_pending();
    assert_eq!(
        purchase_reason(
            b.purchase("coins_100", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
                .await
        ),
        PurchaseErrorReason::DeveloperError
    );
}

#[tokio::test]
async fn session_releases_connection_on_drop() {
    let b = billing(BillingPlatform::GooglePlay);
    let cancel = CancellationToken::new();
    {
        let session = BillingSession::connect(&b, true, &cancel)
            .await
            .unwrap()
            .unwrap();
        assert!(session.is_connected());
        session
            .purchase("sku_a", ItemType::InAppPurchase, PurchaseOptions::default(), &cancel)
            .await
            .unwrap();
    }
    assert!(!b.is_connected());
    assert_eq!(b.billing_service().stats().connections_ended, 1);

    let session = BillingSession::open(&b, &BillingConfig::default(), &cancel)
        .await
        .unwrap()
        .unwrap();
    session.close(&cancel).await.unwrap();
    assert!(!b.is_connected());
    assert_eq!(b.billing_service().stats().connections_ended, 2);

    b.billing_service().set_connection_available(false);
    assert!(BillingSession::connect(&b, true, &cancel)
        .await
        .unwrap()
        .is_none());
}
