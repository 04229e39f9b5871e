use std::ops::Deref;

use tokio_util::sync::CancellationToken;

use crate::{
    config::BillingConfig,
    data::{
        datasources::test_store_datasource::TestStoreDatasourceImpl,
        repositories::in_app_billing_impl::InAppBillingImpl,
    },
    domain::repositories::in_app_billing::InAppBilling,
    errors::BillingError,
};

/// A connection to the billing service, released when the session is closed
/// or dropped.
pub struct BillingSession<'a, B: InAppBilling + ?Sized> {
    billing: &'a B,
    open: bool,
}

impl<'a, B: InAppBilling + ?Sized> BillingSession<'a, B> {
    /// Connects `billing`. Returns `Ok(None)` if the billing service could not
    /// be reached.
    pub async fn connect(
        billing: &'a B,
        enable_pending_purchases: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Self>, BillingError> {
        if !billing.connect(enable_pending_purchases, cancel).await? {
            return Ok(None);
        }
        Ok(Some(Self {
            billing,
            open: true,
        }))
    }

    /// Like `connect`, with the pending-purchase setting taken from `config`.
    pub async fn open(
        billing: &'a B,
        config: &BillingConfig,
        cancel: &CancellationToken,
    ) -> Result<Option<Self>, BillingError> {
        Self::connect(billing, config.enable_pending_purchases, cancel).await
    }

    pub async fn close(mut self, cancel: &CancellationToken) -> Result<(), BillingError> {
        self.billing.disconnect(cancel).await?;
        self.open = false;
        Ok(())
    }
}

impl<B: InAppBilling + ?Sized> Deref for BillingSession<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.billing
    }
}

impl<B: InAppBilling + ?Sized> Drop for BillingSession<'_, B> {
    fn drop(&mut self) {
        if self.open {
            self.billing.set_is_connected(false);
        }
    }
}

impl InAppBillingImpl<TestStoreDatasourceImpl> {
    /// Builds a facade over an in-memory test store emulating the configured
    /// platform. `configure` sets up the store's catalog.
    pub fn with_test_store(
        config: &BillingConfig,
        configure: impl FnOnce(TestStoreDatasourceImpl) -> TestStoreDatasourceImpl,
    ) -> Result<Self, BillingError> {
        InAppBillingImpl::new(
            configure(TestStoreDatasourceImpl::new(config.platform)),
            config,
        )
    }
}
