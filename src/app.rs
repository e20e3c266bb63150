// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    services::{
        BillingService, CheckoutClient, IdentityVerifier, LeaseExpiryNotifier, MaintenanceService,
        PriceCatalog, PriorityClassifier, PropertyService, RoleResolver, TenantService,
        WebhookVerifier,
    },
    store::Store,
};

// Built once at startup; every client the handlers use lives here
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub identity: Arc<IdentityVerifier>,
    pub webhooks: Arc<WebhookVerifier>,
    pub prices: Arc<PriceCatalog>,
    pub checkout: Arc<dyn CheckoutClient>,
    pub classifier: Arc<dyn PriorityClassifier>,
}

impl AppState {
    pub fn roles(&self) -> RoleResolver {
        RoleResolver::new(self.store.clone())
    }

    pub fn properties(&self) -> PropertyService {
        PropertyService::new(self.store.clone())
    }

    pub fn tenants(&self) -> TenantService {
        TenantService::new(self.store.clone())
    }

    pub fn maintenance(&self) -> MaintenanceService {
        MaintenanceService::new(self.store.clone(), self.classifier.clone())
    }

    pub fn billing(&self) -> BillingService {
        BillingService::new(self.store.clone(), self.prices.clone())
    }

    pub fn lease_expiry(&self) -> LeaseExpiryNotifier {
        LeaseExpiryNotifier::new(
            self.store.clone(),
            self.config.notifications.lease_window_days,
        )
    }
}
