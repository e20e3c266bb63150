// Services module for the realty back office
// Business logic layer between the HTTP handlers and the store

pub mod identity;
pub mod lease_expiry;
pub mod maintenance;
pub mod ownership;
pub mod payments;
pub mod property;
pub mod role;
pub mod subscription;
pub mod tenant;
pub mod triage;
pub mod webhook_signature;

// Re-export commonly used services
pub use identity::{IdentityClaims, IdentityError, IdentityVerifier};
pub use lease_expiry::{LeaseExpiryNotifier, SweepReport};
pub use maintenance::MaintenanceService;
pub use payments::{CheckoutClient, CheckoutRequest, CheckoutSession, HttpCheckoutClient, PaymentsError};
pub use property::PropertyService;
pub use role::RoleResolver;
pub use subscription::{BillingError, BillingEvent, BillingService, PriceCatalog};
pub use tenant::TenantService;
pub use triage::{PriorityClassifier, TriageError};
pub use webhook_signature::{SignatureError, WebhookVerifier};
