// Subscription plan mapping and billing event handling
// Plan state only changes through provider webhooks; the transition from
// (previous row, event) to the next row is a pure function so replays converge.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::app_config::PaymentsConfig;
use crate::models::{PlanTier, PropertyLimit, Subscription, SubscriptionRecord, SubscriptionStatus};
use crate::services::payments::{CheckoutClient, CheckoutRequest, CheckoutSession, PaymentsError};
use crate::store::{Store, StoreError};
use crate::utils::ServiceError;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Unknown price id: {0}")]
    UnknownPrice(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("No price configured for plan {0}")]
    PlanNotConfigured(PlanTier),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Payments error: {0}")]
    Payments(#[from] PaymentsError),
}

impl From<BillingError> for ServiceError {
    fn from(error: BillingError) -> Self {
        match error {
            BillingError::UnknownPrice(price) => ServiceError::UnknownPrice(price),
            BillingError::MalformedEvent(msg) => ServiceError::ValidationError(msg),
            BillingError::PlanNotConfigured(plan) => {
                ServiceError::ValidationError(format!("Plan {} is not available", plan))
            },
            BillingError::Store(e) => e.into(),
            BillingError::Payments(e) => ServiceError::UpstreamError(e.to_string()),
        }
    }
}

// =============================================================================
// PRICE CATALOG
// =============================================================================

/// Explicit provider price id to plan tier lookup
#[derive(Debug, Clone, Default)]
pub struct PriceCatalog {
    by_price: HashMap<String, PlanTier>,
    primary: HashMap<PlanTier, String>,
}

impl PriceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register price ids for a tier; the first one is used for new checkouts
    pub fn with_prices<I, S>(mut self, tier: PlanTier, price_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for price_id in price_ids {
            let price_id = price_id.into();
            if let Some(previous) = self.by_price.insert(price_id.clone(), tier) {
                if previous != tier {
                    warn!(
                        "Price {} was mapped to {} and is now mapped to {}",
                        price_id, previous, tier
                    );
                }
            }
            self.primary.entry(tier).or_insert(price_id);
        }
        self
    }

    pub fn from_config(config: &PaymentsConfig) -> Self {
        Self::new()
            .with_prices(PlanTier::Basic, config.price_ids_basic.iter().cloned())
            .with_prices(PlanTier::Pro, config.price_ids_pro.iter().cloned())
            .with_prices(PlanTier::Premium, config.price_ids_premium.iter().cloned())
    }

    pub fn tier_for(&self, price_id: &str) -> Result<PlanTier, BillingError> {
        self.by_price
            .get(price_id)
            .copied()
            .ok_or_else(|| BillingError::UnknownPrice(price_id.to_string()))
    }

    pub fn price_for(&self, tier: PlanTier) -> Option<&str> {
        self.primary.get(&tier).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_price.is_empty()
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Provider event reduced to what plan state depends on
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    /// Status and trial come from the expanded subscription when the session
    /// carries one, otherwise the plan starts active
    CheckoutCompleted {
        customer_id: String,
        owner_id: Option<String>,
        price_id: String,
        status: SubscriptionStatus,
        trial_end: Option<DateTime<Utc>>,
    },
    SubscriptionChanged {
        customer_id: String,
        owner_id: Option<String>,
        price_id: String,
        status: SubscriptionStatus,
        trial_end: Option<DateTime<Utc>>,
    },
    PaymentFailed {
        customer_id: String,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
    Ignored {
        event_type: String,
    },
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn required_str(value: &Value, pointer: &str) -> Result<String, BillingError> {
    str_at(value, pointer)
        .map(str::to_string)
        .ok_or_else(|| BillingError::MalformedEvent(format!("missing {}", pointer)))
}

fn provider_status(object: &Value) -> Result<SubscriptionStatus, BillingError> {
    let raw_status = required_str(object, "/status")?;
    SubscriptionStatus::from_provider(&raw_status)
        .ok_or_else(|| BillingError::MalformedEvent(format!("unknown status {}", raw_status)))
}

fn trial_end_at(object: &Value) -> Option<DateTime<Utc>> {
    object
        .get("trial_end")
        .and_then(Value::as_i64)
        .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
}

/// Customer may be a bare id or an expanded object
fn customer_id(object: &Value) -> Result<String, BillingError> {
    str_at(object, "/customer")
        .or_else(|| str_at(object, "/customer/id"))
        .map(str::to_string)
        .ok_or_else(|| BillingError::MalformedEvent("missing customer".to_string()))
}

impl BillingEvent {
    pub fn event_type(&self) -> &str {
        match self {
            BillingEvent::CheckoutCompleted { .. } => "checkout.session.completed",
            BillingEvent::SubscriptionChanged { .. } => "customer.subscription.updated",
            BillingEvent::PaymentFailed { .. } => "invoice.payment_failed",
            BillingEvent::SubscriptionDeleted { .. } => "customer.subscription.deleted",
            BillingEvent::Ignored { event_type } => event_type,
        }
    }

    pub fn customer_id(&self) -> Option<&str> {
        match self {
            BillingEvent::CheckoutCompleted { customer_id, .. }
            | BillingEvent::SubscriptionChanged { customer_id, .. }
            | BillingEvent::PaymentFailed { customer_id }
            | BillingEvent::SubscriptionDeleted { customer_id } => Some(customer_id),
            BillingEvent::Ignored { .. } => None,
        }
    }

    pub fn parse(payload: &[u8]) -> Result<Self, BillingError> {
        let event: Value = serde_json::from_slice(payload)
            .map_err(|e| BillingError::MalformedEvent(format!("invalid JSON: {}", e)))?;
        let event_type = required_str(&event, "/type")?;
        let object = event
            .pointer("/data/object")
            .ok_or_else(|| BillingError::MalformedEvent("missing data.object".to_string()))?;

        let parsed = match event_type.as_str() {
            "checkout.session.completed" => {
                // A bare subscription id carries no state
                let (status, trial_end) = match object.get("subscription") {
                    Some(subscription) if subscription.is_object() => {
                        (provider_status(subscription)?, trial_end_at(subscription))
                    },
                    _ => (SubscriptionStatus::Active, None),
                };

                BillingEvent::CheckoutCompleted {
                    customer_id: customer_id(object)?,
                    owner_id: str_at(object, "/metadata/owner_id")
                        .or_else(|| str_at(object, "/client_reference_id"))
                        .map(str::to_string),
                    price_id: required_str(object, "/metadata/price_id")?,
                    status,
                    trial_end,
                }
            },
            "customer.subscription.created" | "customer.subscription.updated" => {
                BillingEvent::SubscriptionChanged {
                    customer_id: customer_id(object)?,
                    owner_id: str_at(object, "/metadata/owner_id").map(str::to_string),
                    price_id: required_str(object, "/items/data/0/price/id")?,
                    status: provider_status(object)?,
                    trial_end: trial_end_at(object),
                }
            },
            "invoice.payment_failed" => BillingEvent::PaymentFailed {
                customer_id: customer_id(object)?,
            },
            "customer.subscription.deleted" => BillingEvent::SubscriptionDeleted {
                customer_id: customer_id(object)?,
            },
            _ => BillingEvent::Ignored { event_type },
        };

        Ok(parsed)
    }
}

// =============================================================================
// STATE TRANSITION
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Upsert(SubscriptionRecord),
    Skip(&'static str),
}

fn limit_for(tier: PlanTier, status: SubscriptionStatus) -> Option<i32> {
    match status {
        SubscriptionStatus::Canceled => PropertyLimit::Limited(0).to_column(),
        _ => tier.property_limit().to_column(),
    }
}

fn carried_over(previous: &Subscription, now: DateTime<Utc>) -> SubscriptionRecord {
    SubscriptionRecord {
        customer_id: previous.customer_id.clone(),
        owner_id: previous.owner_id.clone(),
        plan: previous.plan,
        property_limit: previous.property_limit,
        status: previous.status,
        trial_end: previous.trial_end,
        updated_at: now,
    }
}

/// Next row for `event` given the stored row, if any
pub fn apply_event(
    previous: Option<&Subscription>,
    event: &BillingEvent,
    catalog: &PriceCatalog,
    now: DateTime<Utc>,
) -> Result<Transition, BillingError> {
    let previous_owner = || previous.and_then(|p| p.owner_id.clone());

    let transition = match event {
        BillingEvent::CheckoutCompleted {
            customer_id,
            owner_id,
            price_id,
            status,
            trial_end,
        }
        | BillingEvent::SubscriptionChanged {
            customer_id,
            owner_id,
            price_id,
            status,
            trial_end,
        } => {
            let plan = catalog.tier_for(price_id)?;
            Transition::Upsert(SubscriptionRecord {
                customer_id: customer_id.clone(),
                owner_id: owner_id.clone().or_else(previous_owner),
                plan,
                property_limit: limit_for(plan, *status),
                status: *status,
                trial_end: *trial_end,
                updated_at: now,
            })
        },
        BillingEvent::PaymentFailed { .. } => match previous {
            Some(previous) => Transition::Upsert(SubscriptionRecord {
                status: SubscriptionStatus::PastDue,
                ..carried_over(previous, now)
            }),
            None => Transition::Skip("payment failure for unknown customer"),
        },
        BillingEvent::SubscriptionDeleted { .. } => match previous {
            Some(previous) => Transition::Upsert(SubscriptionRecord {
                status: SubscriptionStatus::Canceled,
                property_limit: PropertyLimit::Limited(0).to_column(),
                trial_end: None,
                ..carried_over(previous, now)
            }),
            None => Transition::Skip("deletion for unknown customer"),
        },
        BillingEvent::Ignored { .. } => Transition::Skip("event type not handled"),
    };

    Ok(transition)
}

// =============================================================================
// BILLING SERVICE
// =============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookOutcome {
    pub event_type: String,
    pub applied: bool,
}

pub struct BillingService {
    store: Arc<dyn Store>,
    catalog: Arc<PriceCatalog>,
}

impl BillingService {
    pub fn new(store: Arc<dyn Store>, catalog: Arc<PriceCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Apply a verified webhook payload
    #[instrument(skip(self, payload))]
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<WebhookOutcome, BillingError> {
        let event = BillingEvent::parse(payload)?;

        let previous = match event.customer_id() {
            Some(customer_id) => self.store.find_subscription(customer_id).await?,
            None => None,
        };

        match apply_event(previous.as_ref(), &event, &self.catalog, now)? {
            Transition::Upsert(record) => {
                let saved = self.store.upsert_subscription(record).await?;
                info!(
                    customer_id = %saved.customer_id,
                    plan = %saved.plan,
                    status = %saved.status,
                    "Applied {}",
                    event.event_type()
                );
                Ok(WebhookOutcome {
                    event_type: event.event_type().to_string(),
                    applied: true,
                })
            },
            Transition::Skip(reason) => {
                if event.customer_id().is_some() {
                    warn!("Skipped {}: {}", event.event_type(), reason);
                }
                Ok(WebhookOutcome {
                    event_type: event.event_type().to_string(),
                    applied: false,
                })
            },
        }
    }

    pub async fn current_subscription(
        &self,
        owner_id: &str,
    ) -> Result<Option<Subscription>, BillingError> {
        Ok(self.store.find_subscription_for_owner(owner_id).await?)
    }

    #[instrument(skip(self, checkout, request))]
    pub async fn start_checkout(
        &self,
        checkout: &dyn CheckoutClient,
        plan: PlanTier,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let price_id = self
            .catalog
            .price_for(plan)
            .ok_or(BillingError::PlanNotConfigured(plan))?;

        let session = checkout
            .create_checkout_session(&CheckoutRequest {
                price_id: price_id.to_string(),
                ..request
            })
            .await?;
        info!("Created checkout session {} for plan {}", session.id, plan);
        Ok(session)
    }
}
