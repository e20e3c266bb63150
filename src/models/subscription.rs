// Subscription model
// One row per payment-provider customer, mutated only by billing webhooks

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::schema::subscriptions;

/// Plan tier purchased through the payment provider
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    diesel::AsExpression,
    diesel::FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Pro,
    Premium,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }

    /// Property limit carried by this tier. The only place limits are defined.
    pub fn property_limit(&self) -> PropertyLimit {
        match self {
            PlanTier::Basic => PropertyLimit::Limited(5),
            PlanTier::Pro => PropertyLimit::Limited(10),
            PlanTier::Premium => PropertyLimit::Unlimited,
        }
    }

    pub fn all() -> [PlanTier; 3] {
        [PlanTier::Basic, PlanTier::Pro, PlanTier::Premium]
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(PlanTier::Basic),
            "pro" => Ok(PlanTier::Pro),
            "premium" => Ok(PlanTier::Premium),
            _ => Err(format!("Invalid plan tier: {}", s)),
        }
    }
}

super::text_column_enum!(PlanTier);

/// Maximum number of properties an owner may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLimit {
    Limited(u32),
    Unlimited,
}

impl PropertyLimit {
    /// Column representation: NULL is the unlimited sentinel
    pub fn to_column(self) -> Option<i32> {
        match self {
            PropertyLimit::Limited(n) => Some(i32::try_from(n).unwrap_or(i32::MAX)),
            PropertyLimit::Unlimited => None,
        }
    }

    pub fn from_column(value: Option<i32>) -> Self {
        match value {
            Some(n) => PropertyLimit::Limited(u32::try_from(n).unwrap_or(0)),
            None => PropertyLimit::Unlimited,
        }
    }

    /// Whether an owner currently holding `current` properties may add one more
    pub fn allows_one_more(&self, current: u64) -> bool {
        match self {
            PropertyLimit::Unlimited => true,
            PropertyLimit::Limited(limit) => current < u64::from(*limit),
        }
    }
}

impl Serialize for PropertyLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyLimit::Limited(n) => serializer.serialize_u32(*n),
            PropertyLimit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for PropertyLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u32),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(PropertyLimit::Limited(n)),
            Raw::Word(w) if w == "unlimited" => Ok(PropertyLimit::Unlimited),
            Raw::Word(w) => Err(serde::de::Error::custom(format!(
                "invalid property limit: {}",
                w
            ))),
        }
    }
}

/// Billing status mirrored from the payment provider
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    diesel::AsExpression,
    diesel::FromSqlRow,
)]
#[diesel(sql_type = diesel::sql_types::Text)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Trialing => "trialing",
        }
    }

    /// Map a provider status, folding the provider's extra states into ours
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "past_due" | "unpaid" | "incomplete" | "paused" => Some(SubscriptionStatus::PastDue),
            "canceled" | "incomplete_expired" => Some(SubscriptionStatus::Canceled),
            "trialing" => Some(SubscriptionStatus::Trialing),
            _ => None,
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            _ => Err(format!("Invalid subscription status: {}", s)),
        }
    }
}

super::text_column_enum!(SubscriptionStatus);

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = subscriptions)]
#[diesel(primary_key(customer_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Subscription {
    pub customer_id: String,
    pub owner_id: Option<String>,
    pub plan: PlanTier,
    pub property_limit: Option<i32>,
    pub status: SubscriptionStatus,
    pub trial_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn limit(&self) -> PropertyLimit {
        PropertyLimit::from_column(self.property_limit)
    }
}

/// Full row written by the billing upsert. Every column is overwritten,
/// including NULLs, so replays converge on the same state.
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = subscriptions)]
#[diesel(primary_key(customer_id))]
#[diesel(treat_none_as_null = true)]
pub struct SubscriptionRecord {
    pub customer_id: String,
    pub owner_id: Option<String>,
    pub plan: PlanTier,
    pub property_limit: Option<i32>,
    pub status: SubscriptionStatus,
    pub trial_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionRecord> for Subscription {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            customer_id: record.customer_id,
            owner_id: record.owner_id,
            plan: record.plan,
            property_limit: record.property_limit,
            status: record.status,
            trial_end: record.trial_end,
            updated_at: record.updated_at,
        }
    }
}

/// Why a property insert was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDenied {
    NoPlan,
    LimitReached { plan: PlanTier, limit: i32 },
}

/// Whether an owner holding `current` properties may create another one
pub fn check_property_quota(
    subscription: Option<&Subscription>,
    current: i64,
) -> Result<(), QuotaDenied> {
    let subscription = subscription.ok_or(QuotaDenied::NoPlan)?;
    let current = u64::try_from(current).unwrap_or(0);

    if subscription.limit().allows_one_more(current) {
        Ok(())
    } else {
        Err(QuotaDenied::LimitReached {
            plan: subscription.plan,
            limit: subscription.property_limit.unwrap_or_default(),
        })
    }
}

/// Pick the subscription that governs an owner with several customers:
/// anything not canceled beats a canceled row, then the newest wins
pub fn governing_subscription<'a, I>(rows: I) -> Option<&'a Subscription>
where
    I: IntoIterator<Item = &'a Subscription>,
{
    rows.into_iter()
        .max_by_key(|s| (s.status != SubscriptionStatus::Canceled, s.updated_at))
}

/// API view of a subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionResponse {
    pub customer_id: String,
    pub plan: PlanTier,
    pub property_limit: PropertyLimit,
    pub status: SubscriptionStatus,
    pub trial_end: Option<DateTime<Utc>>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        let property_limit = sub.limit();
        Self {
            customer_id: sub.customer_id,
            plan: sub.plan,
            property_limit,
            status: sub.status,
            trial_end: sub.trial_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits() {
        assert_eq!(PlanTier::Basic.property_limit(), PropertyLimit::Limited(5));
        assert_eq!(PlanTier::Pro.property_limit(), PropertyLimit::Limited(10));
        assert_eq!(PlanTier::Premium.property_limit(), PropertyLimit::Unlimited);
    }

    #[test]
    fn test_limit_column_roundtrip_and_json() {
        assert_eq!(PropertyLimit::Unlimited.to_column(), None);
        assert_eq!(PropertyLimit::from_column(Some(0)), PropertyLimit::Limited(0));
        assert_eq!(
            serde_json::to_value(PropertyLimit::Unlimited).unwrap(),
            serde_json::json!("unlimited")
        );
        assert_eq!(
            serde_json::to_value(PropertyLimit::Limited(5)).unwrap(),
            serde_json::json!(5)
        );
        let parsed: PropertyLimit = serde_json::from_str("\"unlimited\"").unwrap();
        assert_eq!(parsed, PropertyLimit::Unlimited);
    }

    #[test]
    fn test_allows_one_more() {
        let five = PropertyLimit::Limited(5);
        assert!(five.allows_one_more(4));
        assert!(!five.allows_one_more(5));
        assert!(!PropertyLimit::Limited(0).allows_one_more(0));
        assert!(PropertyLimit::Unlimited.allows_one_more(10_000));
    }

    fn row(customer: &str, status: SubscriptionStatus, age_secs: i64) -> Subscription {
        Subscription {
            customer_id: customer.to_string(),
            owner_id: Some("realtor_1".to_string()),
            plan: PlanTier::Pro,
            property_limit: Some(10),
            status,
            trial_end: None,
            updated_at: Utc::now() - chrono::Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_live_plan_beats_later_cancellation() {
        let rows = [
            row("cus_new", SubscriptionStatus::Active, 60),
            row("cus_old", SubscriptionStatus::Canceled, 0),
        ];
        let picked = governing_subscription(&rows).unwrap();
        assert_eq!(picked.customer_id, "cus_new");

        let all_canceled = [
            row("cus_a", SubscriptionStatus::Canceled, 60),
            row("cus_b", SubscriptionStatus::Canceled, 0),
        ];
        assert_eq!(
            governing_subscription(&all_canceled).unwrap().customer_id,
            "cus_b"
        );
        assert!(governing_subscription(Vec::<Subscription>::new().iter()).is_none());
    }

    #[test]
    fn test_quota_check() {
        let pro = row("cus_1", SubscriptionStatus::Active, 0);
        assert!(check_property_quota(Some(&pro), 9).is_ok());
        assert_eq!(
            check_property_quota(Some(&pro), 10),
            Err(QuotaDenied::LimitReached {
                plan: PlanTier::Pro,
                limit: 10
            })
        );
        assert_eq!(check_property_quota(None, 0), Err(QuotaDenied::NoPlan));
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(
            SubscriptionStatus::from_provider("trialing"),
            Some(SubscriptionStatus::Trialing)
        );
        assert_eq!(
            SubscriptionStatus::from_provider("unpaid"),
            Some(SubscriptionStatus::PastDue)
        );
        assert_eq!(
            SubscriptionStatus::from_provider("incomplete_expired"),
            Some(SubscriptionStatus::Canceled)
        );
        assert_eq!(SubscriptionStatus::from_provider("bogus"), None);
    }
}
