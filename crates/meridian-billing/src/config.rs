//! Pricing Configuration Snapshot
//!
//! Immutable view of everything the rating engine needs for one billing run:
//! the plan, per-service usage pricing and tier ladders, global settings and
//! the organization's override, if any. The admin console mutates the
//! [`crate::catalog::PricingCatalog`]; the engine only ever sees a snapshot.

use meridian_common::{OrganizationId, PlanId, UsagePricingId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::overrides::RateCategory;
use crate::settings::BillingSettings;
use crate::ConfigurationError;

/// Metered service types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Outbound SMS messages
    Sms,
    /// AI assistant requests
    Ai,
    /// Mailbox and attachment storage
    Storage,
}

impl ServiceType {
    /// All metered services, in rating order
    pub const ALL: [ServiceType; 3] = [ServiceType::Sms, ServiceType::Ai, ServiceType::Storage];
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sms => write!(f, "sms"),
            Self::Ai => write!(f, "ai"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms" => Ok(Self::Sms),
            "ai" => Ok(Self::Ai),
            "storage" => Ok(Self::Storage),
            _ => Err(format!("Unknown service type: {}", s)),
        }
    }
}

/// Subscription billing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    /// Billed every month at the monthly per-seat rate
    Monthly,
    /// Billed yearly at the annual per-seat rate
    Annual,
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

/// How a metered service is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    /// Every billable unit at `base_rate`
    Flat,
    /// Marginal rating across the service's tier ladder
    Tiered,
}

/// Subscription plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan id
    pub id: PlanId,
    /// Machine name, e.g. "pro"
    pub name: String,
    /// Name shown in the admin console and on invoices
    pub display_name: String,
    /// Per-seat price on the monthly cycle
    pub base_price_monthly: Decimal,
    /// Per-seat price on the annual cycle, set independently of the
    /// monthly price; the global annual discount applies at invoice time
    pub base_price_annual: Decimal,
    /// Smallest allowed subscription size
    pub min_seats: u32,
    /// Largest allowed subscription size, unbounded if absent
    pub max_seats: Option<u32>,
    /// Inactive plans are closed to new subscriptions but existing
    /// subscriptions keep billing against them
    pub is_active: bool,
}

impl Plan {
    /// Per-seat base rate for a billing cycle
    pub fn base_rate(&self, cycle: BillingCycle) -> Decimal {
        match cycle {
            BillingCycle::Monthly => self.base_price_monthly,
            BillingCycle::Annual => self.base_price_annual,
        }
    }

    /// Check the plan's invariants
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_seats < 1 {
            return Err(ConfigurationError::InvalidPlan(format!(
                "plan {}: min_seats must be at least 1",
                self.name
            )));
        }
        if let Some(max) = self.max_seats {
            if max < self.min_seats {
                return Err(ConfigurationError::InvalidPlan(format!(
                    "plan {}: max_seats {} below min_seats {}",
                    self.name, max, self.min_seats
                )));
            }
        }
        if self.base_price_monthly < Decimal::ZERO || self.base_price_annual < Decimal::ZERO {
            return Err(ConfigurationError::InvalidPlan(format!(
                "plan {}: negative base price",
                self.name
            )));
        }
        Ok(())
    }
}

/// Usage pricing for one metered service, unique per [`ServiceType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePricing {
    /// Record id
    pub id: UsagePricingId,
    /// Metered service this record prices
    pub service: ServiceType,
    /// Flat or tiered rating
    pub pricing_model: PricingModel,
    /// Rate used for flat pricing, and the safety net when a tiered
    /// service has no tiers configured
    pub base_rate: Decimal,
    /// Billing unit shown on invoices, e.g. "message", "request", "gb"
    pub unit: String,
    /// Quantity included at no charge, consumed before any rating
    pub free_tier_amount: Decimal,
    /// Kill-switch: an inactive service is not billed at all
    pub is_active: bool,
}

/// One band of a service's tier ladder
///
/// A ladder partitions `[0, ∞)`: sorted ascending, the first band starts at
/// zero, each finite `max_quantity` equals the next band's `min_quantity`,
/// and only the last band may be open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    /// Tier id
    pub id: uuid::Uuid,
    /// Usage pricing record this tier belongs to
    pub usage_pricing_id: UsagePricingId,
    /// Label shown in the admin console
    pub tier_name: String,
    /// Inclusive lower bound of the band
    pub min_quantity: Decimal,
    /// Exclusive upper bound, open-ended if absent
    pub max_quantity: Option<Decimal>,
    /// Rate charged for units inside this band
    pub rate_per_unit: Decimal,
}

/// Per-organization pricing override
///
/// Each field is independently optional: absent means "use the default",
/// present takes absolute precedence over plan and usage-pricing rates and
/// bypasses tiers entirely for that category. An override of zero is a real
/// override, not a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationOverride {
    /// Override record id
    pub id: uuid::Uuid,
    /// Organization the override applies to; at most one record each
    pub organization_id: OrganizationId,
    /// Negotiated plan assignment, if any
    pub plan_id: Option<PlanId>,
    /// Custom per-seat monthly rate
    pub custom_monthly_rate: Option<Decimal>,
    /// Custom per-seat annual rate; already the negotiated final rate, the
    /// global annual discount is not reapplied on top of it
    pub custom_annual_rate: Option<Decimal>,
    /// Custom flat SMS rate
    pub custom_sms_rate: Option<Decimal>,
    /// Custom flat AI-request rate
    pub custom_ai_rate: Option<Decimal>,
    /// Custom flat storage rate
    pub custom_storage_rate: Option<Decimal>,
    /// Free-form note from the account team
    pub notes: Option<String>,
}

impl OrganizationOverride {
    /// Custom rate for a category, if one was negotiated
    pub fn rate_for(&self, category: RateCategory) -> Option<Decimal> {
        match category {
            RateCategory::MonthlyBase => self.custom_monthly_rate,
            RateCategory::AnnualBase => self.custom_annual_rate,
            RateCategory::Sms => self.custom_sms_rate,
            RateCategory::Ai => self.custom_ai_rate,
            RateCategory::Storage => self.custom_storage_rate,
        }
    }
}

/// Immutable pricing snapshot for one billing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// The organization's subscription plan
    pub plan: Plan,
    /// Usage pricing per metered service
    pub usage_pricing: BTreeMap<ServiceType, UsagePricing>,
    /// Tier ladders per metered service, sorted by `min_quantity`
    pub tiers: BTreeMap<ServiceType, Vec<PricingTier>>,
    /// Global billing settings
    pub settings: BillingSettings,
    /// The organization's pricing override, if any
    pub org_override: Option<OrganizationOverride>,
}

impl PricingConfig {
    /// Check the snapshot's structural invariants.
    ///
    /// Tier ladders are validated lazily by the tier resolver, when and only
    /// when a ladder is actually used; an override that bypasses tiers must
    /// not surface latent ladder faults.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.plan.validate()
    }

    /// Usage pricing for a service, if configured
    pub fn pricing_for(&self, service: ServiceType) -> Option<&UsagePricing> {
        self.usage_pricing.get(&service)
    }

    /// Tier ladder for a service; empty if none configured
    pub fn ladder_for(&self, service: ServiceType) -> &[PricingTier] {
        self.tiers.get(&service).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            name: "pro".into(),
            display_name: "Pro".into(),
            base_price_monthly: dec!(10),
            base_price_annual: dec!(100),
            min_seats: 1,
            max_seats: Some(50),
            is_active: true,
        }
    }

    #[test]
    fn test_plan_validate_ok() {
        assert!(plan().validate().is_ok());
    }

    #[test]
    fn test_plan_rejects_zero_min_seats() {
        let mut p = plan();
        p.min_seats = 0;
        assert!(matches!(
            p.validate(),
            Err(ConfigurationError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_plan_rejects_inverted_seat_range() {
        let mut p = plan();
        p.min_seats = 10;
        p.max_seats = Some(5);
        assert!(matches!(
            p.validate(),
            Err(ConfigurationError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_service_type_round_trip() {
        for service in ServiceType::ALL {
            assert_eq!(service.to_string().parse::<ServiceType>(), Ok(service));
        }
    }
}
