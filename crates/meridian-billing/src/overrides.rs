//! Rate Override Resolution
//!
//! Effective-rate precedence: organization override, then the configured
//! base rate (plan for subscription categories, usage pricing for metered
//! services), then the settings-level default. A category with no rate
//! anywhere is a configuration fault — defaulting to zero would under-bill.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{BillingCycle, OrganizationOverride, Plan, ServiceType, UsagePricing};
use crate::settings::BillingSettings;
use crate::ConfigurationError;

/// Rate categories an override can substitute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateCategory {
    /// Per-seat monthly subscription rate
    MonthlyBase,
    /// Per-seat annual subscription rate
    AnnualBase,
    /// Per-message SMS rate
    Sms,
    /// Per-request AI rate
    Ai,
    /// Per-unit storage rate
    Storage,
}

impl RateCategory {
    /// Category of a subscription cycle's base rate
    pub fn for_cycle(cycle: BillingCycle) -> Self {
        match cycle {
            BillingCycle::Monthly => Self::MonthlyBase,
            BillingCycle::Annual => Self::AnnualBase,
        }
    }

    /// Category of a metered service's rate
    pub fn for_service(service: ServiceType) -> Self {
        match service {
            ServiceType::Sms => Self::Sms,
            ServiceType::Ai => Self::Ai,
            ServiceType::Storage => Self::Storage,
        }
    }

    /// The metered service this category prices, if any
    pub fn service(&self) -> Option<ServiceType> {
        match self {
            Self::Sms => Some(ServiceType::Sms),
            Self::Ai => Some(ServiceType::Ai),
            Self::Storage => Some(ServiceType::Storage),
            Self::MonthlyBase | Self::AnnualBase => None,
        }
    }
}

impl std::fmt::Display for RateCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MonthlyBase => write!(f, "base_monthly"),
            Self::AnnualBase => write!(f, "base_annual"),
            Self::Sms => write!(f, "sms"),
            Self::Ai => write!(f, "ai"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Rate supplied by the organization's override for a category, if any.
///
/// "No override" and "override of zero" are distinct: a present zero is
/// returned verbatim.
pub fn override_rate(
    org_override: Option<&OrganizationOverride>,
    category: RateCategory,
) -> Option<Decimal> {
    org_override.and_then(|o| o.rate_for(category))
}

/// Effective rate for a category.
///
/// Lookup order: override, then plan base rate (subscription categories) or
/// usage-pricing base rate (service categories), then the settings default
/// for the service. Pure lookup, no side effects.
pub fn resolve_rate(
    category: RateCategory,
    plan: &Plan,
    usage_pricing: Option<&UsagePricing>,
    settings: &BillingSettings,
    org_override: Option<&OrganizationOverride>,
) -> Result<Decimal, ConfigurationError> {
    if let Some(rate) = override_rate(org_override, category) {
        return Ok(rate);
    }
    let base = match category.service() {
        None => Some(match category {
            RateCategory::MonthlyBase => plan.base_price_monthly,
            _ => plan.base_price_annual,
        }),
        Some(service) => usage_pricing
            .map(|p| p.base_rate)
            .or_else(|| settings.default_rate(service)),
    };
    base.ok_or(ConfigurationError::MissingRate { category })
}
