//! Meridian Revenue Engine
//!
//! Deterministic billing and usage rating for the Meridian Suite's
//! subscription and metered-usage pricing model.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        REVENUE ENGINE                            │
//! │                                                                  │
//! │   PricingCatalog ──► PricingConfig snapshot                      │
//! │                            │                                     │
//! │   AccountState ──► LifecyclePolicy ──► phase                     │
//! │                            │                                     │
//! │   UsageFact ────► InvoiceCalculator                              │
//! │                     ├─► OverrideResolver (rate precedence)       │
//! │                     ├─► UsageRater ──► TierResolver              │
//! │                     └─► Invoice (itemized, reproducible)         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every rating function is pure and side-effect free: identical
//! configuration, account and usage inputs produce an identical invoice,
//! so a billing job can be re-run or retried without double-charging. The
//! engine performs no I/O and never reads the wall clock; the admin
//! console's writes go to the [`PricingCatalog`], and each billing run
//! rates against a consistent snapshot.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod invoice;
pub mod lifecycle;
pub mod overrides;
pub mod rating;
pub mod settings;
pub mod tiers;

use std::sync::Arc;

use meridian_common::PlanId;
use thiserror::Error;

pub use catalog::PricingCatalog;
pub use config::{
    BillingCycle, OrganizationOverride, Plan, PricingConfig, PricingModel, PricingTier,
    ServiceType, UsagePricing,
};
pub use invoice::{compute_invoice, Invoice, InvoiceLineItem, ItemType, UsageFact};
pub use lifecycle::{account_phase, AccountPhase, AccountState};
pub use overrides::{resolve_rate, RateCategory};
pub use rating::rate_service;
pub use settings::{BillingSettings, SettingEntry, SettingType};
pub use tiers::charge_for_quantity;

/// Configuration faults that abort a billing run
///
/// Every variant is non-retryable: it points at bad configuration data, not
/// a transient failure. The caller surfaces it to an operator and moves on
/// to the next organization; the engine never returns a partial invoice
/// alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// No override, base rate or settings default exists for the category
    #[error("no rate configured for {category}")]
    MissingRate {
        /// Category that has no rate anywhere
        category: RateCategory,
    },

    /// Tier ladder is not a partition of `[0, ∞)`
    #[error("invalid tier ladder for {service}: {reason}")]
    InvalidTierLadder {
        /// Service whose ladder is malformed
        service: ServiceType,
        /// What the validation found
        reason: String,
    },

    /// Quantity exceeds every finite tier bound and no tier is open-ended
    #[error("quantity for {service} exceeds all tier bounds")]
    UnboundedQuantity {
        /// Service whose ladder cannot cover the quantity
        service: ServiceType,
    },

    /// Seat count violates the plan's seat range
    #[error("seat count {actual} outside plan range [{min}, {}]", .max.map_or_else(|| "unbounded".to_string(), |m| m.to_string()))]
    SeatCountOutOfRange {
        /// Seats in the usage fact
        actual: u32,
        /// Plan minimum
        min: u32,
        /// Plan maximum, if bounded
        max: Option<u32>,
    },

    /// Plan record violates its invariants
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Setting value does not match its declared type
    #[error("invalid billing setting {key}: {reason}")]
    InvalidSetting {
        /// Offending setting key
        key: String,
        /// What the parser expected
        reason: String,
    },

    /// Referenced plan is not in the catalog
    #[error("plan not found: {0}")]
    PlanNotFound(PlanId),
}

/// Billing engine facade: a shared pricing catalog plus the invoice
/// calculator.
pub struct BillingEngine {
    /// Pricing configuration store the admin console writes to
    pub catalog: Arc<PricingCatalog>,
}

impl BillingEngine {
    /// Create an engine with an empty catalog
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(PricingCatalog::new()),
        }
    }

    /// Create an engine around an existing catalog
    pub fn with_catalog(catalog: Arc<PricingCatalog>) -> Self {
        Self { catalog }
    }

    /// Compute the invoice for one organization and billing period
    pub fn compute_invoice(
        &self,
        plan_id: PlanId,
        account: &AccountState,
        usage: &UsageFact,
    ) -> Result<Invoice, ConfigurationError> {
        let config = self.catalog.snapshot(usage.organization_id, plan_id)?;
        invoice::compute_invoice(&config, account, usage)
    }
}

impl Default for BillingEngine {
    fn default() -> Self { Self::new() }
}
