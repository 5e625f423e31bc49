//! Pricing Catalog
//!
//! The admin console's write model: plans, per-service usage pricing, tier
//! ladders, organization overrides and global settings. The engine never
//! reads the catalog mid-computation — it takes a consistent snapshot per
//! billing run, so a concurrent admin edit can never bleed into an
//! in-flight invoice.

use std::collections::{BTreeMap, HashMap};

use meridian_common::{OrganizationId, PlanId, UsagePricingId};
use parking_lot::RwLock;

use crate::config::{
    OrganizationOverride, Plan, PricingConfig, PricingTier, ServiceType, UsagePricing,
};
use crate::settings::BillingSettings;
use crate::ConfigurationError;

/// Mutable pricing configuration store
pub struct PricingCatalog {
    plans: RwLock<HashMap<PlanId, Plan>>,
    usage_pricing: RwLock<BTreeMap<ServiceType, UsagePricing>>,
    tiers: RwLock<HashMap<UsagePricingId, Vec<PricingTier>>>,
    overrides: RwLock<HashMap<OrganizationId, OrganizationOverride>>,
    settings: RwLock<BillingSettings>,
}

impl PricingCatalog {
    /// Create an empty catalog with default settings
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
            usage_pricing: RwLock::new(BTreeMap::new()),
            tiers: RwLock::new(HashMap::new()),
            overrides: RwLock::new(HashMap::new()),
            settings: RwLock::new(BillingSettings::default()),
        }
    }

    /// Create or replace a plan
    pub fn upsert_plan(&self, plan: Plan) {
        tracing::debug!(plan = %plan.name, "plan upserted");
        self.plans.write().insert(plan.id, plan);
    }

    /// Get a plan by id
    pub fn plan(&self, id: PlanId) -> Option<Plan> {
        self.plans.read().get(&id).cloned()
    }

    /// Plans currently offered to new subscriptions.
    ///
    /// Inactive plans stay in the catalog so existing subscriptions keep
    /// billing against them.
    pub fn assignable_plans(&self) -> Vec<Plan> {
        self.plans
            .read()
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect()
    }

    /// Create or replace the usage pricing for a service
    pub fn set_usage_pricing(&self, pricing: UsagePricing) {
        tracing::debug!(service = %pricing.service, "usage pricing updated");
        self.usage_pricing.write().insert(pricing.service, pricing);
    }

    /// Replace the tier ladder for a usage-pricing record
    pub fn set_tiers(&self, usage_pricing_id: UsagePricingId, ladder: Vec<PricingTier>) {
        self.tiers.write().insert(usage_pricing_id, ladder);
    }

    /// Create or replace an organization's pricing override
    pub fn set_override(&self, org_override: OrganizationOverride) {
        tracing::debug!(
            organization = %org_override.organization_id,
            "pricing override updated"
        );
        self.overrides
            .write()
            .insert(org_override.organization_id, org_override);
    }

    /// Remove an organization's pricing override
    pub fn remove_override(
        &self,
        organization_id: &OrganizationId,
    ) -> Option<OrganizationOverride> {
        self.overrides.write().remove(organization_id)
    }

    /// Replace the global billing settings
    pub fn update_settings(&self, settings: BillingSettings) {
        *self.settings.write() = settings;
    }

    /// Consistent pricing snapshot for one organization and plan.
    ///
    /// Everything is deep-copied; later catalog writes never change an
    /// already-taken snapshot. Ladders come out sorted by band start.
    pub fn snapshot(
        &self,
        organization_id: OrganizationId,
        plan_id: PlanId,
    ) -> Result<PricingConfig, ConfigurationError> {
        let plan = self
            .plans
            .read()
            .get(&plan_id)
            .cloned()
            .ok_or(ConfigurationError::PlanNotFound(plan_id))?;

        let usage_pricing = self.usage_pricing.read().clone();
        let tier_map = self.tiers.read();
        let mut tiers = BTreeMap::new();
        for (service, pricing) in &usage_pricing {
            if let Some(ladder) = tier_map.get(&pricing.id) {
                let mut ladder = ladder.clone();
                ladder.sort_by(|a, b| a.min_quantity.cmp(&b.min_quantity));
                tiers.insert(*service, ladder);
            }
        }

        Ok(PricingConfig {
            plan,
            usage_pricing,
            tiers,
            settings: self.settings.read().clone(),
            org_override: self.overrides.read().get(&organization_id).cloned(),
        })
    }
}

impl Default for PricingCatalog {
    fn default() -> Self { Self::new() }
}
