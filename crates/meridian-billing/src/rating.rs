//! Per-Service Usage Rating
//!
//! Rates one metered service for a billing period: free-tier allowance
//! first, then either the organization's override rate (tiers bypassed
//! entirely), the service's tier ladder, or its flat base rate.

use rust_decimal::Decimal;

use crate::config::{OrganizationOverride, PricingModel, PricingTier, ServiceType, UsagePricing};
use crate::overrides::{override_rate, RateCategory};
use crate::settings::BillingSettings;
use crate::tiers::charge_for_quantity;
use crate::ConfigurationError;

/// Charge for one service's consumption over a billing period.
///
/// The free tier is consumed before any rating and is never prorated. An
/// override is a complete rate substitution: the remainder is charged flat
/// at the override rate no matter how the service is otherwise priced.
/// Returns an unrounded amount; rounding happens at invoice assembly.
pub fn rate_service(
    service: ServiceType,
    quantity: Decimal,
    pricing: Option<&UsagePricing>,
    tiers: &[PricingTier],
    settings: &BillingSettings,
    org_override: Option<&OrganizationOverride>,
) -> Result<Decimal, ConfigurationError> {
    if let Some(p) = pricing {
        if !p.is_active {
            tracing::debug!(service = %service, "usage pricing disabled, service not billed");
            return Ok(Decimal::ZERO);
        }
    }

    let free_allowance = pricing.map(|p| p.free_tier_amount).unwrap_or(Decimal::ZERO);
    let billable = (quantity - free_allowance).max(Decimal::ZERO);
    if billable.is_zero() {
        return Ok(Decimal::ZERO);
    }

    if let Some(rate) = override_rate(org_override, RateCategory::for_service(service)) {
        return Ok(billable * rate);
    }

    match pricing {
        Some(p) if p.pricing_model == PricingModel::Tiered => {
            if tiers.is_empty() {
                tracing::warn!(
                    service = %service,
                    "tiered pricing with no tiers configured, falling back to base rate"
                );
                Ok(billable * p.base_rate)
            } else {
                charge_for_quantity(service, billable, tiers)
            }
        }
        Some(p) => Ok(billable * p.base_rate),
        None => {
            let rate = settings
                .default_rate(service)
                .ok_or(ConfigurationError::MissingRate {
                    category: RateCategory::for_service(service),
                })?;
            Ok(billable * rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sms_pricing(model: PricingModel, free: Decimal) -> UsagePricing {
        UsagePricing {
            id: Uuid::new_v4(),
            service: ServiceType::Sms,
            pricing_model: model,
            base_rate: dec!(0.01),
            unit: "message".into(),
            free_tier_amount: free,
            is_active: true,
        }
    }

    fn tier(min: Decimal, max: Option<Decimal>, rate: Decimal) -> PricingTier {
        PricingTier {
            id: Uuid::new_v4(),
            usage_pricing_id: Uuid::new_v4(),
            tier_name: format!("from {}", min),
            min_quantity: min,
            max_quantity: max,
            rate_per_unit: rate,
        }
    }

    fn sms_ladder() -> Vec<PricingTier> {
        vec![
            tier(dec!(0), Some(dec!(1000)), dec!(0.01)),
            tier(dec!(1000), None, dec!(0.005)),
        ]
    }

    fn sms_override(rate: Decimal) -> OrganizationOverride {
        OrganizationOverride {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            plan_id: None,
            custom_monthly_rate: None,
            custom_annual_rate: None,
            custom_sms_rate: Some(rate),
            custom_ai_rate: None,
            custom_storage_rate: None,
            notes: None,
        }
    }

    #[test]
    fn test_tiered_rating_after_free_tier() {
        // 1500 consumed, 100 free: 1000 at 0.01 + 400 at 0.005
        let pricing = sms_pricing(PricingModel::Tiered, dec!(100));
        let charge = rate_service(
            ServiceType::Sms,
            dec!(1500),
            Some(&pricing),
            &sms_ladder(),
            &BillingSettings::default(),
            None,
        )
        .unwrap();
        assert_eq!(charge, dec!(12.00));
    }

    #[test]
    fn test_consumption_within_free_tier_is_free() {
        let pricing = sms_pricing(PricingModel::Tiered, dec!(100));
        let charge = rate_service(
            ServiceType::Sms,
            dec!(80),
            Some(&pricing),
            &sms_ladder(),
            &BillingSettings::default(),
            None,
        )
        .unwrap();
        assert_eq!(charge, Decimal::ZERO);
    }

    #[test]
    fn test_override_bypasses_tiers() {
        // 1400 billable at the 0.02 override, ladder ignored
        let pricing = sms_pricing(PricingModel::Tiered, dec!(100));
        let ovr = sms_override(dec!(0.02));
        let charge = rate_service(
            ServiceType::Sms,
            dec!(1500),
            Some(&pricing),
            &sms_ladder(),
            &BillingSettings::default(),
            Some(&ovr),
        )
        .unwrap();
        assert_eq!(charge, dec!(28.00));
    }

    #[test]
    fn test_override_charge_is_independent_of_ladder() {
        let pricing = sms_pricing(PricingModel::Tiered, dec!(100));
        let ovr = sms_override(dec!(0.02));
        let steep_ladder = vec![tier(dec!(0), None, dec!(99))];
        let with_normal = rate_service(
            ServiceType::Sms,
            dec!(1500),
            Some(&pricing),
            &sms_ladder(),
            &BillingSettings::default(),
            Some(&ovr),
        )
        .unwrap();
        let with_steep = rate_service(
            ServiceType::Sms,
            dec!(1500),
            Some(&pricing),
            &steep_ladder,
            &BillingSettings::default(),
            Some(&ovr),
        )
        .unwrap();
        assert_eq!(with_normal, with_steep);
    }

    #[test]
    fn test_flat_rating() {
        let pricing = sms_pricing(PricingModel::Flat, dec!(0));
        let charge = rate_service(
            ServiceType::Sms,
            dec!(250),
            Some(&pricing),
            &[],
            &BillingSettings::default(),
            None,
        )
        .unwrap();
        assert_eq!(charge, dec!(2.50));
    }

    #[test]
    fn test_inactive_service_is_not_billed() {
        let mut pricing = sms_pricing(PricingModel::Flat, dec!(0));
        pricing.is_active = false;
        let charge = rate_service(
            ServiceType::Sms,
            dec!(10_000),
            Some(&pricing),
            &[],
            &BillingSettings::default(),
            None,
        )
        .unwrap();
        assert_eq!(charge, Decimal::ZERO);
    }

    #[test]
    fn test_tiered_with_empty_ladder_falls_back_to_base_rate() {
        let pricing = sms_pricing(PricingModel::Tiered, dec!(0));
        let charge = rate_service(
            ServiceType::Sms,
            dec!(200),
            Some(&pricing),
            &[],
            &BillingSettings::default(),
            None,
        )
        .unwrap();
        assert_eq!(charge, dec!(2.00));
    }

    #[test]
    fn test_unconfigured_service_uses_settings_default() {
        let mut settings = BillingSettings::default();
        settings
            .default_service_rates
            .insert(ServiceType::Ai, dec!(0.002));
        let charge =
            rate_service(ServiceType::Ai, dec!(1000), None, &[], &settings, None).unwrap();
        assert_eq!(charge, dec!(2.00));
    }

    #[test]
    fn test_unconfigured_service_without_default_is_an_error() {
        let result = rate_service(
            ServiceType::Ai,
            dec!(1000),
            None,
            &[],
            &BillingSettings::default(),
            None,
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingRate {
                category: RateCategory::Ai
            })
        ));
    }
}
