//! Tier Ladder Resolution
//!
//! Marginal (progressive) rating: each tier charges its own rate only for
//! the portion of quantity inside its band, so the charge is continuous
//! across tier boundaries and volume discounts never produce cliff-edge
//! jumps.

use rust_decimal::Decimal;

use crate::config::{PricingTier, ServiceType};
use crate::ConfigurationError;

/// Marginal charge for a quantity across a tier ladder.
///
/// The ladder must partition `[0, ∞)`; malformed ladders and negative
/// quantities are configuration faults. Returns an unrounded, non-negative
/// amount — rounding happens once, at invoice assembly.
pub fn charge_for_quantity(
    service: ServiceType,
    quantity: Decimal,
    tiers: &[PricingTier],
) -> Result<Decimal, ConfigurationError> {
    if quantity < Decimal::ZERO {
        return Err(invalid(service, "negative quantity"));
    }
    let ladder = validate_ladder(service, tiers)?;

    let mut charge = Decimal::ZERO;
    for tier in &ladder {
        match tier.max_quantity {
            Some(max) => {
                let band = quantity.min(max) - tier.min_quantity;
                if band > Decimal::ZERO {
                    charge += band * tier.rate_per_unit;
                }
                if quantity <= max {
                    return Ok(charge);
                }
            }
            None => {
                let band = quantity - tier.min_quantity;
                if band > Decimal::ZERO {
                    charge += band * tier.rate_per_unit;
                }
                return Ok(charge);
            }
        }
    }

    // Every tier is finite and the quantity exceeds the last bound.
    Err(ConfigurationError::UnboundedQuantity { service })
}

/// Check the ladder partitions `[0, ∞)` and return it sorted by band start.
fn validate_ladder<'a>(
    service: ServiceType,
    tiers: &'a [PricingTier],
) -> Result<Vec<&'a PricingTier>, ConfigurationError> {
    if tiers.is_empty() {
        return Err(invalid(service, "empty tier ladder"));
    }

    let mut ladder: Vec<&PricingTier> = tiers.iter().collect();
    ladder.sort_by(|a, b| a.min_quantity.cmp(&b.min_quantity));

    if ladder[0].min_quantity != Decimal::ZERO {
        return Err(invalid(service, "first tier must start at zero"));
    }
    for pair in ladder.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        match current.max_quantity {
            None => return Err(invalid(service, "open-ended tier must be last")),
            Some(max) if max <= current.min_quantity => {
                return Err(invalid(service, "tier band is empty"))
            }
            Some(max) if max < next.min_quantity => {
                return Err(invalid(service, "gap between tiers"))
            }
            Some(max) if max > next.min_quantity => {
                return Err(invalid(service, "overlapping tiers"))
            }
            Some(_) => {}
        }
    }
    if let Some(last) = ladder.last() {
        if let Some(max) = last.max_quantity {
            if max <= last.min_quantity {
                return Err(invalid(service, "tier band is empty"));
            }
        }
    }
    if ladder.iter().any(|t| t.rate_per_unit < Decimal::ZERO) {
        return Err(invalid(service, "negative rate"));
    }

    Ok(ladder)
}

fn invalid(service: ServiceType, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidTierLadder {
        service,
        reason: reason.into(),
    }
}
