//! Invoice Calculation
//!
//! The engine's entry point: one call per organization per billing period,
//! combining the seat-based subscription charge with the per-service usage
//! charges into an itemized invoice. All-or-nothing: a configuration fault
//! aborts the whole invoice, never a partial one.

use meridian_common::{round_currency, OrganizationId, CURRENCY};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::{BillingCycle, PricingConfig, ServiceType};
use crate::lifecycle::{account_phase, AccountPhase, AccountState};
use crate::overrides::{override_rate, resolve_rate, RateCategory};
use crate::rating::rate_service;
use crate::ConfigurationError;

/// Aggregated usage for one organization and billing period
///
/// Produced by the metering side of the platform; the engine never counts
/// raw events itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageFact {
    /// Organization being billed
    pub organization_id: OrganizationId,
    /// Period start, inclusive
    pub period_start: DateTime<Utc>,
    /// Period end, exclusive; also the instant lifecycle is evaluated at
    pub period_end: DateTime<Utc>,
    /// Seats subscribed during the period
    pub seat_count: u32,
    /// Cycle the subscription bills on
    pub billing_cycle: BillingCycle,
    /// Total quantity consumed per metered service
    pub per_service: BTreeMap<ServiceType, Decimal>,
}

/// Invoice line item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Seat-based subscription charge
    Subscription,
    /// Metered service charge
    Usage,
    /// Trial-period marker, always zero
    Trial,
}

/// One line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    /// Human-readable description
    pub description: String,
    /// Quantity billed (seats or service units)
    pub quantity: Decimal,
    /// Per-unit rate, where a single rate applies
    pub unit_rate: Option<Decimal>,
    /// Charged amount, rounded to the currency's minor unit
    pub amount: Decimal,
    /// Line item kind
    pub item_type: ItemType,
}

/// Computed invoice for one organization and billing period
///
/// A pure derived value: identical configuration, account and usage inputs
/// produce an identical invoice, so billing runs can be replayed safely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Organization billed
    pub organization_id: OrganizationId,
    /// Period start
    pub period_start: DateTime<Utc>,
    /// Period end
    pub period_end: DateTime<Utc>,
    /// Lifecycle phase the account was in
    pub phase: AccountPhase,
    /// Signals downstream dunning that the account is in its grace window
    pub in_grace_period: bool,
    /// Signals downstream enforcement that the account should be suspended
    pub suspended: bool,
    /// Seat-based subscription charge
    pub subscription_charge: Decimal,
    /// Charge per metered service with nonzero consumption
    pub usage_charges: BTreeMap<ServiceType, Decimal>,
    /// Subscription charge plus the sum of usage charges
    pub total_charge: Decimal,
    /// Billing currency
    pub currency: String,
    /// Itemized charges
    pub line_items: Vec<InvoiceLineItem>,
}

impl Invoice {
    /// Export as pretty-printed JSON
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    fn no_charge(usage: &UsageFact, phase: AccountPhase, line_items: Vec<InvoiceLineItem>) -> Self {
        Self {
            organization_id: usage.organization_id,
            period_start: usage.period_start,
            period_end: usage.period_end,
            phase,
            in_grace_period: false,
            suspended: false,
            subscription_charge: Decimal::ZERO,
            usage_charges: BTreeMap::new(),
            total_charge: Decimal::ZERO,
            currency: CURRENCY.into(),
            line_items,
        }
    }
}

/// Compute the invoice for one organization and billing period.
///
/// Lifecycle first: trial and cancelled periods produce zero-charge records
/// without rating anything. Billable phases resolve the cycle's per-seat
/// rate (override, else plan rate with the annual discount where it
/// applies), validate the seat count against the plan's range, then rate
/// every service with nonzero consumption. Amounts are rounded once per
/// line, so the itemization always reconciles with the total.
pub fn compute_invoice(
    config: &PricingConfig,
    account: &AccountState,
    usage: &UsageFact,
) -> Result<Invoice, ConfigurationError> {
    config.validate()?;

    let phase = account_phase(&config.settings, account, usage.period_end);
    match phase {
        AccountPhase::Trial => {
            tracing::debug!(organization = %usage.organization_id, "account in trial, no charges");
            return Ok(Invoice::no_charge(
                usage,
                phase,
                vec![InvoiceLineItem {
                    description: "Trial period".into(),
                    quantity: Decimal::ONE,
                    unit_rate: None,
                    amount: Decimal::ZERO,
                    item_type: ItemType::Trial,
                }],
            ));
        }
        AccountPhase::Cancelled => {
            return Ok(Invoice::no_charge(usage, phase, Vec::new()));
        }
        _ => {}
    }

    let plan = &config.plan;
    if usage.seat_count < plan.min_seats
        || plan.max_seats.map_or(false, |max| usage.seat_count > max)
    {
        return Err(ConfigurationError::SeatCountOutOfRange {
            actual: usage.seat_count,
            min: plan.min_seats,
            max: plan.max_seats,
        });
    }

    let org_override = config.org_override.as_ref();
    let category = RateCategory::for_cycle(usage.billing_cycle);
    let base_rate = resolve_rate(category, plan, None, &config.settings, org_override)?;
    let effective_rate = match usage.billing_cycle {
        // A negotiated annual override is already the final rate; the
        // global discount applies only to the plan's own annual rate.
        BillingCycle::Annual if override_rate(org_override, category).is_none() => {
            base_rate * (Decimal::ONE_HUNDRED - config.settings.annual_discount_percent)
                / Decimal::ONE_HUNDRED
        }
        _ => base_rate,
    };

    let seats = Decimal::from(usage.seat_count);
    let subscription_charge = round_currency(effective_rate * seats);
    let mut line_items = vec![InvoiceLineItem {
        description: format!(
            "{} plan, {} seats ({})",
            plan.display_name, usage.seat_count, usage.billing_cycle
        ),
        quantity: seats,
        unit_rate: Some(effective_rate),
        amount: subscription_charge,
        item_type: ItemType::Subscription,
    }];

    let mut usage_charges = BTreeMap::new();
    let mut usage_total = Decimal::ZERO;
    for (&service, &quantity) in &usage.per_service {
        if quantity <= Decimal::ZERO {
            continue;
        }
        let pricing = config.pricing_for(service);
        let charge = round_currency(rate_service(
            service,
            quantity,
            pricing,
            config.ladder_for(service),
            &config.settings,
            org_override,
        )?);
        usage_charges.insert(service, charge);
        usage_total += charge;

        if charge > Decimal::ZERO {
            let unit = pricing.map(|p| p.unit.as_str()).unwrap_or("unit");
            line_items.push(InvoiceLineItem {
                description: format!("{} usage ({} {})", service, quantity, unit),
                quantity,
                unit_rate: None,
                amount: charge,
                item_type: ItemType::Usage,
            });
        }
    }

    Ok(Invoice {
        organization_id: usage.organization_id,
        period_start: usage.period_start,
        period_end: usage.period_end,
        phase,
        in_grace_period: phase == AccountPhase::Grace,
        suspended: phase == AccountPhase::Suspended,
        subscription_charge,
        usage_charges,
        total_charge: subscription_charge + usage_total,
        currency: CURRENCY.into(),
        line_items,
    })
}
