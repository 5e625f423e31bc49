//! Meridian Common - shared primitives for the Meridian Suite
//!
//! This crate provides the small set of types every Meridian service agrees
//! on:
//! - Entity id aliases
//! - Money rounding rules for customer-facing amounts

#![warn(missing_docs)]

pub mod money;

pub use money::{round_currency, CURRENCY, MINOR_UNIT_SCALE};

use uuid::Uuid;

/// Identifier of a customer organization
pub type OrganizationId = Uuid;

/// Identifier of a subscription plan
pub type PlanId = Uuid;

/// Identifier of a usage-pricing definition
pub type UsagePricingId = Uuid;
