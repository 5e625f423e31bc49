//! Account Lifecycle Policy
//!
//! Pure evaluation of the account's billing phase from global settings and
//! account timestamps. The engine never reads the wall clock; callers pass
//! the instant to evaluate at (the billing period's end), so a replayed run
//! always lands in the same phase.

use chrono::{DateTime, Duration, Utc};
use meridian_common::OrganizationId;
use serde::{Deserialize, Serialize};

use crate::settings::BillingSettings;

/// Billing phase of an account within a period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountPhase {
    /// Inside the trial window; nothing is charged
    Trial,
    /// Normal billing
    Active,
    /// Payment failed recently; billing continues while the account is
    /// given time to fix it
    Grace,
    /// Grace elapsed with auto-suspend on; charges are still computed for
    /// record-keeping, enforcement happens downstream
    Suspended,
    /// Terminal; zero-charge records only
    Cancelled,
}

impl AccountPhase {
    /// Whether charges are computed in this phase
    pub fn is_billable(&self) -> bool {
        matches!(self, Self::Active | Self::Grace | Self::Suspended)
    }
}

impl std::fmt::Display for AccountPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trial => write!(f, "trial"),
            Self::Active => write!(f, "active"),
            Self::Grace => write!(f, "grace"),
            Self::Suspended => write!(f, "suspended"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Account timestamps the lifecycle policy evaluates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    /// Organization the account belongs to
    pub organization_id: OrganizationId,
    /// When the account was created; starts the trial window
    pub created_at: DateTime<Utc>,
    /// Most recent payment failure, if any
    pub last_payment_failed_at: Option<DateTime<Utc>>,
    /// When the account was cancelled, if it was
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Evaluate the account's billing phase at an instant.
///
/// Cancellation is terminal and wins over everything; the trial window wins
/// over payment-failure states; a failure inside the grace window is
/// `Grace`; an elapsed grace window is `Suspended` only when auto-suspend
/// is switched on, otherwise billing simply continues.
pub fn account_phase(
    settings: &BillingSettings,
    account: &AccountState,
    as_of: DateTime<Utc>,
) -> AccountPhase {
    if account.cancelled_at.map_or(false, |t| t <= as_of) {
        return AccountPhase::Cancelled;
    }
    if as_of - account.created_at < Duration::days(i64::from(settings.trial_period_days)) {
        return AccountPhase::Trial;
    }
    if let Some(failed_at) = account.last_payment_failed_at {
        if as_of - failed_at < Duration::days(i64::from(settings.grace_period_days)) {
            return AccountPhase::Grace;
        }
        if settings.auto_suspend_on_failure {
            return AccountPhase::Suspended;
        }
    }
    AccountPhase::Active
}
