//! Global Billing Settings
//!
//! The admin console stores its global knobs as flat key/value rows typed by
//! `data_type`. The engine loads them once per billing run into an immutable
//! struct with named, typed fields; string keys never reach a rating code
//! path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ServiceType;
use crate::ConfigurationError;

/// Value type declared on a setting row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    /// Whole number
    Integer,
    /// Fixed-point decimal
    Decimal,
    /// true/false
    Boolean,
    /// Free-form text
    Text,
}

/// One row of the admin console's settings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Setting key, e.g. `trial_period_days`
    pub key: String,
    /// Raw stored value
    pub value: String,
    /// Declared value type
    pub data_type: SettingType,
}

/// Global billing knobs, loaded once per billing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingSettings {
    /// Days after account creation with no charges
    pub trial_period_days: u32,
    /// Days after a payment failure before suspension is considered
    pub grace_period_days: u32,
    /// Percentage discount applied to the plan's annual per-seat rate
    pub annual_discount_percent: Decimal,
    /// Whether accounts suspend once the grace period elapses
    pub auto_suspend_on_failure: bool,
    /// Last-resort flat rates for services with no usage-pricing record
    pub default_service_rates: BTreeMap<ServiceType, Decimal>,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            trial_period_days: 14,
            grace_period_days: 7,
            annual_discount_percent: Decimal::ZERO,
            auto_suspend_on_failure: false,
            default_service_rates: BTreeMap::new(),
        }
    }
}

impl BillingSettings {
    /// Load typed settings from the flat key/value store.
    ///
    /// Unknown keys are logged and ignored so newer console versions can add
    /// settings without breaking older billing jobs. A value that does not
    /// match its declared type is a configuration fault.
    pub fn from_entries(entries: &[SettingEntry]) -> Result<Self, ConfigurationError> {
        let mut settings = Self::default();
        for entry in entries {
            match entry.key.as_str() {
                "trial_period_days" => settings.trial_period_days = parse_integer(entry)?,
                "grace_period_days" => settings.grace_period_days = parse_integer(entry)?,
                "annual_discount_percent" => {
                    settings.annual_discount_percent = parse_decimal(entry)?
                }
                "auto_suspend_on_failure" => {
                    settings.auto_suspend_on_failure = parse_boolean(entry)?
                }
                "default_sms_rate" => {
                    settings
                        .default_service_rates
                        .insert(ServiceType::Sms, parse_decimal(entry)?);
                }
                "default_ai_rate" => {
                    settings
                        .default_service_rates
                        .insert(ServiceType::Ai, parse_decimal(entry)?);
                }
                "default_storage_rate" => {
                    settings
                        .default_service_rates
                        .insert(ServiceType::Storage, parse_decimal(entry)?);
                }
                other => {
                    tracing::warn!(key = other, "ignoring unknown billing setting");
                }
            }
        }
        Ok(settings)
    }

    /// Last-resort flat rate for a service, if configured
    pub fn default_rate(&self, service: ServiceType) -> Option<Decimal> {
        self.default_service_rates.get(&service).copied()
    }
}

fn invalid(entry: &SettingEntry, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidSetting {
        key: entry.key.clone(),
        reason: reason.into(),
    }
}

fn parse_integer(entry: &SettingEntry) -> Result<u32, ConfigurationError> {
    if entry.data_type != SettingType::Integer {
        return Err(invalid(entry, "declared type is not integer"));
    }
    entry
        .value
        .trim()
        .parse()
        .map_err(|_| invalid(entry, "expected a whole number"))
}

fn parse_decimal(entry: &SettingEntry) -> Result<Decimal, ConfigurationError> {
    if entry.data_type != SettingType::Decimal {
        return Err(invalid(entry, "declared type is not decimal"));
    }
    entry
        .value
        .trim()
        .parse()
        .map_err(|_| invalid(entry, "expected a decimal number"))
}

fn parse_boolean(entry: &SettingEntry) -> Result<bool, ConfigurationError> {
    if entry.data_type != SettingType::Boolean {
        return Err(invalid(entry, "declared type is not boolean"));
    }
    match entry.value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(invalid(entry, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(key: &str, value: &str, data_type: SettingType) -> SettingEntry {
        SettingEntry {
            key: key.into(),
            value: value.into(),
            data_type,
        }
    }

    #[test]
    fn test_defaults() {
        let settings = BillingSettings::default();
        assert_eq!(settings.trial_period_days, 14);
        assert_eq!(settings.grace_period_days, 7);
        assert_eq!(settings.annual_discount_percent, Decimal::ZERO);
        assert!(!settings.auto_suspend_on_failure);
        assert!(settings.default_service_rates.is_empty());
    }

    #[test]
    fn test_from_entries() {
        let settings = BillingSettings::from_entries(&[
            entry("trial_period_days", "30", SettingType::Integer),
            entry("grace_period_days", "10", SettingType::Integer),
            entry("annual_discount_percent", "12.5", SettingType::Decimal),
            entry("auto_suspend_on_failure", "true", SettingType::Boolean),
            entry("default_sms_rate", "0.015", SettingType::Decimal),
        ])
        .unwrap();

        assert_eq!(settings.trial_period_days, 30);
        assert_eq!(settings.grace_period_days, 10);
        assert_eq!(settings.annual_discount_percent, dec!(12.5));
        assert!(settings.auto_suspend_on_failure);
        assert_eq!(settings.default_rate(ServiceType::Sms), Some(dec!(0.015)));
        assert_eq!(settings.default_rate(ServiceType::Ai), None);
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        let result =
            BillingSettings::from_entries(&[entry("trial_period_days", "soon", SettingType::Integer)]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidSetting { key, .. }) if key == "trial_period_days"
        ));
    }

    #[test]
    fn test_declared_type_mismatch_is_rejected() {
        let result =
            BillingSettings::from_entries(&[entry("annual_discount_percent", "10", SettingType::Text)]);
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let settings =
            BillingSettings::from_entries(&[entry("smtp_banner", "hello", SettingType::Text)])
                .unwrap();
        assert_eq!(settings, BillingSettings::default());
    }
}
