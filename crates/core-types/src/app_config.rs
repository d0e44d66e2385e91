use crate::employee::DEFAULT_ROSTER;
use crate::error::CoreError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// The `configuration.key_name` under which the live document is stored.
pub const APP_CONFIG_KEY: &str = "app_config";

/// The application configuration document edited from the settings screen.
///
/// Keys this server does not know about are carried in `extra` and written
/// back unchanged, so a newer browser client never loses settings on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Shift id → employees pre-filled into a new day.
    pub default_employees: BTreeMap<String, Vec<String>>,
    /// Pay tiers selected by the hours worked in a period.
    pub star_rates: Vec<StarRate>,
    pub weekend_rate: Decimal,
    /// Named bonus amounts (e.g. `target800`, `fuel`).
    pub bonuses: BTreeMap<String, Decimal>,
    pub prizes: Prizes,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// One star-rate tier: hours in `min..=max` are paid at `rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRate {
    pub min: Decimal,
    pub max: Decimal,
    pub rate: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl StarRate {
    pub fn new(min: Decimal, max: Decimal, rate: Decimal) -> Self {
        Self {
            min,
            max,
            rate,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prizes {
    pub first: Decimal,
    pub second: Decimal,
    pub third: Decimal,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl AppConfig {
    /// Rejects documents whose numbers cannot describe a pay scheme.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (index, tier) in self.star_rates.iter().enumerate() {
            if tier.min > tier.max {
                return Err(CoreError::invalid(
                    "starRates",
                    format!("tier {index} has min {} above max {}", tier.min, tier.max),
                ));
            }
            if tier.rate.is_sign_negative() {
                return Err(CoreError::invalid(
                    "starRates",
                    format!("tier {index} has a negative rate"),
                ));
            }
        }
        if self.weekend_rate.is_sign_negative() {
            return Err(CoreError::invalid("weekendRate", "must not be negative"));
        }
        if let Some((name, _)) = self.bonuses.iter().find(|(_, amount)| amount.is_sign_negative()) {
            return Err(CoreError::invalid(
                "bonuses",
                format!("'{name}' must not be negative"),
            ));
        }
        Ok(())
    }
}

/// The document seeded into an empty database.
impl Default for AppConfig {
    fn default() -> Self {
        let groups = ["morning", "afternoon", "evening", "night"];
        let default_employees = groups
            .iter()
            .zip(DEFAULT_ROSTER.chunks(2))
            .map(|(shift, names)| {
                (
                    shift.to_string(),
                    names.iter().map(|name| name.to_string()).collect(),
                )
            })
            .collect();

        Self {
            default_employees,
            star_rates: vec![
                StarRate::new(dec!(0), dec!(20), dec!(9)),
                StarRate::new(dec!(22), dec!(30), dec!(11)),
                StarRate::new(dec!(32), dec!(40), dec!(13.60)),
                StarRate::new(dec!(42), dec!(999999), dec!(14.60)),
            ],
            weekend_rate: dec!(14.60),
            bonuses: BTreeMap::from([
                ("target800".to_string(), dec!(1000)),
                ("attendance20".to_string(), dec!(1000)),
                ("fuel".to_string(), dec!(1000)),
            ]),
            prizes: Prizes {
                first: dec!(1250),
                second: dec!(750),
                third: dec!(500),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }
}
