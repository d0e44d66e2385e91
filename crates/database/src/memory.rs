use crate::error::DbError;
use crate::store::{validate_day, ScheduleStore};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{
    normalize_employee_name, AppConfig, DateRange, DayShifts, Employee, MonthKey, ShiftMap,
    WeekendPriority, DEFAULT_ROSTER,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// A `ScheduleStore` that lives entirely in process memory.
///
/// It follows the same contract as `DbRepository` (including validation and
/// duplicate detection), which makes it a drop-in backend for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    shifts: ShiftMap,
    /// name → id
    employees: BTreeMap<String, i32>,
    next_employee_id: i32,
    configuration: Option<AppConfig>,
    weekend_priority: BTreeMap<MonthKey, WeekendPriority>,
}

impl MemoryStore {
    /// An empty store, as if the database had never been initialized.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the same seed data as a freshly initialized database.
    pub fn seeded() -> Self {
        let mut state = MemoryState::default();
        for name in DEFAULT_ROSTER {
            state.insert_employee(name.to_string());
        }
        state.configuration = Some(AppConfig::default());
        Self {
            state: RwLock::new(state),
        }
    }
}

impl MemoryState {
    fn insert_employee(&mut self, name: String) -> Employee {
        self.next_employee_id += 1;
        let id = self.next_employee_id;
        self.employees.insert(name.clone(), id);
        Employee { id, name }
    }
}

#[async_trait]
impl ScheduleStore for MemoryStore {
    async fn get_shifts(&self, range: &DateRange) -> Result<ShiftMap, DbError> {
        let state = self.state.read().await;
        Ok(state
            .shifts
            .iter()
            .filter(|(date_key, _)| range.contains(date_key))
            .map(|(date_key, day)| (date_key.clone(), day.clone()))
            .collect())
    }

    async fn save_shifts(&self, date: &str, shifts: &DayShifts) -> Result<(), DbError> {
        validate_day(date, shifts)?;

        let mut state = self.state.write().await;
        if shifts.is_empty() {
            state.shifts.remove(date);
        } else {
            state.shifts.insert(date.to_string(), shifts.clone());
        }
        Ok(())
    }

    async fn get_employees(&self) -> Result<Vec<String>, DbError> {
        let state = self.state.read().await;
        Ok(state.employees.keys().cloned().collect())
    }

    async fn add_employee(&self, name: &str) -> Result<Employee, DbError> {
        let name = normalize_employee_name(name)?;

        let mut state = self.state.write().await;
        if state.employees.contains_key(&name) {
            return Err(DbError::Duplicate(name));
        }
        Ok(state.insert_employee(name))
    }

    async fn get_configuration(&self) -> Result<AppConfig, DbError> {
        let state = self.state.read().await;
        state.configuration.clone().ok_or(DbError::NotFound)
    }

    async fn save_configuration(&self, config: &AppConfig) -> Result<(), DbError> {
        config.validate()?;

        let mut state = self.state.write().await;
        state.configuration = Some(config.clone());
        Ok(())
    }

    async fn get_weekend_priority(&self, period: MonthKey) -> Result<WeekendPriority, DbError> {
        let state = self.state.read().await;
        Ok(state
            .weekend_priority
            .get(&period)
            .cloned()
            .unwrap_or_else(|| WeekendPriority::empty(period)))
    }

    async fn save_weekend_priority(
        &self,
        period: MonthKey,
        data: &JsonValue,
    ) -> Result<WeekendPriority, DbError> {
        let snapshot = WeekendPriority {
            data: data.clone(),
            month: period.month,
            year: period.year,
            calculated_at: Some(Utc::now()),
        };

        let mut state = self.state.write().await;
        state.weekend_priority.insert(period, snapshot.clone());
        Ok(snapshot)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::ShiftEntry;
    use serde_json::json;

    fn day(shift_id: &str, employees: &[&str]) -> DayShifts {
        DayShifts::from([(
            shift_id.to_string(),
            ShiftEntry {
                employees: employees.iter().map(|name| name.to_string()).collect(),
                ..Default::default()
            },
        )])
    }

    #[tokio::test]
    async fn saving_a_day_replaces_every_shift_of_that_day() {
        let store = MemoryStore::new();
        let mut first = day("morning", &["A"]);
        first.extend(day("night", &["B"]));
        store.save_shifts("2024-06-01", &first).await.unwrap();

        let second = day("evening", &["C"]);
        store.save_shifts("2024-06-01", &second).await.unwrap();

        let shifts = store.get_shifts(&DateRange::default()).await.unwrap();
        assert_eq!(shifts["2024-06-01"], second);
    }

    #[tokio::test]
    async fn saving_an_empty_day_clears_it() {
        let store = MemoryStore::new();
        store
            .save_shifts("2024-06-01", &day("morning", &["A"]))
            .await
            .unwrap();
        store.save_shifts("2024-06-01", &DayShifts::new()).await.unwrap();

        let shifts = store.get_shifts(&DateRange::default()).await.unwrap();
        assert!(shifts.is_empty());
    }

    #[tokio::test]
    async fn invalid_day_is_rejected_without_changes() {
        let store = MemoryStore::new();
        let result = store.save_shifts("June 1st", &day("morning", &["A"])).await;
        assert!(matches!(result, Err(DbError::Invalid(_))));

        let result = store.save_shifts("2024-06-01", &day("", &["A"])).await;
        assert!(matches!(result, Err(DbError::Invalid(_))));

        assert!(store.get_shifts(&DateRange::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_filter_is_inclusive() {
        let store = MemoryStore::new();
        for date in ["2024-05-31", "2024-06-01", "2024-06-30", "2024-07-01"] {
            store.save_shifts(date, &day("morning", &["A"])).await.unwrap();
        }

        let range = DateRange::new(Some("2024-06-01".into()), Some("2024-06-30".into()));
        let shifts = store.get_shifts(&range).await.unwrap();
        let dates: Vec<_> = shifts.keys().map(String::as_str).collect();
        assert_eq!(dates, vec!["2024-06-01", "2024-06-30"]);
    }

    #[tokio::test]
    async fn duplicate_employee_leaves_roster_unchanged() {
        let store = MemoryStore::seeded();
        let before = store.get_employees().await.unwrap();

        let result = store.add_employee("  Guru ").await;
        assert!(matches!(result, Err(DbError::Duplicate(name)) if name == "Guru"));
        assert_eq!(store.get_employees().await.unwrap(), before);
    }

    #[tokio::test]
    async fn employees_are_listed_in_order_with_fresh_ids() {
        let store = MemoryStore::seeded();
        let added = store.add_employee("Aarav").await.unwrap();
        assert_eq!(added.id, DEFAULT_ROSTER.len() as i32 + 1);

        let names = store.get_employees().await.unwrap();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Aarav".to_string()));
    }

    #[tokio::test]
    async fn unseeded_configuration_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_configuration().await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn weekend_priority_round_trips_with_timestamp() {
        let store = MemoryStore::new();
        let period = MonthKey::new(2024, 6).unwrap();

        let empty = store.get_weekend_priority(period).await.unwrap();
        assert_eq!(empty, WeekendPriority::empty(period));

        let data = json!([{ "name": "A", "score": 3 }]);
        store.save_weekend_priority(period, &data).await.unwrap();

        let saved = store.get_weekend_priority(period).await.unwrap();
        assert_eq!(saved.data, data);
        assert!(saved.calculated_at.is_some());
    }
}
