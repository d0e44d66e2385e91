use crate::error::DbError;
use crate::store::{validate_day, ScheduleStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    normalize_employee_name, AppConfig, DateRange, DayShifts, Employee, MonthKey, ShiftEntry,
    ShiftMap, WeekendPriority, APP_CONFIG_KEY,
};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the PostgreSQL database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row fetched from the `shifts` table.
#[derive(Debug, Clone, FromRow)]
struct ShiftRow {
    date_key: String,
    shift_id: String,
    employees: Json<Vec<String>>,
    reason: String,
    stars: Json<BTreeMap<String, u32>>,
    late: Json<BTreeMap<String, bool>>,
    replacements: Json<BTreeMap<String, String>>,
    management_issue: bool,
}

impl ShiftRow {
    fn into_entry(self) -> (String, String, ShiftEntry) {
        let entry = ShiftEntry {
            employees: self.employees.0,
            reason: self.reason,
            stars: self.stars.0,
            late: self.late.0,
            replacements: self.replacements.0,
            management_issue: self.management_issue,
        };
        (self.date_key, self.shift_id, entry)
    }
}

/// A row fetched from the `weekend_priority` table.
#[derive(Debug, Clone, FromRow)]
struct WeekendPriorityRow {
    data: JsonValue,
    calculated_at: DateTime<Utc>,
}

/// Groups flat shift rows into `date → shift id → entry`.
fn group_rows(rows: Vec<ShiftRow>) -> ShiftMap {
    let mut shifts = ShiftMap::new();
    for row in rows {
        let (date_key, shift_id, entry) = row.into_entry();
        shifts.entry(date_key).or_default().insert(shift_id, entry);
    }
    shifts
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleStore for DbRepository {
    async fn get_shifts(&self, range: &DateRange) -> Result<ShiftMap, DbError> {
        let rows = sqlx::query_as::<_, ShiftRow>(
            r#"
            SELECT
                date_key,
                shift_id,
                COALESCE(employees, '[]'::jsonb) AS employees,
                COALESCE(reason, '') AS reason,
                COALESCE(stars, '{}'::jsonb) AS stars,
                COALESCE(late, '{}'::jsonb) AS late,
                COALESCE(replacements, '{}'::jsonb) AS replacements,
                COALESCE(management_issue, FALSE) AS management_issue
            FROM shifts
            WHERE ($1::text IS NULL OR date_key >= $1)
              AND ($2::text IS NULL OR date_key <= $2)
            ORDER BY date_key, shift_id
            "#,
        )
        .bind(range.start.as_deref())
        .bind(range.end.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rows(rows))
    }

    /// Replaces a day's shifts within a single transaction for atomicity.
    ///
    /// A transaction-scoped advisory lock on the date serializes concurrent
    /// saves of the same day, so two writers never interleave their rows.
    async fn save_shifts(&self, date: &str, shifts: &DayShifts) -> Result<(), DbError> {
        validate_day(date, shifts)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM shifts WHERE date_key = $1")
            .bind(date)
            .execute(&mut *tx)
            .await?;

        for (shift_id, entry) in shifts {
            sqlx::query(
                r#"
                INSERT INTO shifts (
                    date_key, shift_id, employees, reason, stars, late, replacements, management_issue
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(date)
            .bind(shift_id)
            .bind(Json(&entry.employees))
            .bind(&entry.reason)
            .bind(Json(&entry.stars))
            .bind(Json(&entry.late))
            .bind(Json(&entry.replacements))
            .bind(entry.management_issue)
            .execute(&mut *tx) // Note: must use the transaction object `tx` here
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(date, shifts = shifts.len(), "Saved shifts.");
        Ok(())
    }

    async fn get_employees(&self) -> Result<Vec<String>, DbError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"SELECT name FROM employees ORDER BY name COLLATE "C""#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn add_employee(&self, name: &str) -> Result<Employee, DbError> {
        let name = normalize_employee_name(name)?;

        let employee = sqlx::query_as::<_, Employee>(
            "INSERT INTO employees (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(name.clone())
            }
            other => other.into(),
        })?;

        Ok(employee)
    }

    async fn get_configuration(&self) -> Result<AppConfig, DbError> {
        let config = sqlx::query_scalar::<_, Json<AppConfig>>(
            "SELECT value FROM configuration WHERE key_name = $1",
        )
        .bind(APP_CONFIG_KEY)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(config.0)
    }

    async fn save_configuration(&self, config: &AppConfig) -> Result<(), DbError> {
        config.validate()?;

        sqlx::query(
            r#"
            INSERT INTO configuration (key_name, value)
            VALUES ($1, $2)
            ON CONFLICT (key_name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(APP_CONFIG_KEY)
        .bind(Json(config))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_weekend_priority(&self, period: MonthKey) -> Result<WeekendPriority, DbError> {
        let row = sqlx::query_as::<_, WeekendPriorityRow>(
            "SELECT data, calculated_at FROM weekend_priority WHERE year = $1 AND month = $2",
        )
        .bind(period.year)
        .bind(period.month as i32)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => WeekendPriority {
                data: row.data,
                month: period.month,
                year: period.year,
                calculated_at: Some(row.calculated_at),
            },
            None => WeekendPriority::empty(period),
        })
    }

    async fn save_weekend_priority(
        &self,
        period: MonthKey,
        data: &JsonValue,
    ) -> Result<WeekendPriority, DbError> {
        let calculated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO weekend_priority (year, month, data, calculated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (year, month) DO UPDATE SET data = EXCLUDED.data, calculated_at = EXCLUDED.calculated_at
            RETURNING calculated_at
            "#,
        )
        .bind(period.year)
        .bind(period.month as i32)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(WeekendPriority {
            data: data.clone(),
            month: period.month,
            year: period.year,
            calculated_at: Some(calculated_at),
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
