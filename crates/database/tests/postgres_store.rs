//! `DbRepository` against a real PostgreSQL server.
//!
//! Each test gets a fresh database with the migrations applied. They need a
//! server to talk to, so they are ignored by default; run them with
//! `DATABASE_URL=postgres://... cargo test -p database -- --ignored`.

use core_types::{AppConfig, DateRange, DayShifts, MonthKey, ShiftEntry, WeekendPriority};
use database::{seed_defaults, DbError, DbRepository, ScheduleStore};
use serde_json::json;
use sqlx::PgPool;
use std::collections::BTreeMap;

fn entry(employees: &[&str]) -> ShiftEntry {
    ShiftEntry {
        employees: employees.iter().map(|name| name.to_string()).collect(),
        ..Default::default()
    }
}

fn day(shifts: &[(&str, &[&str])]) -> DayShifts {
    shifts
        .iter()
        .map(|(shift_id, employees)| (shift_id.to_string(), entry(employees)))
        .collect()
}

async fn fetch_day(repo: &DbRepository, date: &str) -> Option<DayShifts> {
    let range = DateRange::new(Some(date.to_string()), Some(date.to_string()));
    repo.get_shifts(&range).await.unwrap().remove(date)
}

// =============================================================================
// Shifts
// =============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn saved_day_round_trips_every_field(pool: PgPool) {
    let repo = DbRepository::new(pool);
    let shifts = DayShifts::from([(
        "morning".to_string(),
        ShiftEntry {
            employees: vec!["Guru".to_string(), "Kalyan".to_string()],
            reason: "sick cover".to_string(),
            stars: BTreeMap::from([("Guru".to_string(), 3)]),
            late: BTreeMap::from([("Kalyan".to_string(), true)]),
            replacements: BTreeMap::from([("Nawaz".to_string(), "Kalyan".to_string())]),
            management_issue: true,
        },
    )]);

    repo.save_shifts("2024-06-01", &shifts).await.unwrap();

    assert_eq!(fetch_day(&repo, "2024-06-01").await, Some(shifts));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn saving_a_day_replaces_all_of_its_rows(pool: PgPool) {
    let repo = DbRepository::new(pool);
    repo.save_shifts("2024-06-01", &day(&[("morning", &["A"]), ("night", &["B"])]))
        .await
        .unwrap();
    repo.save_shifts("2024-06-02", &day(&[("morning", &["Z"])]))
        .await
        .unwrap();

    let replacement = day(&[("evening", &["C"])]);
    repo.save_shifts("2024-06-01", &replacement).await.unwrap();

    assert_eq!(fetch_day(&repo, "2024-06-01").await, Some(replacement));
    assert_eq!(
        fetch_day(&repo, "2024-06-02").await,
        Some(day(&[("morning", &["Z"])]))
    );

    repo.save_shifts("2024-06-01", &DayShifts::new()).await.unwrap();
    assert_eq!(fetch_day(&repo, "2024-06-01").await, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn concurrent_saves_of_one_day_never_interleave(pool: PgPool) {
    let repo = DbRepository::new(pool);
    let first = day(&[("morning", &["A"]), ("afternoon", &["A"])]);
    let second = day(&[("evening", &["B"]), ("night", &["B"])]);

    let (a, b) = tokio::join!(
        repo.save_shifts("2024-06-01", &first),
        repo.save_shifts("2024-06-01", &second)
    );
    a.unwrap();
    b.unwrap();

    let stored = fetch_day(&repo, "2024-06-01").await.unwrap();
    assert!(stored == first || stored == second, "mixed rows: {stored:?}");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn range_bounds_are_inclusive_and_optional(pool: PgPool) {
    let repo = DbRepository::new(pool);
    for date in ["2024-05-31", "2024-06-01", "2024-06-30", "2024-07-01"] {
        repo.save_shifts(date, &day(&[("morning", &["A"])]))
            .await
            .unwrap();
    }

    let june = DateRange::new(Some("2024-06-01".into()), Some("2024-06-30".into()));
    let dates: Vec<_> = repo.get_shifts(&june).await.unwrap().into_keys().collect();
    assert_eq!(dates, vec!["2024-06-01", "2024-06-30"]);

    let from_june = DateRange::new(Some("2024-06-01".into()), None);
    assert_eq!(repo.get_shifts(&from_june).await.unwrap().len(), 3);

    assert_eq!(repo.get_shifts(&DateRange::default()).await.unwrap().len(), 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn rows_written_with_column_defaults_read_back_empty(pool: PgPool) {
    sqlx::query("INSERT INTO shifts (date_key, shift_id) VALUES ('2024-06-01', 'night')")
        .execute(&pool)
        .await
        .unwrap();
    let repo = DbRepository::new(pool);

    let stored = fetch_day(&repo, "2024-06-01").await.unwrap();
    assert_eq!(stored["night"], ShiftEntry::default());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn invalid_day_is_rejected_before_touching_rows(pool: PgPool) {
    let repo = DbRepository::new(pool);
    repo.save_shifts("2024-06-01", &day(&[("morning", &["A"])]))
        .await
        .unwrap();

    let result = repo.save_shifts("2024-06-01", &day(&[("", &["B"])])).await;
    assert!(matches!(result, Err(DbError::Invalid(_))));
    assert_eq!(
        fetch_day(&repo, "2024-06-01").await,
        Some(day(&[("morning", &["A"])]))
    );
}

// =============================================================================
// Employees
// =============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn duplicate_employee_is_reported_and_roster_unchanged(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    let repo = DbRepository::new(pool);
    let before = repo.get_employees().await.unwrap();

    let result = repo.add_employee("  Guru ").await;
    assert!(matches!(result, Err(DbError::Duplicate(name)) if name == "Guru"));
    assert_eq!(repo.get_employees().await.unwrap(), before);

    let added = repo.add_employee(" Asha ").await.unwrap();
    assert_eq!(added.name, "Asha");
    assert!(added.id > 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn employees_are_listed_in_byte_order(pool: PgPool) {
    let repo = DbRepository::new(pool);
    for name in ["beta", "Alpha", "alpha", "Zed"] {
        repo.add_employee(name).await.unwrap();
    }

    assert_eq!(
        repo.get_employees().await.unwrap(),
        vec!["Alpha", "Zed", "alpha", "beta"]
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn configuration_is_missing_until_seeded(pool: PgPool) {
    let repo = DbRepository::new(pool.clone());
    assert!(matches!(
        repo.get_configuration().await,
        Err(DbError::NotFound)
    ));

    seed_defaults(&pool).await.unwrap();
    assert_eq!(repo.get_configuration().await.unwrap(), AppConfig::default());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn saved_configuration_survives_reseeding(pool: PgPool) {
    seed_defaults(&pool).await.unwrap();
    let repo = DbRepository::new(pool.clone());

    let mut config = AppConfig::default();
    config.star_rates.truncate(1);
    config.extra.insert("theme".to_string(), json!("dark"));
    repo.save_configuration(&config).await.unwrap();

    let mut updated = config.clone();
    updated.bonuses.clear();
    repo.save_configuration(&updated).await.unwrap();

    seed_defaults(&pool).await.unwrap();
    assert_eq!(repo.get_configuration().await.unwrap(), updated);
}

// =============================================================================
// Weekend priority
// =============================================================================

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn weekend_priority_is_upserted_per_month(pool: PgPool) {
    let repo = DbRepository::new(pool);
    let june = MonthKey::new(2024, 6).unwrap();
    let july = MonthKey::new(2024, 7).unwrap();

    assert_eq!(
        repo.get_weekend_priority(june).await.unwrap(),
        WeekendPriority::empty(june)
    );

    repo.save_weekend_priority(june, &json!([{ "name": "A" }]))
        .await
        .unwrap();
    let saved = repo
        .save_weekend_priority(june, &json!([{ "name": "B" }]))
        .await
        .unwrap();

    let fetched = repo.get_weekend_priority(june).await.unwrap();
    assert_eq!(fetched.data, json!([{ "name": "B" }]));
    assert_eq!(fetched.calculated_at, saved.calculated_at);
    assert!(repo.get_weekend_priority(july).await.unwrap().calculated_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL pointing at PostgreSQL"]
async fn ping_succeeds_on_a_live_pool(pool: PgPool) {
    DbRepository::new(pool).ping().await.unwrap();
}
