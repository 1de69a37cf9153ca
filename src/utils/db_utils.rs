use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::{
    error::AppError,
    model::{attendance::Attendance, institution::Institution},
};

pub const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, date, check_in, check_out,
    check_in_latitude, check_in_longitude, check_in_distance_meters, check_in_validated,
    check_out_latitude, check_out_longitude, check_out_distance_meters, check_out_validated
"#;

pub async fn fetch_institution(pool: &MySqlPool, institution_id: u64) -> Result<Institution, AppError> {
    sqlx::query_as::<_, Institution>(
        r#"
        SELECT id, name, latitude, longitude, settings
        FROM institutions
        WHERE id = ?
        "#,
    )
    .bind(institution_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Institution not found".into()))
}

/// Institution of an employee, used when staff act on someone else's records.
pub async fn fetch_employee_institution(
    pool: &MySqlPool,
    employee_id: u64,
) -> Result<Institution, AppError> {
    let institution_id = sqlx::query_scalar::<_, u64>(
        "SELECT institution_id FROM employees WHERE id = ?",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

    fetch_institution(pool, institution_id).await
}

/// Attendance rows of one employee with `start <= date < end`, oldest first.
pub async fn fetch_attendance_between(
    pool: &MySqlPool,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Attendance>, AppError> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE employee_id = ? AND date >= ? AND date < ? \
         ORDER BY date ASC"
    );

    let rows = sqlx::query_as::<_, Attendance>(&sql)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
