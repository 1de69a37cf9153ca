use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::payroll::{Payroll, net_salary},
    utils::{
        db_utils::{fetch_attendance_between, fetch_employee_institution},
        overtime::{self, DailyAttendance, OvertimeResult, month_bounds},
    },
};

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Any day of the payroll month
    #[schema(example = "2026-01-01")]
    pub month: NaiveDate,

    #[schema(example = 50000.0)]
    pub base_salary: f64,

    #[schema(example = 5000.0)]
    pub bonus: f64,

    #[schema(example = 2000.0)]
    pub deductions: f64,

    /// Defaults to base salary over the institution's monthly working hours
    #[schema(example = 240.38)]
    pub hourly_rate: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = 52000.0)]
    pub base_salary: Option<f64>,

    #[schema(example = 6000.0)]
    pub bonus: Option<f64>,

    #[schema(example = 2500.0)]
    pub deductions: Option<f64>,

    #[schema(example = 250.0)]
    pub hourly_rate: Option<f64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedPayrollResponse {
    pub data: Vec<Payroll>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OvertimeQuery {
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,

    #[schema(example = "2026-01-01")]
    pub month: NaiveDate,

    /// Falls back to the rate stored on that month's payroll
    #[schema(example = 240.38)]
    pub hourly_rate: Option<f64>,
}

#[derive(Serialize, ToSchema)]
pub struct OvertimeSummary {
    pub employee_id: u64,
    pub month: NaiveDate,
    pub days_worked: usize,
    pub normal_hours_per_day: f64,
    pub overtime_multiplier: f64,
    pub hourly_rate: f64,
    #[serde(flatten)]
    pub overtime: OvertimeResult,
}

/// Money and rate inputs must be finite and non-negative.
pub fn validate_amounts(fields: &[(&str, f64)]) -> Result<(), AppError> {
    for (name, value) in fields {
        if !value.is_finite() || *value < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "{name} must be a non-negative number"
            )));
        }
    }
    Ok(())
}

/// Officers may read their own payslips; staff only those of their institution.
pub fn payslip_access(
    auth: &AuthUser,
    owner_id: u64,
    owner_institution_id: u64,
) -> actix_web::Result<()> {
    if Some(owner_id) == auth.employee_id {
        return Ok(());
    }
    auth.require_hr_or_admin()?;
    auth.require_institution(owner_institution_id)
}

struct MonthOvertime {
    month: NaiveDate,
    days_worked: usize,
    hourly_rate: f64,
    normal_hours_per_day: f64,
    overtime_multiplier: f64,
    result: OvertimeResult,
}

/// Runs the overtime calculator over one month of an employee's attendance.
/// `hourly_rate` of `None` derives the rate from `base_salary`.
async fn month_overtime(
    auth: &AuthUser,
    pool: &MySqlPool,
    employee_id: u64,
    month: NaiveDate,
    base_salary: f64,
    hourly_rate: Option<f64>,
) -> actix_web::Result<MonthOvertime> {
    let institution = fetch_employee_institution(pool, employee_id).await?;
    auth.require_institution(institution.id)?;
    let settings = institution.settings.0.payroll;

    let (start, end) =
        month_bounds(month).ok_or_else(|| AppError::InvalidArgument("Invalid month".into()))?;

    let rows = fetch_attendance_between(pool, employee_id, start, end).await?;
    let days: Vec<DailyAttendance> = rows.iter().filter_map(|a| a.daily()).collect();

    let hourly_rate = hourly_rate.unwrap_or_else(|| overtime::hourly_rate(base_salary, &settings));
    let result = overtime::compute(&days, &settings, hourly_rate);

    Ok(MonthOvertime {
        month: start,
        days_worked: days.len(),
        hourly_rate,
        normal_hours_per_day: settings.normal_hours_per_day,
        overtime_multiplier: settings.overtime_multiplier,
        result,
    })
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = Payroll),
        (status = 400, description = "Negative or non-numeric amount"),
        (status = 401),
        (status = 403),
        (status = 409, description = "Payroll already exists for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    validate_amounts(&[
        ("base_salary", payload.base_salary),
        ("bonus", payload.bonus),
        ("deductions", payload.deductions),
        ("hourly_rate", payload.hourly_rate.unwrap_or(0.0)),
    ])?;

    let ot = month_overtime(
        &auth,
        pool.get_ref(),
        payload.employee_id,
        payload.month,
        payload.base_salary,
        payload.hourly_rate,
    )
    .await?;

    let net = net_salary(
        payload.base_salary,
        payload.bonus,
        ot.result.overtime_pay,
        payload.deductions,
    );

    let inserted = sqlx::query(
        r#"
        INSERT INTO payroll
        (employee_id, month, base_salary, bonus, deductions,
         hourly_rate, overtime_hours, overtime_pay, net_salary)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(ot.month)
    .bind(payload.base_salary)
    .bind(payload.bonus)
    .bind(payload.deductions)
    .bind(ot.hourly_rate)
    .bind(ot.result.total_overtime_hours)
    .bind(ot.result.overtime_pay)
    .bind(net)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict("Payroll already exists for this month".into())
        } else {
            tracing::error!(error = %e, employee_id = payload.employee_id, "Failed to create payroll");
            AppError::Database(e)
        }
    })?;

    info!(
        employee_id = payload.employee_id,
        month = %ot.month,
        overtime_hours = ot.result.total_overtime_hours,
        "Payroll created"
    );

    Ok(HttpResponse::Created().json(Payroll {
        id: inserted.last_insert_id(),
        employee_id: payload.employee_id,
        month: ot.month,
        base_salary: payload.base_salary,
        bonus: payload.bonus,
        deductions: payload.deductions,
        hourly_rate: ot.hourly_rate,
        overtime_hours: ot.result.total_overtime_hours,
        overtime_pay: ot.result.overtime_pay,
        net_salary: net,
    }))
}

async fn fetch_payroll(pool: &MySqlPool, payroll_id: u64) -> Result<Option<Payroll>, AppError> {
    let payroll = sqlx::query_as::<_, Payroll>(
        r#"
        SELECT id, employee_id, month, base_salary, bonus, deductions,
               hourly_rate, overtime_hours, overtime_pay, net_salary
        FROM payroll
        WHERE id = ?
        "#,
    )
    .bind(payroll_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
        AppError::Database(e)
    })?;

    Ok(payroll)
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated, overtime recomputed", body = Payroll),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let payroll_id = path.into_inner();

    let current = match fetch_payroll(pool.get_ref(), payroll_id).await? {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Payroll record not found"
            })));
        }
    };

    let base_salary = body.base_salary.unwrap_or(current.base_salary);
    let bonus = body.bonus.unwrap_or(current.bonus);
    let deductions = body.deductions.unwrap_or(current.deductions);
    let hourly_rate = body.hourly_rate.unwrap_or(current.hourly_rate);

    validate_amounts(&[
        ("base_salary", base_salary),
        ("bonus", bonus),
        ("deductions", deductions),
        ("hourly_rate", hourly_rate),
    ])?;

    // a new base salary without an explicit rate re-derives the rate
    let rate_override = match (body.hourly_rate, body.base_salary) {
        (Some(rate), _) => Some(rate),
        (None, Some(_)) => None,
        (None, None) => Some(current.hourly_rate),
    };

    let ot = month_overtime(
        &auth,
        pool.get_ref(),
        current.employee_id,
        current.month,
        base_salary,
        rate_override,
    )
    .await?;
    let net = net_salary(base_salary, bonus, ot.result.overtime_pay, deductions);

    sqlx::query(
        r#"
        UPDATE payroll
        SET base_salary = ?, bonus = ?, deductions = ?,
            hourly_rate = ?, overtime_hours = ?, overtime_pay = ?, net_salary = ?
        WHERE id = ?
        "#,
    )
    .bind(base_salary)
    .bind(bonus)
    .bind(deductions)
    .bind(ot.hourly_rate)
    .bind(ot.result.total_overtime_hours)
    .bind(ot.result.overtime_pay)
    .bind(net)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to update payroll");
        AppError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(Payroll {
        id: payroll_id,
        employee_id: current.employee_id,
        month: current.month,
        base_salary,
        bonus,
        deductions,
        hourly_rate: ot.hourly_rate,
        overtime_hours: ot.result.total_overtime_hours,
        overtime_pay: ot.result.overtime_pay,
        net_salary: net,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = Payroll),
        (status = 403, description = "Another officer's payslip, or another institution"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let payroll_id = path.into_inner();

    match fetch_payroll(pool.get_ref(), payroll_id).await? {
        Some(p) => {
            let institution = fetch_employee_institution(pool.get_ref(), p.employee_id).await?;
            payslip_access(&auth, p.employee_id, institution.id)?;
            Ok(HttpResponse::Ok().json(p))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payroll not found"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PaginatedPayrollResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let institution_id = auth.institution_id()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM payroll p
        JOIN employees e ON e.id = p.employee_id
        WHERE e.institution_id = ?
        AND (? IS NULL OR p.employee_id = ?)
        "#,
    )
    .bind(institution_id)
    .bind(query.employee_id)
    .bind(query.employee_id)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to count payrolls");
        AppError::Database(e)
    })?;

    let data = sqlx::query_as::<_, Payroll>(
        r#"
        SELECT p.id, p.employee_id, p.month, p.base_salary, p.bonus, p.deductions,
               p.hourly_rate, p.overtime_hours, p.overtime_pay, p.net_salary
        FROM payroll p
        JOIN employees e ON e.id = p.employee_id
        WHERE e.institution_id = ?
        AND (? IS NULL OR p.employee_id = ?)
        ORDER BY p.month DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(institution_id)
    .bind(query.employee_id)
    .bind(query.employee_id)
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch payroll list");
        AppError::Database(e)
    })?;

    Ok(HttpResponse::Ok().json(PaginatedPayrollResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payroll/overtime",
    params(OvertimeQuery),
    responses(
        (status = 200, body = OvertimeSummary),
        (status = 400, description = "No hourly rate given and no payroll for the month"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn overtime_summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<OvertimeQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;
    let (start, _) =
        month_bounds(query.month).ok_or_else(|| AppError::InvalidArgument("Invalid month".into()))?;

    let hourly_rate = match query.hourly_rate {
        Some(rate) => rate,
        None => sqlx::query_scalar::<_, f64>(
            "SELECT hourly_rate FROM payroll WHERE employee_id = ? AND month = ?",
        )
        .bind(employee_id)
        .bind(start)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| {
            AppError::InvalidArgument(
                "hourly_rate is required when no payroll exists for the month".into(),
            )
        })?,
    };
    validate_amounts(&[("hourly_rate", hourly_rate)])?;

    let ot = month_overtime(
        &auth,
        pool.get_ref(),
        employee_id,
        start,
        0.0,
        Some(hourly_rate),
    )
    .await?;

    Ok(HttpResponse::Ok().json(OvertimeSummary {
        employee_id,
        month: ot.month,
        days_worked: ot.days_worked,
        normal_hours_per_day: ot.normal_hours_per_day,
        overtime_multiplier: ot.overtime_multiplier,
        hourly_rate: ot.hourly_rate,
        overtime: ot.result,
    }))
}
