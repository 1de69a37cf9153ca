use crate::{
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::{attendance::Attendance, settings::AttendanceSettings},
    utils::{
        db_utils::{fetch_attendance_between, fetch_employee_institution, fetch_institution},
        geo::{self, GeoPoint, GeofenceResult},
        overtime::month_bounds,
    },
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct CheckResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub geofence: GeofenceResult,
}

#[derive(Serialize, ToSchema)]
pub struct GeofencePreview {
    pub geofence: GeofenceResult,
    #[schema(example = 100.0)]
    pub allowed_radius_meters: f64,
    #[schema(example = false)]
    pub enforce_geofence: bool,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    /// Any day of the month to list; defaults to the current month
    #[schema(example = "2026-03-01")]
    pub month: Option<NaiveDate>,

    /// Officer to list; HR/Admin only when not the caller
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub check_in_location: Option<GeoPoint>,
    pub check_in_distance_meters: Option<f64>,
    pub check_in_validated: bool,
    pub check_out_location: Option<GeoPoint>,
    pub check_out_distance_meters: Option<f64>,
    pub check_out_validated: bool,
    pub hours_worked: Option<f64>,
}

impl From<Attendance> for AttendanceResponse {
    fn from(a: Attendance) -> Self {
        Self {
            hours_worked: a.hours_worked(),
            check_in_location: a.check_in_location(),
            check_out_location: a.check_out_location(),
            date: a.date,
            check_in: a.check_in,
            check_out: a.check_out,
            check_in_distance_meters: a.check_in_distance_meters,
            check_in_validated: a.check_in_validated,
            check_out_distance_meters: a.check_out_distance_meters,
            check_out_validated: a.check_out_validated,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub employee_id: u64,
    pub month: NaiveDate,
    pub data: Vec<AttendanceResponse>,
    #[schema(example = 176.5)]
    pub total_hours: f64,
}

/// An out-of-radius check only blocks the request when the institution
/// enforces its geofence; otherwise the row is kept and flagged.
pub fn apply_geofence_policy(
    result: &GeofenceResult,
    settings: &AttendanceSettings,
) -> Result<(), AppError> {
    if settings.enforce_geofence && !result.validated {
        return Err(AppError::Forbidden(format!(
            "Location is {:.0}m from the institution, allowed radius is {:.0}m",
            result.distance_meters, settings.allowed_radius_meters
        )));
    }
    Ok(())
}

/// Clock for attendance dates and times. Check-in, check-out and the default
/// listing month all read it, so they agree on which day it is.
fn attendance_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Validates a reported position against the caller's institution.
async fn geofence_for(
    auth: &AuthUser,
    pool: &MySqlPool,
    location: GeoPoint,
) -> actix_web::Result<(GeofenceResult, AttendanceSettings)> {
    location.validate().map_err(AppError::from)?;

    let institution = fetch_institution(pool, auth.institution_id()?).await?;
    let reference = institution.reference_location();
    let settings = institution.settings.0.attendance;

    let result = geo::check(location, reference, settings.allowed_radius_meters);
    Ok((result, settings))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = GeoPoint,
    responses(
        (status = 200, description = "Checked in; `validated` is false when outside the geofence", body = CheckResponse),
        (status = 400, description = "Already checked in today or invalid coordinates", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside an enforced geofence, or no employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let location = payload.into_inner();

    let (geofence, settings) = geofence_for(&auth, pool.get_ref(), location).await?;
    apply_geofence_policy(&geofence, &settings)?;

    let now = attendance_now();
    let result = sqlx::query(
        r#"
        INSERT INTO attendance
        (employee_id, date, check_in,
         check_in_latitude, check_in_longitude, check_in_distance_meters, check_in_validated)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date())
    .bind(now.time())
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(geofence.distance_meters)
    .bind(geofence.validated)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            if geofence.validated {
                info!(employee_id, distance = geofence.distance_meters, "Checked in");
            } else {
                warn!(
                    employee_id,
                    distance = geofence.distance_meters,
                    radius = settings.allowed_radius_meters,
                    "Checked in outside geofence"
                );
            }

            Ok(HttpResponse::Ok().json(CheckResponse {
                message: "Checked in successfully".into(),
                geofence,
            }))
        }

        // Duplicate check-in for same day
        Err(e) if is_duplicate_key(&e) => Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already checked in today"
        }))),

        Err(e) => {
            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(AppError::Database(e).into())
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = GeoPoint,
    responses(
        (status = 200, description = "Checked out; `validated` is false when outside the geofence", body = CheckResponse),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside an enforced geofence, or no employee profile"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let location = payload.into_inner();

    let (geofence, settings) = geofence_for(&auth, pool.get_ref(), location).await?;
    apply_geofence_policy(&geofence, &settings)?;

    let now = attendance_now();
    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?,
            check_out_latitude = ?,
            check_out_longitude = ?,
            check_out_distance_meters = ?,
            check_out_validated = ?
        WHERE employee_id = ?
        AND date = ?
        AND check_out IS NULL
        "#,
    )
    .bind(now.time())
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(geofence.distance_meters)
    .bind(geofence.validated)
    .bind(employee_id)
    .bind(now.date())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        AppError::Database(e)
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    info!(
        employee_id,
        distance = geofence.distance_meters,
        validated = geofence.validated,
        "Checked out"
    );

    Ok(HttpResponse::Ok().json(CheckResponse {
        message: "Checked out successfully".into(),
        geofence,
    }))
}

/// Geofence preview, nothing is recorded
#[utoipa::path(
    post,
    path = "/api/attendance/geofence",
    request_body = GeoPoint,
    responses(
        (status = 200, body = GeofencePreview),
        (status = 400, description = "Invalid coordinates"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn preview_geofence(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<GeoPoint>,
) -> actix_web::Result<impl Responder> {
    let (geofence, settings) = geofence_for(&auth, pool.get_ref(), payload.into_inner()).await?;

    Ok(HttpResponse::Ok().json(GeofencePreview {
        geofence,
        allowed_radius_meters: settings.allowed_radius_meters,
        enforce_geofence: settings.enforce_geofence,
    }))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, body = AttendanceListResponse),
        (status = 403, description = "Listing another officer requires HR/Admin"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.target_employee(query.employee_id)?;

    if Some(employee_id) != auth.employee_id {
        let institution = fetch_employee_institution(pool.get_ref(), employee_id).await?;
        auth.require_institution(institution.id)?;
    }

    let day = query.month.unwrap_or_else(|| attendance_now().date());
    let (start, end) =
        month_bounds(day).ok_or_else(|| AppError::InvalidArgument("Invalid month".into()))?;

    let rows = fetch_attendance_between(pool.get_ref(), employee_id, start, end).await?;
    let data: Vec<AttendanceResponse> = rows.into_iter().map(AttendanceResponse::from).collect();
    let total_hours: f64 = data.iter().filter_map(|a| a.hours_worked).sum();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        employee_id,
        month: start,
        data,
        total_hours,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth::tests::test_config;
    use crate::auth::jwt::tests::{SECRET, claims, token_for};
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, http::StatusCode, web::Data};

    fn settings(enforce_geofence: bool) -> AttendanceSettings {
        AttendanceSettings {
            allowed_radius_meters: 10.0,
            enforce_geofence,
        }
    }

    #[test]
    fn test_outside_radius_is_flagged_not_rejected_by_default() {
        let office = GeoPoint::new(12.9716, 77.5946);
        let officer = GeoPoint::new(12.9720, 77.5950);
        let result = geo::check(officer, office, 10.0);

        assert!(!result.validated);
        assert!(apply_geofence_policy(&result, &settings(false)).is_ok());
    }

    #[test]
    fn test_enforced_geofence_rejects_outside_radius() {
        let office = GeoPoint::new(12.9716, 77.5946);
        let officer = GeoPoint::new(12.9720, 77.5950);
        let result = geo::check(officer, office, 10.0);

        let err = apply_geofence_policy(&result, &settings(true)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_enforced_geofence_allows_inside_radius() {
        let office = GeoPoint::new(12.9716, 77.5946);
        let result = geo::check(office, office, 10.0);

        assert!(apply_geofence_policy(&result, &settings(true)).is_ok());
    }

    #[test]
    fn test_response_carries_hours_worked() {
        let row = Attendance {
            id: 1,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            check_in: NaiveTime::from_hms_opt(9, 0, 0),
            check_out: NaiveTime::from_hms_opt(17, 45, 0),
            check_in_latitude: Some(12.9720),
            check_in_longitude: Some(77.5950),
            check_in_distance_meters: Some(61.0),
            check_in_validated: true,
            check_out_latitude: Some(12.9716),
            check_out_longitude: Some(77.5946),
            check_out_distance_meters: Some(0.0),
            check_out_validated: true,
        };

        let response = AttendanceResponse::from(row);
        assert_eq!(response.hours_worked, Some(8.75));
        assert_eq!(
            response.check_out_location,
            Some(GeoPoint::new(12.9716, 77.5946))
        );
    }

    #[test]
    fn test_default_month_contains_todays_check_in() {
        let now = attendance_now();
        let (start, end) = month_bounds(now.date()).unwrap();

        assert!(start <= now.date() && now.date() < end);
    }

    async fn post_position(
        route: &str,
        employee_id: Option<u64>,
        institution_id: Option<u64>,
        body: serde_json::Value,
    ) -> StatusCode {
        // lazy pool: these requests are rejected before any query runs
        let pool = MySqlPool::connect_lazy("mysql://localhost/ims_test").unwrap();
        let app = init_service(
            App::new()
                .app_data(Data::new(test_config()))
                .app_data(Data::new(pool))
                .route("/attendance", web::post().to(check_in))
                .route("/attendance/geofence", web::post().to(preview_geofence)),
        )
        .await;

        let token = token_for(&claims(3, employee_id, institution_id), SECRET);
        let req = TestRequest::post()
            .uri(route)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(body)
            .to_request();
        call_service(&app, req).await.status()
    }

    #[actix_web::test]
    async fn test_preview_rejects_out_of_range_latitude() {
        let status = post_position(
            "/attendance/geofence",
            Some(7),
            Some(1),
            serde_json::json!({ "latitude": 91.0, "longitude": 0.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_preview_requires_institution() {
        let status = post_position(
            "/attendance/geofence",
            Some(7),
            None,
            serde_json::json!({ "latitude": 12.9716, "longitude": 77.5946 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_check_in_rejects_out_of_range_longitude() {
        let status = post_position(
            "/attendance",
            Some(7),
            Some(1),
            serde_json::json!({ "latitude": 12.9716, "longitude": 181.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_check_in_requires_employee_profile() {
        let status = post_position(
            "/attendance",
            None,
            Some(1),
            serde_json::json!({ "latitude": 12.9716, "longitude": 77.5946 }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
