use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, types::Json};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{institution::Institution, settings::InstitutionSettings},
    utils::{db_utils::fetch_institution, geo::GeoPoint},
};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct InstitutionSettingsBody {
    /// Reference point attendance positions are measured against
    pub reference_location: GeoPoint,
    pub settings: InstitutionSettings,
}

#[derive(Serialize, ToSchema)]
pub struct InstitutionSettingsResponse {
    #[schema(example = 1)]
    pub institution_id: u64,
    #[schema(example = "Main Campus")]
    pub name: String,
    pub reference_location: GeoPoint,
    pub settings: InstitutionSettings,
}

impl From<Institution> for InstitutionSettingsResponse {
    fn from(institution: Institution) -> Self {
        Self {
            reference_location: institution.reference_location(),
            institution_id: institution.id,
            name: institution.name,
            settings: institution.settings.0,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/institution/settings",
    responses(
        (status = 200, description = "Effective settings with defaults filled in", body = InstitutionSettingsResponse),
        (status = 403, description = "No institution assigned"),
        (status = 404, description = "Institution not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Institution"
)]
pub async fn get_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let institution = fetch_institution(pool.get_ref(), auth.institution_id()?).await?;

    Ok(HttpResponse::Ok().json(InstitutionSettingsResponse::from(institution)))
}

#[utoipa::path(
    put,
    path = "/api/institution/settings",
    request_body = InstitutionSettingsBody,
    responses(
        (status = 200, body = InstitutionSettingsResponse),
        (status = 400, description = "Invalid coordinates or settings"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Institution not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Institution"
)]
pub async fn update_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<InstitutionSettingsBody>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let institution_id = auth.institution_id()?;

    let body = body.into_inner();
    body.reference_location.validate().map_err(AppError::from)?;
    body.settings.validate()?;

    sqlx::query(
        r#"
        UPDATE institutions
        SET latitude = ?, longitude = ?, settings = ?
        WHERE id = ?
        "#,
    )
    .bind(body.reference_location.latitude)
    .bind(body.reference_location.longitude)
    .bind(Json(body.settings.clone()))
    .bind(institution_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, institution_id, "Failed to update institution settings");
        AppError::Database(e)
    })?;

    info!(
        institution_id,
        radius = body.settings.attendance.allowed_radius_meters,
        enforce = body.settings.attendance.enforce_geofence,
        "Institution settings updated"
    );

    // MySQL reports 0 affected rows for a no-op update, so read back instead
    let institution = fetch_institution(pool.get_ref(), institution_id).await?;
    Ok(HttpResponse::Ok().json(InstitutionSettingsResponse::from(institution)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_accepts_partial_settings() {
        let body: InstitutionSettingsBody = serde_json::from_value(serde_json::json!({
            "reference_location": { "latitude": 12.9716, "longitude": 77.5946 },
            "settings": { "attendance": { "allowed_radius_meters": 50.0 } }
        }))
        .unwrap();

        assert_eq!(body.reference_location, GeoPoint::new(12.9716, 77.5946));
        assert_eq!(body.settings.attendance.allowed_radius_meters, 50.0);
        assert_eq!(body.settings.payroll.normal_hours_per_day, 8.0);
    }

    #[test]
    fn test_response_from_row() {
        let row = Institution {
            id: 3,
            name: "North Campus".into(),
            latitude: 12.9716,
            longitude: 77.5946,
            settings: Json(InstitutionSettings::default()),
        };

        let response = InstitutionSettingsResponse::from(row);
        assert_eq!(response.institution_id, 3);
        assert_eq!(response.reference_location, GeoPoint::new(12.9716, 77.5946));
        assert_eq!(response.settings, InstitutionSettings::default());
    }
}
