use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, AttendanceResponse, CheckResponse, GeofencePreview,
};
use crate::api::institution::{InstitutionSettingsBody, InstitutionSettingsResponse};
use crate::api::payroll::{
    CreatePayroll, OvertimeQuery, OvertimeSummary, PaginatedPayrollResponse, PayrollQuery,
    UpdatePayroll,
};
use crate::model::payroll::Payroll;
use crate::model::settings::{AttendanceSettings, InstitutionSettings, PayrollSettings};
use crate::utils::geo::{GeoPoint, GeofenceResult};
use crate::utils::overtime::OvertimeResult;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Institution Attendance API",
        version = "1.0.0",
        description = r#"
## Institution attendance & payroll

Backend for geofenced attendance and overtime-aware payroll in a
multi-tenant institution management system.

### Key Features
- **Attendance**
  - Check-in / check-out with a GPS position, validated against the
    institution's reference point and allowed radius
  - Out-of-radius checks are recorded and flagged unless the institution
    enforces its geofence
- **Payroll**
  - Overtime hours from the month's attendance, paid at the configured multiplier
- **Institution settings**
  - Typed settings with documented defaults

### Security
Every endpoint expects a **JWT Bearer** access token issued by the identity
backend. Admin/HR roles are required for payroll and for reading other
officers' records.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::preview_geofence,
        crate::api::attendance::list_attendance,

        crate::api::payroll::create_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::get_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::overtime_summary,

        crate::api::institution::get_settings,
        crate::api::institution::update_settings
    ),
    components(
        schemas(
            GeoPoint,
            GeofenceResult,
            CheckResponse,
            GeofencePreview,
            AttendanceQuery,
            AttendanceResponse,
            AttendanceListResponse,
            Payroll,
            CreatePayroll,
            UpdatePayroll,
            PayrollQuery,
            PaginatedPayrollResponse,
            OvertimeQuery,
            OvertimeResult,
            OvertimeSummary,
            InstitutionSettings,
            AttendanceSettings,
            PayrollSettings,
            InstitutionSettingsBody,
            InstitutionSettingsResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Geofenced attendance APIs"),
        (name = "Payroll", description = "Payroll and overtime APIs"),
        (name = "Institution", description = "Institution settings APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_paths_and_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/attendance"));
        assert!(doc.paths.paths.contains_key("/api/payroll/overtime"));
        assert!(doc.paths.paths.contains_key("/api/institution/settings"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("GeofenceResult"));
    }
}
