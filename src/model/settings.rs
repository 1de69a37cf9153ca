use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Per-institution configuration, stored as the `settings` JSON column of
/// `institutions`. Missing keys fall back to the defaults below, so an empty
/// `{}` column is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct InstitutionSettings {
    pub attendance: AttendanceSettings,
    pub payroll: PayrollSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AttendanceSettings {
    /// Geofence radius around the institution reference point.
    #[schema(example = 100.0)]
    pub allowed_radius_meters: f64,

    /// When false, an out-of-radius check-in is still recorded but flagged
    /// as unverified.
    #[schema(example = false)]
    pub enforce_geofence: bool,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            allowed_radius_meters: 100.0,
            enforce_geofence: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PayrollSettings {
    #[schema(example = 8.0)]
    pub normal_hours_per_day: f64,

    #[schema(example = 1.5)]
    pub overtime_multiplier: f64,

    /// Divisor used to derive an hourly rate from a monthly base salary.
    #[schema(example = 26.0)]
    pub working_days_per_month: f64,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        Self {
            normal_hours_per_day: 8.0,
            overtime_multiplier: 1.5,
            working_days_per_month: 26.0,
        }
    }
}

impl InstitutionSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            (
                "attendance.allowed_radius_meters",
                self.attendance.allowed_radius_meters,
            ),
            (
                "payroll.normal_hours_per_day",
                self.payroll.normal_hours_per_day,
            ),
            ("payroll.overtime_multiplier", self.payroll.overtime_multiplier),
            (
                "payroll.working_days_per_month",
                self.payroll.working_days_per_month,
            ),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::InvalidArgument(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }

        if self.payroll.normal_hours_per_day > 24.0 {
            return Err(AppError::InvalidArgument(
                "payroll.normal_hours_per_day cannot exceed 24".into(),
            ));
        }

        Ok(())
    }
}
