use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::utils::{geo::GeoPoint, overtime::DailyAttendance};

/// One row of the append-only attendance log. The geofence outcome of each
/// check is stored next to the reported position.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,

    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub check_in_distance_meters: Option<f64>,
    pub check_in_validated: bool,

    pub check_out_latitude: Option<f64>,
    pub check_out_longitude: Option<f64>,
    pub check_out_distance_meters: Option<f64>,
    pub check_out_validated: bool,
}

impl Attendance {
    /// Hours between check-in and check-out, `None` while the day is open.
    pub fn hours_worked(&self) -> Option<f64> {
        let worked = self.check_out? - self.check_in?;
        Some((worked.num_seconds() as f64 / 3600.0).max(0.0))
    }

    pub fn daily(&self) -> Option<DailyAttendance> {
        Some(DailyAttendance {
            date: self.date,
            hours_worked: self.hours_worked()?,
        })
    }

    pub fn check_in_location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.check_in_latitude?, self.check_in_longitude?))
    }

    pub fn check_out_location(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(
            self.check_out_latitude?,
            self.check_out_longitude?,
        ))
    }
}
