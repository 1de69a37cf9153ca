use sqlx::types::Json;

use crate::{model::settings::InstitutionSettings, utils::geo::GeoPoint};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Institution {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub settings: Json<InstitutionSettings>,
}

impl Institution {
    pub fn reference_location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
