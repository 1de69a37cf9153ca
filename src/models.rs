use serde::{Deserialize, Serialize};

/// Claims carried by access tokens issued by the identity backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,

    /// Present only if this user is linked to an employee record
    #[serde(default)]
    pub employee_id: Option<u64>,

    /// Tenant the user belongs to
    #[serde(default)]
    pub institution_id: Option<u64>,
}
