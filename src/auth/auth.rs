use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::{model::role::Role, models::Claims};
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,

    pub institution_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Option<Self> {
        Some(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role: Role::from_id(claims.role)?,
            employee_id: claims.employee_id,
            institution_id: claims.institution_id,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        match AuthUser::from_claims(claims) {
            Some(user) => ready(Ok(user)),
            None => ready(Err(ErrorUnauthorized("Invalid role"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.manages_staff() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    /// Employee record of the caller; attendance can only be recorded for one.
    pub fn employee_id(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    pub fn institution_id(&self) -> actix_web::Result<u64> {
        self.institution_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No institution assigned"))
    }

    /// Officer whose records are being read: the caller, or `requested` when
    /// the caller manages staff.
    pub fn target_employee(&self, requested: Option<u64>) -> actix_web::Result<u64> {
        match requested {
            Some(id) if Some(id) == self.employee_id => Ok(id),
            Some(id) => {
                self.require_hr_or_admin()?;
                Ok(id)
            }
            None => self.employee_id(),
        }
    }

    /// Rejects callers reading records of an institution other than their own.
    pub fn require_institution(&self, institution_id: u64) -> actix_web::Result<()> {
        if self.institution_id == Some(institution_id) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden(
                "Employee belongs to another institution",
            ))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::jwt::tests::{SECRET, claims, token_for};
    use crate::config::Config;
    use actix_web::test::{TestRequest, call_service, init_service, read_body};
    use actix_web::{App, HttpResponse, http::StatusCode, web};

    pub(crate) fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://localhost/ims_test".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            _ => None,
        })
        .unwrap()
    }

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(format!("{}:{:?}", user.username, user.employee_id))
    }

    #[actix_web::test]
    async fn test_extractor_accepts_valid_token() {
        let app = init_service(
            App::new()
                .app_data(Data::new(test_config()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let token = token_for(&claims(3, Some(7), Some(1)), SECRET);
        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_body(resp).await;
        assert_eq!(body, "officer:Some(7)");
    }

    #[actix_web::test]
    async fn test_extractor_rejects_missing_and_unknown_role() {
        let app = init_service(
            App::new()
                .app_data(Data::new(test_config()))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = TestRequest::get().uri("/me").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = token_for(&claims(99, Some(7), Some(1)), SECRET);
        let req = TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
            institution_id: Some(1),
        }
    }

    #[test]
    fn test_target_employee() {
        let officer = user(Role::Employee, Some(7));
        assert_eq!(officer.target_employee(None).unwrap(), 7);
        assert_eq!(officer.target_employee(Some(7)).unwrap(), 7);
        assert!(officer.target_employee(Some(8)).is_err());

        let hr = user(Role::Hr, None);
        assert_eq!(hr.target_employee(Some(8)).unwrap(), 8);
        assert!(hr.target_employee(None).is_err());
    }

    #[test]
    fn test_role_guards() {
        assert!(user(Role::Admin, None).require_admin().is_ok());
        assert!(user(Role::Hr, None).require_admin().is_err());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Employee, Some(1)).require_hr_or_admin().is_err());
    }

    #[test]
    fn test_require_institution() {
        let hr = user(Role::Hr, None);
        assert!(hr.require_institution(1).is_ok());

        let err = hr.require_institution(2).unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );

        let unassigned = AuthUser {
            institution_id: None,
            ..user(Role::Admin, None)
        };
        assert!(unassigned.require_institution(1).is_err());
    }
}
