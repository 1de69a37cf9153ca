use crate::{
    api::{attendance, institution, payroll},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Limiter state shared by all workers; build once before `HttpServer::new`.
#[derive(Clone)]
pub struct RateLimiters {
    protected: LimiterConfig,
    attendance: LimiterConfig,
}

impl RateLimiters {
    pub fn new(config: &Config) -> Self {
        Self {
            protected: build_limiter(config.rate_protected_per_min),
            attendance: build_limiter(config.rate_attendance_per_min),
        }
    }
}

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> LimiterConfig {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // per_millisecond and burst_size are both non-zero here
        .unwrap_or_default()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    let protected_limiter = Governor::new(&limiters.protected);
    let attendance_limiter = Governor::new(&limiters.attendance);

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .wrap(attendance_limiter)
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::check_in))
                            .route(web::put().to(attendance::check_out))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // /attendance/geofence
                    .service(
                        web::resource("/geofence")
                            .route(web::post().to(attendance::preview_geofence)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    // /payroll/overtime, registered before /{id}
                    .service(
                        web::resource("/overtime").route(web::get().to(payroll::overtime_summary)),
                    )
                    // /payroll/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll)),
                    ),
            )
            .service(
                web::scope("/institution").service(
                    web::resource("/settings")
                        .route(web::get().to(institution::get_settings))
                        .route(web::put().to(institution::update_settings)),
                ),
            ),
    );
}
