use crate::{
    api::attendance,
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request((60_000 / requests_per_min as u64).max(1))
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter)
                            .route(web::post().to(handlers::login)),
                    )
                    .service(web::resource("/logout").route(web::post().to(handlers::logout)))
                    .service(web::resource("/me").route(web::get().to(handlers::me))),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    // /attendance/{id}/check-out
                    .service(
                        web::resource("/{id}/check-out")
                            .route(web::put().to(attendance::check_out)),
                    ),
            ),
    );
}

// LOGIN
//  └─ token (1 day), also set as the `token` cookie

// PAGE REQUEST
//  └─ guard: cookie → Authenticated(role) | redirect /login | 403

// API REQUEST
//  └─ Authorization: Bearer token (or cookie), checked by the AuthUser extractor
