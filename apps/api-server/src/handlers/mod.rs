//! HTTP handlers and route configuration.

/// Build an actix test service from a [`testing::TestContext`].
#[cfg(test)]
macro_rules! init_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.state.clone()))
                .app_data(actix_web::web::Data::new($ctx.tokens.clone()))
                .app_data(actix_web::web::Data::new($ctx.passwords.clone()))
                .configure(crate::handlers::configure_routes),
        )
        .await
    };
}

mod auth;
mod garden;
mod health;
mod media;
mod posts;
mod profiles;
mod uploads;

use actix_web::web;

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            .route("/garden", web::get().to(garden::get_garden))
            .service(
                web::scope("/auth")
                    .route("/sign-up", web::post().to(auth::sign_up))
                    .route("/sign-in", web::post().to(auth::sign_in))
                    .route("/sign-out", web::post().to(auth::sign_out))
                    .route("/me", web::get().to(auth::me)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post)),
            )
            .service(
                web::scope("/profiles")
                    .route("", web::get().to(profiles::get_profiles))
                    .route("/me", web::put().to(profiles::update_my_profile)),
            )
            .route(
                "/uploads/thumbnails",
                web::post().to(uploads::upload_thumbnail),
            ),
    )
    .route("/media/{path:.*}", web::get().to(media::serve_media));
}
