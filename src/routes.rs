use crate::handlers::*;
use actix_web::web;

/// The router table. Unmatched requests fall through to the app's default
/// service, [`not_found`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(create)),
    )
    .service(
        web::resource("/movie/edit/{id:\\d+}")
            .route(web::get().to(edit))
            .route(web::post().to(edit_post)),
    )
    .service(web::resource("/movie/delete/{id:\\d+}").route(web::post().to(delete)))
    .service(
        web::resource("/login")
            .route(web::get().to(login))
            .route(web::post().to(login_post)),
    )
    .service(web::resource("/logout").route(web::get().to(logout)))
    .service(
        web::resource("/settings")
            .route(web::get().to(settings))
            .route(web::post().to(settings_post)),
    );
}
