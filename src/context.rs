use crate::config::Config;
use actix_identity::{CookieIdentityPolicy, IdentityService};
use std::sync::Arc;

pub const IDENTITY_COOKIE: &str = "auth-cookie";

/// Everything a handler needs, shared by all workers.
#[derive(Clone)]
pub struct AppContext {
    pub db: sled::Db,
    pub tera: Arc<tera::Tera>,
}

impl AppContext {
    pub fn new(db: sled::Db, tera: tera::Tera) -> Self {
        AppContext {
            db,
            tera: Arc::new(tera),
        }
    }
}

pub fn identity_service(config: &Config) -> IdentityService<CookieIdentityPolicy> {
    IdentityService::new(
        CookieIdentityPolicy::new(&config.secret_key)
            .name(IDENTITY_COOKIE)
            .path("/")
            .secure(config.secure_cookie),
    )
}
