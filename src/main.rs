mod config;
mod context;
mod database;
mod flash;
mod handlers;
mod model;
mod routes;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::{AdminConfig, Config};
use context::{identity_service, AppContext};
use database::UserDb;
use log::info;
use model::User;
use std::io;

fn io_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

/// Creates the administrator if the store has no user yet.
fn bootstrap_admin(db: &sled::Db, admin: &AdminConfig, cost: u32) -> io::Result<()> {
    if let Some((_, user)) = db.first_user().map_err(io_error)? {
        info!("Administrator {:?} already exists", user.username);
        return Ok(());
    }
    let user = User {
        name: admin.name.clone(),
        username: admin.username.clone(),
        password_hash: bcrypt::hash(&admin.password, cost).map_err(io_error)?,
    };
    let id = db.add_user(&user).map_err(io_error)?;
    info!("Created administrator {:?} with id {}", user.username, id);
    Ok(())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "watchlist=debug,actix_web=info");
    }
    env_logger::init();

    let config = Config::from_env().map_err(io_error)?;

    let db = sled::open(&config.db_path).map_err(io_error)?;
    match &config.admin {
        Some(admin) => bootstrap_admin(&db, admin, config.bcrypt_cost)?,
        None if db.first_user().map_err(io_error)?.is_none() => log::warn!(
            "No administrator exists; set WATCHLIST_ADMIN_USERNAME and WATCHLIST_ADMIN_PASSWORD to create one"
        ),
        None => {}
    }
    let tera = tera::Tera::new(&config.templates).map_err(io_error)?;
    let context = AppContext::new(db.clone(), tera);

    info!("Listening on {}", config.bind);
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(identity_service(&server_config))
            .data(context.clone())
            .configure(routes::configure)
            .default_service(web::route().to(handlers::not_found))
    })
    .bind(&config.bind)?
    .run()
    .await?;

    db.flush().map_err(io_error)?;
    Ok(())
}
