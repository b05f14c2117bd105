use crate::context::AppContext;
use crate::database::{MovieDb, UserDb};
use crate::flash::{self, Flash};
use crate::model::*;
use actix_identity::Identity;
use actix_web::{error, http::StatusCode, web, HttpMessage, HttpRequest, HttpResponse};
use log::{debug, info, warn};
use validator::Validate;

type Ctx = web::Data<AppContext>;

fn log_error<E: std::fmt::Debug>(err: E, message: &'static str) -> error::Error {
    debug!("{:?}", err);
    error::ErrorInternalServerError(message)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().header("location", location).finish()
}

fn redirect_with(location: &str, flash: Flash) -> HttpResponse {
    HttpResponse::Found()
        .header("location", location)
        .cookie(flash.cookie())
        .finish()
}

/// The form, if the body parsed and passed validation.
fn validated<T: Validate>(params: Option<web::Form<T>>) -> Option<T> {
    let params = match params {
        Some(params) => params.into_inner(),
        None => {
            debug!("Rejected unparsable form");
            return None;
        }
    };
    match params.validate() {
        Ok(()) => Some(params),
        Err(err) => {
            debug!("Rejected form: {}", err);
            None
        }
    }
}

/// Who is asking: the administrator record and whether the identity cookie
/// belongs to them.
struct Visitor {
    admin: Option<(u64, User)>,
    authenticated: bool,
}

impl Visitor {
    fn load(id: &Identity, db: &sled::Db) -> actix_web::Result<Visitor> {
        let admin = db
            .first_user()
            .map_err(|err| log_error(err, "Database error"))?;
        let authenticated = match (id.identity(), &admin) {
            (Some(username), Some((_, user))) => user.username == username,
            _ => false,
        };
        Ok(Visitor {
            admin,
            authenticated,
        })
    }

    /// The administrator, but only for an authenticated visitor.
    fn current_user(&self) -> Option<&(u64, User)> {
        if self.authenticated {
            self.admin.as_ref()
        } else {
            None
        }
    }
}

fn render(
    ctx: &AppContext,
    req: &HttpRequest,
    visitor: &Visitor,
    template: &str,
    mut context: tera::Context,
    status: StatusCode,
) -> actix_web::Result<HttpResponse> {
    let pending = flash::pending(req);
    context.insert(
        "user_name",
        &visitor.admin.as_ref().map(|(_, user)| user.name.as_str()),
    );
    context.insert("authenticated", &visitor.authenticated);
    context.insert("flash", &pending.map(Flash::message));
    let body = ctx
        .tera
        .render(template, &context)
        .map_err(|err| log_error(err, "Template error"))?;
    let mut response = HttpResponse::build(status);
    response.content_type("text/html; charset=utf-8");
    if req.cookie(flash::FLASH_COOKIE).is_some() {
        response.del_cookie(&flash::removal_cookie());
    }
    Ok(response.body(body))
}

fn render_not_found(
    ctx: &AppContext,
    req: &HttpRequest,
    visitor: &Visitor,
) -> actix_web::Result<HttpResponse> {
    render(
        ctx,
        req,
        visitor,
        "404.html",
        tera::Context::new(),
        StatusCode::NOT_FOUND,
    )
}

pub async fn index(id: Identity, req: HttpRequest, ctx: Ctx) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    let movies = ctx
        .db
        .list_movies()
        .map_err(|err| log_error(err, "Database error"))?
        .into_iter()
        .map(|(id, data)| Entry { id, data })
        .collect::<Vec<_>>();
    let mut context = tera::Context::new();
    context.insert("movies", &movies);
    render(&ctx, &req, &visitor, "index.html", context, StatusCode::OK)
}

pub async fn create(
    params: Option<web::Form<MovieForm>>,
    id: Identity,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/"));
    }
    let params = match validated(params) {
        Some(params) => params,
        None => return Ok(redirect_with("/", Flash::InvalidInput)),
    };
    let movie = Movie::from(params);
    let movie_id = ctx
        .db
        .add_movie(&movie)
        .map_err(|err| log_error(err, "Database error"))?;
    info!("Created movie {}: {:?} ({})", movie_id, movie.title, movie.year);
    Ok(redirect_with("/", Flash::ItemCreated))
}

pub async fn edit(
    movie_id: web::Path<u64>,
    id: Identity,
    req: HttpRequest,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/login"));
    }
    let movie_id = movie_id.into_inner();
    let movie = match ctx
        .db
        .get_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
    {
        Some(movie) => movie,
        None => return render_not_found(&ctx, &req, &visitor),
    };
    let mut context = tera::Context::new();
    context.insert(
        "movie",
        &Entry {
            id: movie_id,
            data: movie,
        },
    );
    render(&ctx, &req, &visitor, "edit.html", context, StatusCode::OK)
}

pub async fn edit_post(
    movie_id: web::Path<u64>,
    params: Option<web::Form<MovieForm>>,
    id: Identity,
    req: HttpRequest,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/login"));
    }
    let movie_id = movie_id.into_inner();
    let exists = ctx
        .db
        .get_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
        .is_some();
    if !exists {
        return render_not_found(&ctx, &req, &visitor);
    }
    let params = match validated(params) {
        Some(params) => params,
        None => {
            return Ok(redirect_with(
                &format!("/movie/edit/{}", movie_id),
                Flash::InvalidInput,
            ))
        }
    };
    let movie = Movie::from(params);
    let updated = ctx
        .db
        .update_movie(movie_id, &movie)
        .map_err(|err| log_error(err, "Database error"))?;
    if !updated {
        // Deleted in the meantime.
        return render_not_found(&ctx, &req, &visitor);
    }
    info!("Updated movie {}: {:?} ({})", movie_id, movie.title, movie.year);
    Ok(redirect_with("/", Flash::ItemUpdated))
}

pub async fn delete(
    movie_id: web::Path<u64>,
    id: Identity,
    req: HttpRequest,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/login"));
    }
    let movie_id = movie_id.into_inner();
    match ctx
        .db
        .remove_movie(movie_id)
        .map_err(|err| log_error(err, "Database error"))?
    {
        Some(movie) => {
            info!("Deleted movie {}: {:?}", movie_id, movie.title);
            Ok(redirect_with("/", Flash::ItemDeleted))
        }
        None => render_not_found(&ctx, &req, &visitor),
    }
}

pub async fn login(id: Identity, req: HttpRequest, ctx: Ctx) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    render(
        &ctx,
        &req,
        &visitor,
        "login.html",
        tera::Context::new(),
        StatusCode::OK,
    )
}

pub async fn login_post(
    params: Option<web::Form<LoginForm>>,
    id: Identity,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let params = match params {
        Some(params) if !params.username.is_empty() && !params.password.is_empty() => params,
        _ => return Ok(redirect_with("/login", Flash::InvalidCredentials)),
    };
    if let Some((_user_id, user)) = ctx
        .db
        .first_user()
        .map_err(|err| log_error(err, "Database error"))?
    {
        if user.username == params.username
            && bcrypt::verify(&params.password, &user.password_hash)
                .map_err(|err| log_error(err, "Verification error"))?
        {
            info!("{} logged in", user.username);
            id.remember(user.username);
            return Ok(redirect_with("/", Flash::LoginSuccess));
        }
    }
    warn!("Failed login attempt for {:?}", params.username);
    Ok(redirect_with("/login", Flash::InvalidCredentials))
}

pub async fn logout(id: Identity, ctx: Ctx) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/login"));
    }
    id.forget();
    info!("Logged out");
    Ok(redirect_with("/", Flash::Goodbye))
}

pub async fn settings(id: Identity, req: HttpRequest, ctx: Ctx) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    if !visitor.authenticated {
        return Ok(redirect("/login"));
    }
    render(
        &ctx,
        &req,
        &visitor,
        "settings.html",
        tera::Context::new(),
        StatusCode::OK,
    )
}

pub async fn settings_post(
    params: Option<web::Form<SettingsForm>>,
    id: Identity,
    ctx: Ctx,
) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    let (user_id, user) = match visitor.current_user() {
        Some(current) => current,
        None => return Ok(redirect("/login")),
    };
    let params = match validated(params) {
        Some(params) => params,
        None => return Ok(redirect_with("/settings", Flash::InvalidInput)),
    };
    let updated = User {
        name: params.name,
        ..user.clone()
    };
    ctx.db
        .update_user(*user_id, &updated)
        .map_err(|err| log_error(err, "Database error"))?;
    info!("Display name changed to {:?}", updated.name);
    Ok(redirect_with("/", Flash::SettingsUpdated))
}

pub async fn not_found(id: Identity, req: HttpRequest, ctx: Ctx) -> actix_web::Result<HttpResponse> {
    let visitor = Visitor::load(&id, &ctx.db)?;
    render_not_found(&ctx, &req, &visitor)
}
