use rocket::{http::Status, serde::json::Json, Catcher, Request, Route};

use crate::error::ErrorBody;

pub mod admin;
pub mod auth;
pub mod public;
pub mod voter;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(public::routes());
    routes.extend(auth::routes());
    routes.extend(voter::routes());
    routes
}

/// JSON versions of Rocket's default error pages, so that guard failures
/// look the same as errors returned from handlers.
pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> (Status, Json<ErrorBody>) {
    let error = match status.code {
        400 => "bad_request",
        401 => "invalid_session",
        403 => "forbidden",
        404 => "not_found",
        415 => "unsupported_media_type",
        422 => "unprocessable_entity",
        503 => "storage_failure",
        _ => "error",
    };
    debug!("Caught {status} for {} {}", req.method(), req.uri());
    let body = ErrorBody {
        error: error.to_string(),
        message: status.reason_lossy().to_string(),
    };
    (status, Json(body))
}
