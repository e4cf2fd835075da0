use std::convert::Infallible;
use std::marker::PhantomData;
use std::ops::Deref;

use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};

use crate::engine::Engine;
use crate::error::{Error, VoteError};
use crate::model::{common::RoleMarker, session::Session};

pub const BEARER_PREFIX: &str = "Bearer ";

/// The raw bearer token sent with a request.
///
/// Extracting it never fails: a missing or malformed `Authorization` header
/// yields an empty token, which matches no session. Deciding whether the token
/// is any good is left to the engine, so that every flavour of bad token
/// produces the same `invalid_session` outcome.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn from_request_headers(req: &Request<'_>) -> Self {
        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .unwrap_or_default()
            .trim();
        Self(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for BearerToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Self::from_request_headers(req))
    }
}

/// A valid session whose role is one of those allowed by `R`.
pub struct Authenticated<R> {
    pub session: Session,
    token: BearerToken,
    phantom: PhantomData<R>,
}

impl<R> Authenticated<R> {
    pub fn token(&self) -> &str {
        self.token.as_str()
    }
}

#[rocket::async_trait]
impl<'r, R> FromRequest<'r> for Authenticated<R>
where
    R: RoleMarker,
{
    type Error = Error;

    /// Resolve the bearer token into a session and check that its role is permitted.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let engine = match req.rocket().state::<Engine>() {
            Some(engine) => engine,
            None => {
                error!("No engine in managed state");
                return Outcome::Failure((
                    Status::InternalServerError,
                    Error::Status(Status::InternalServerError, "Engine unavailable".to_string()),
                ));
            }
        };

        let token = BearerToken::from_request_headers(req);
        match engine.session(token.as_str()) {
            Ok(session) if R::permits(session.role) => Outcome::Success(Self {
                session,
                token,
                phantom: PhantomData,
            }),
            Ok(session) => {
                debug!(
                    "{} session {} denied, needs one of {:?}",
                    session.role,
                    session.identity_id,
                    R::ALLOWED
                );
                Outcome::Failure((
                    Status::Forbidden,
                    Error::Status(Status::Forbidden, format!("{} role not permitted", session.role)),
                ))
            }
            Err(VoteError::InvalidSession) => {
                Outcome::Failure((Status::Unauthorized, VoteError::InvalidSession.into()))
            }
            Err(err) => Outcome::Failure((Status::ServiceUnavailable, err.into())),
        }
    }
}
