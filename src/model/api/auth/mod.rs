mod request;
mod token;

pub use request::{LoginRequest, LoginResponse, RegistrationRequest, RegistrationResponse};
pub use token::{Authenticated, BearerToken, BEARER_PREFIX};
