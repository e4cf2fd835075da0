use rocket::{http::Status, serde::json::Json, Route, State};

use crate::{
    engine::Engine,
    error::Result,
    model::api::auth::{
        BearerToken, LoginRequest, LoginResponse, RegistrationRequest, RegistrationResponse,
    },
};

pub fn routes() -> Vec<Route> {
    routes![login, register, logout]
}

#[post("/auth/login", data = "<credentials>", format = "json")]
pub fn login(credentials: Json<LoginRequest>, engine: &State<Engine>) -> Result<Json<LoginResponse>> {
    let session = engine.authenticate(&credentials.national_id, &credentials.password)?;
    Ok(Json(session.into()))
}

#[post("/auth/register", data = "<registration>", format = "json")]
pub fn register(
    registration: Json<RegistrationRequest>,
    engine: &State<Engine>,
) -> Result<(Status, Json<RegistrationResponse>)> {
    let RegistrationRequest { details, password } = registration.into_inner();
    let identity_id = engine.register(details, &password)?;
    let response = RegistrationResponse {
        identity_id,
        verified: false,
    };
    Ok((Status::Created, Json(response)))
}

#[delete("/auth")]
pub fn logout(token: BearerToken, engine: &State<Engine>) -> Result<Status> {
    engine.logout(token.as_str())?;
    Ok(Status::Ok)
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Header},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;
    use crate::{error::ErrorBody, model::common::Role};

    #[backend_test]
    async fn login_valid(client: Client, engine: Engine) {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example_voter()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let session = response.into_json::<LoginResponse>().await.unwrap();
        assert_eq!(session.role, Role::Voter);
        assert_eq!(engine.session(&session.token).unwrap().role, Role::Voter);
    }

    #[backend_test]
    async fn login_invalid(client: Client) {
        for (national_id, password) in [("12345678", "wrong"), ("99999999", "password123")] {
            let response = client
                .post(uri!(login))
                .header(ContentType::JSON)
                .body(json!({ "nationalId": national_id, "password": password }).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Unauthorized, response.status());
            let body = response.into_json::<ErrorBody>().await.unwrap();
            assert_eq!(body.error, "invalid_credentials");
        }
    }

    #[backend_test]
    async fn login_malformed(client: Client) {
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!({ "username": "admin" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
    }

    #[backend_test]
    async fn register_then_verify(client: Client, engine: Engine) {
        let request = RegistrationRequest::example();
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let registered = response.into_json::<RegistrationResponse>().await.unwrap();
        assert!(!registered.verified);

        // Unverified identities cannot sign in yet.
        let response = client
            .post(uri!(login))
            .header(ContentType::JSON)
            .body(json!({ "nationalId": "40404040", "password": request.password }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        assert!(engine.verify_identity(&registered.identity_id).unwrap());
        let session = engine.authenticate("40404040", &request.password).unwrap();
        assert_eq!(session.identity_id, registered.identity_id);

        // Registering the same national ID twice is a conflict.
        let response = client
            .post(uri!(register))
            .header(ContentType::JSON)
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
    }

    #[backend_test(admin)]
    async fn logout_admin(client: Client, engine: Engine, auth: Header<'static>) {
        let token = auth
            .value()
            .strip_prefix(crate::model::api::auth::BEARER_PREFIX)
            .unwrap()
            .to_string();
        assert!(engine.session(&token).is_ok());

        let response = client.delete(uri!(logout)).header(auth).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(engine.session(&token).is_err());
    }

    #[backend_test]
    async fn logout_not_logged_in(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
    }
}
