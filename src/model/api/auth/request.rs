use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{IdentityId, Role},
    identity::PersonalDetails,
    session::Session,
};

/// Sign-in credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub national_id: String,
    pub password: String,
}

/// A freshly issued session, as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token.as_str().to_string(),
            role: session.role,
            expires_at: session.expires_at,
        }
    }
}

/// A request to register as a new voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(flatten)]
    pub details: PersonalDetails,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub identity_id: IdentityId,
    /// Always false: an administrator has to verify the identity before it can sign in.
    pub verified: bool,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;
    use crate::store::seed::{DemoCredentials, DEMO_ADMIN, DEMO_AGENT, DEMO_VOTER};

    impl From<DemoCredentials> for LoginRequest {
        fn from(credentials: DemoCredentials) -> Self {
            Self {
                national_id: credentials.national_id.to_string(),
                password: credentials.password.to_string(),
            }
        }
    }

    impl LoginRequest {
        pub fn example_voter() -> Self {
            DEMO_VOTER.into()
        }

        pub fn example_admin() -> Self {
            DEMO_ADMIN.into()
        }

        pub fn example_agent() -> Self {
            DEMO_AGENT.into()
        }
    }

    impl RegistrationRequest {
        pub fn example() -> Self {
            Self {
                details: PersonalDetails::example("40404040", "Mombasa"),
                password: "correct horse battery staple".to_string(),
            }
        }
    }
}
