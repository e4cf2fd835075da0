use std::sync::OnceLock;

use argon2::Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::common::{IdentityId, Role};

/// Personal details of an identity, as supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub county: String,
    pub constituency: String,
    pub ward: String,
}

/// A registered identity, as held by the identity registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub details: PersonalDetails,
    pub role: Role,
    pub verified: bool,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Identity {
    /// Create an identity from raw credentials by hashing the password.
    pub fn new(
        id: IdentityId,
        details: PersonalDetails,
        role: Role,
        password: &str,
    ) -> Result<Self, argon2::Error> {
        Ok(Self {
            id,
            details,
            role,
            verified: false,
            password_hash: hash_password(password)?,
            registered_at: Utc::now(),
            last_login: None,
        })
    }

    /// Check whether the given password is correct.
    ///
    /// A malformed stored hash counts as a mismatch rather than an error.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.details.first_name, self.details.last_name)
    }
}

/// Run an argon2 verification against a throwaway hash, costing as much as
/// [`Identity::verify_password`] does for a registered identity.
pub fn verify_password_unknown<T: AsRef<[u8]>>(password: T) {
    static UNKNOWN_HASH: OnceLock<Option<String>> = OnceLock::new();
    let hash = UNKNOWN_HASH.get_or_init(|| hash_password("").ok());
    if let Some(hash) = hash {
        let _ = argon2::verify_encoded(hash, password.as_ref());
    }
}

/// Hash a password with a fresh 16-byte salt.
fn hash_password(password: &str) -> Result<String, argon2::Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())
}

/// Public, credential-free view of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySummary {
    pub id: IdentityId,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub county: String,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&Identity> for IdentitySummary {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.full_name(),
            role: identity.role,
            verified: identity.verified,
            county: identity.details.county.clone(),
            last_login: identity.last_login,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let identity = Identity::new(
            IdentityId::from("user_x"),
            PersonalDetails::example("12121212", "Nairobi"),
            Role::Voter,
            "hunter2",
        )
        .unwrap();
        assert!(identity.verify_password("hunter2"));
        assert!(!identity.verify_password("hunter3"));
        assert!(!identity.verified);
        assert_ne!(identity.password_hash, "hunter2");
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        let mut identity = Identity::new(
            IdentityId::from("user_y"),
            PersonalDetails::example("34343434", "Kisumu"),
            Role::Voter,
            "pw",
        )
        .unwrap();
        identity.password_hash = "not-a-hash".to_string();
        assert!(!identity.verify_password("pw"));
    }
}
