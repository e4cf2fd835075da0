use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

use data_encoding::{BASE64URL_NOPAD, HEXLOWER};
use rand::{rngs::OsRng, RngCore};
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Formatter as UriFormatter, Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// Bytes of OS randomness behind each session token.
pub const TOKEN_BYTES: usize = 32;

/// Bytes of OS randomness behind each generated record ID.
pub const RECORD_ID_BYTES: usize = 16;

/// Declare a string-backed identifier type that can be used directly as a
/// Rocket path parameter.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl<'a> FromParam<'a> for $name {
            type Error = &'a str;

            fn from_param(param: &'a str) -> Result<Self, Self::Error> {
                if param.is_empty() {
                    Err(param)
                } else {
                    Ok(Self(param.to_string()))
                }
            }
        }

        impl UriDisplay<Path> for $name {
            fn fmt(&self, f: &mut UriFormatter<'_, Path>) -> fmt::Result {
                f.write_value(&self.0)
            }
        }

        impl_from_uri_param_identity!([Path] $name);
    };
}

string_id! {
    /// Unique ID of a registered identity (voter, admin or agent).
    IdentityId
}

string_id! {
    /// Unique ID of an election in the catalog.
    ElectionId
}

string_id! {
    /// ID of a candidate, unique within its election.
    CandidateId
}

string_id! {
    /// Unique ID of a vote record in the ledger.
    VoteId
}

impl IdentityId {
    /// Generate a fresh identity ID for a new registration.
    pub fn generate() -> Self {
        Self(format!("user_{}", random_hex(RECORD_ID_BYTES)))
    }
}

impl VoteId {
    /// Generate a fresh vote ID. With 128 random bits, collisions are not a
    /// practical concern; the ledger still rejects them.
    pub fn generate() -> Self {
        Self(format!("vote_{}", random_hex(RECORD_ID_BYTES)))
    }
}

/// An opaque bearer credential. Deliberately has no `Display` so it doesn't end up in logs.
#[derive(Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Draw a new token from the operating system's CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(BASE64URL_NOPAD.encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

// Lets the session map be queried with a raw `&str` from a request header.
impl Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    OsRng.fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}
