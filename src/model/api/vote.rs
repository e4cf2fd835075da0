use std::convert::Infallible;

use data_encoding::HEXLOWER;
use rocket::{
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::{common::CandidateId, vote::Provenance};

/// A ballot as submitted by a voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub candidate_id: CandidateId,
    /// Verdict of the external biometric check, recorded as-is.
    #[serde(default)]
    pub biometric_verified: bool,
}

/// Where a request came from: the client address and a device fingerprint
/// derived from it and the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin {
    pub ip_address: String,
    pub device_fingerprint: String,
}

impl ClientOrigin {
    pub fn new(ip_address: String, user_agent: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(user_agent.as_bytes());
        hasher.update([0]);
        hasher.update(ip_address.as_bytes());
        let device_fingerprint = format!("device_{}", HEXLOWER.encode(&hasher.finalize()));
        Self {
            ip_address,
            device_fingerprint,
        }
    }

    pub fn with_biometric(self, biometric_verified: bool) -> Provenance {
        Provenance {
            ip_address: self.ip_address,
            device_fingerprint: self.device_fingerprint,
            biometric_verified,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ClientOrigin {
    type Error = Infallible;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let ip_address = req
            .client_ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let user_agent = req.headers().get_one("User-Agent").unwrap_or_default();
        Outcome::Success(Self::new(ip_address, user_agent))
    }
}
