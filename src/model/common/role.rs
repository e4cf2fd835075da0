use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The role an identity acts in. Carried by every session.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voter,
    Admin,
    Agent,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
                Self::Agent => "agent",
            }
        )
    }
}

/// Marker types for role-restricted request guards.
///
/// A guard parameterised by a marker accepts a session whose role is one of
/// [`RoleMarker::ALLOWED`].
pub trait RoleMarker: Send + Sync + 'static {
    const ALLOWED: &'static [Role];

    fn permits(role: Role) -> bool {
        Self::ALLOWED.contains(&role)
    }
}

/// Any signed-in voter.
pub struct Voter;

impl RoleMarker for Voter {
    const ALLOWED: &'static [Role] = &[Role::Voter];
}

/// Administrators only.
pub struct Admin;

impl RoleMarker for Admin {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

/// Read-only oversight: administrators and monitoring agents.
pub struct Observer;

impl RoleMarker for Observer {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Agent];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_permit_expected_roles() {
        assert!(Voter::permits(Role::Voter));
        assert!(!Voter::permits(Role::Admin));
        assert!(Admin::permits(Role::Admin));
        assert!(!Admin::permits(Role::Agent));
        assert!(Observer::permits(Role::Agent));
        assert!(Observer::permits(Role::Admin));
        assert!(!Observer::permits(Role::Voter));
    }
}
