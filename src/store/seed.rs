//! Demonstration data: the 2027 general election ballots and a handful of
//! pre-verified identities to sign in with.

use chrono::{DateTime, Duration, Utc};

use crate::error::AuthError;
use crate::model::{
    common::{CandidateId, ElectionId, ElectionStatus, IdentityId, Role},
    election::{Candidate, ElectionSpec},
    identity::{Identity, PersonalDetails},
};

use super::Store;

/// How long the demo elections stay open.
const VOTING_PERIOD_DAYS: i64 = 30;

/// Sign-in credentials of a demo identity.
pub struct DemoCredentials {
    pub national_id: &'static str,
    pub password: &'static str,
}

pub const DEMO_VOTER: DemoCredentials = DemoCredentials {
    national_id: "12345678",
    password: "password123",
};

pub const DEMO_ADMIN: DemoCredentials = DemoCredentials {
    national_id: "11111111",
    password: "admin123",
};

pub const DEMO_AGENT: DemoCredentials = DemoCredentials {
    national_id: "22222222",
    password: "agent123",
};

/// (id, national ID, password, first, last, email, phone, constituency, ward, role)
type IdentityRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Role,
);

#[rustfmt::skip]
const IDENTITIES: &[IdentityRow] = &[
    ("user_001", "12345678", "password123", "John", "Doe", "john.doe@example.com", "+254712345678", "Westlands", "Kilimani", Role::Voter),
    ("user_002", "87654321", "mypassword", "Jane", "Smith", "jane.smith@example.com", "+254787654321", "Westlands", "Parklands", Role::Voter),
    ("user_003", "11223344", "secure123", "Peter", "Kamau", "peter.kamau@example.com", "+254711223344", "Starehe", "Nairobi Central", Role::Voter),
    ("user_004", "99887766", "vote2027", "Mary", "Wanjiku", "mary.wanjiku@example.com", "+254799887766", "Starehe", "Ngara", Role::Voter),
    ("user_005", "55443322", "kenya2027", "David", "Ochieng", "david.ochieng@example.com", "+254755443322", "Langata", "Karen", Role::Voter),
    ("admin_001", "11111111", "admin123", "Admin", "User", "admin@iebc.go.ke", "+254700000001", "Nairobi Central", "Central", Role::Admin),
    ("agent_001", "22222222", "agent123", "Agent", "Monitor", "agent@iebc.go.ke", "+254700000002", "Nairobi Central", "Central", Role::Agent),
];

/// (candidate id, name, party, position)
type CandidateRow = (&'static str, &'static str, &'static str, &'static str);

/// (election id, title, office description, candidates)
type ElectionRow = (&'static str, &'static str, &'static str, &'static [CandidateRow]);

#[rustfmt::skip]
const ELECTIONS: &[ElectionRow] = &[
    ("election_2027_presidential", "2027 Presidential Election", "National Presidential Election", &[
        ("candidate_1", "Dr. William Ruto", "United Democratic Alliance (UDA)", "President"),
        ("candidate_2", "Raila Odinga", "Azimio la Umoja Coalition", "President"),
        ("candidate_3", "George Wajackoyah", "Roots Party", "President"),
    ]),
    ("election_2027_governor_nairobi", "2027 Nairobi County Governor Election", "Election for Nairobi County Governor", &[
        ("gov_candidate_1", "Johnson Sakaja", "United Democratic Alliance (UDA)", "Governor - Nairobi County"),
        ("gov_candidate_2", "Polycarp Igathe", "Azimio la Umoja Coalition", "Governor - Nairobi County"),
    ]),
    ("election_2027_senator_nairobi", "2027 Nairobi County Senator Election", "Election for Nairobi County Senator", &[
        ("sen_candidate_1", "Edwin Sifuna", "Orange Democratic Movement (ODM)", "Senator - Nairobi County"),
        ("sen_candidate_2", "Margaret Wanjiru", "United Democratic Alliance (UDA)", "Senator - Nairobi County"),
    ]),
    ("election_2027_mp_westlands", "2027 Westlands Constituency MP Election", "Election for Member of Parliament - Westlands Constituency", &[
        ("mp_candidate_1", "Tim Wanyonyi", "Orange Democratic Movement (ODM)", "Member of Parliament - Westlands"),
        ("mp_candidate_2", "Nelson Havi", "United Democratic Alliance (UDA)", "Member of Parliament - Westlands"),
    ]),
    ("election_2027_woman_rep_nairobi", "2027 Nairobi County Woman Representative Election", "Election for Woman Representative - Nairobi County", &[
        ("wr_candidate_1", "Esther Passaris", "Orange Democratic Movement (ODM)", "Woman Representative - Nairobi County"),
        ("wr_candidate_2", "Millicent Omanga", "United Democratic Alliance (UDA)", "Woman Representative - Nairobi County"),
    ]),
    ("election_2027_mca_kilimani", "2027 Kilimani Ward MCA Election", "Election for Member of County Assembly - Kilimani Ward", &[
        ("mca_candidate_1", "Moses Ogeto", "Orange Democratic Movement (ODM)", "MCA - Kilimani Ward"),
        ("mca_candidate_2", "Grace Wanjiku", "United Democratic Alliance (UDA)", "MCA - Kilimani Ward"),
    ]),
];

/// The demo elections, all active and open from `now` for the voting period.
pub fn demo_elections(now: DateTime<Utc>) -> Vec<(ElectionSpec, ElectionStatus)> {
    ELECTIONS
        .iter()
        .map(|(id, title, office, candidates)| {
            let spec = ElectionSpec {
                id: ElectionId::from(*id),
                title: title.to_string(),
                description: format!("{office} for the term 2027-2032"),
                start_at: now,
                end_at: now + Duration::days(VOTING_PERIOD_DAYS),
                candidates: candidates
                    .iter()
                    .map(|(id, name, party, position)| Candidate {
                        id: CandidateId::from(*id),
                        name: name.to_string(),
                        party: party.to_string(),
                        position: position.to_string(),
                        biography: String::new(),
                        manifesto: String::new(),
                        image_ref: format!("/images/candidates/{id}.jpg"),
                    })
                    .collect(),
            };
            (spec, ElectionStatus::Active)
        })
        .collect()
}

/// Register the demo identities, all verified and living in Nairobi.
pub fn register_demo_identities(store: &Store) -> Result<(), AuthError> {
    for &(id, national_id, password, first, last, email, phone, constituency, ward, role) in
        IDENTITIES
    {
        let details = PersonalDetails {
            national_id: national_id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone_number: phone.to_string(),
            county: "Nairobi".to_string(),
            constituency: constituency.to_string(),
            ward: ward.to_string(),
        };
        let mut identity = Identity::new(IdentityId::from(id), details, role, password)?;
        identity.verified = true;
        store.identities.register(identity)?;
    }
    Ok(())
}

impl Store {
    /// A store populated with the demo elections and identities.
    pub fn seeded(session_ttl: Duration) -> Result<Self, AuthError> {
        let store = Store::new(demo_elections(Utc::now()), session_ttl);
        register_demo_identities(&store)?;
        info!(
            "Seeded {} elections and {} identities",
            ELECTIONS.len(),
            IDENTITIES.len()
        );
        Ok(store)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Store {
        pub fn example() -> Self {
            Self::seeded(Duration::hours(24)).unwrap()
        }
    }
}
