use chrono::Duration;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::engine::Engine;
use crate::store::Store;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_auth_ttl")]
    auth_ttl: u32,
    #[serde(default = "default_session_sweep_interval")]
    session_sweep_interval: u32,
    #[serde(default = "default_seed_demo_data")]
    seed_demo_data: bool,
    #[serde(default)]
    registered_voters: Option<u64>,
}

fn default_auth_ttl() -> u32 {
    24 * 60 * 60
}

fn default_session_sweep_interval() -> u32 {
    5 * 60
}

fn default_seed_demo_data() -> bool {
    true
}

impl Config {
    /// Valid lifetime of a session in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// How often expired sessions are swept, in seconds.
    pub fn session_sweep_interval(&self) -> Duration {
        Duration::seconds(self.session_sweep_interval.into())
    }

    /// Whether to start with the demo elections and identities.
    pub fn seed_demo_data(&self) -> bool {
        self.seed_demo_data
    }

    /// Size of the electorate used for turnout, if not the number of registered voters.
    pub fn registered_voters(&self) -> Option<u64> {
        self.registered_voters
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_ttl: default_auth_ttl(),
            session_sweep_interval: default_session_sweep_interval(),
            seed_demo_data: default_seed_demo_data(),
            registered_voters: None,
        }
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that builds the store, wraps it in an [`Engine`] and places the
/// engine into managed state.
/// This fairing depends on the config being available in managed state,
/// and so must be attached after [`ConfigFairing`].
pub struct EngineFairing;

#[rocket::async_trait]
impl Fairing for EngineFairing {
    fn info(&self) -> Info {
        Info {
            name: "Voting Engine",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.state::<Config>() {
            Some(config) => config.clone(),
            None => {
                error!("Config was not available when building the engine");
                return Err(rocket);
            }
        };

        info!("Building store...");
        let store = if config.seed_demo_data() {
            match Store::seeded(config.auth_ttl()) {
                Ok(store) => store,
                Err(e) => {
                    error!("Failed to seed demo data: {e}");
                    return Err(rocket);
                }
            }
        } else {
            warn!("Starting without demo data; no elections will be available");
            Store::new(Vec::new(), config.auth_ttl())
        };
        info!("...store ready!");

        let engine = Engine::new(store).with_registered_voters(config.registered_voters());
        rocket = rocket.manage(engine);
        Ok(rocket)
    }
}

#[cfg(test)]
mod tests {
    use rocket::figment::{providers::Serialized, Figment};

    use super::*;

    #[test]
    fn defaults_apply_when_keys_missing() {
        let config = Figment::new().extract::<Config>().unwrap();
        assert_eq!(config.auth_ttl(), Duration::hours(24));
        assert_eq!(config.session_sweep_interval(), Duration::minutes(5));
        assert!(config.seed_demo_data());
        assert_eq!(config.registered_voters(), None);
    }

    #[test]
    fn keys_override_defaults() {
        let config = Figment::new()
            .merge(Serialized::default("auth_ttl", 60))
            .merge(Serialized::default("registered_voters", 2_500_000))
            .merge(Serialized::default("seed_demo_data", false))
            .extract::<Config>()
            .unwrap();
        assert_eq!(config.auth_ttl(), Duration::minutes(1));
        assert_eq!(config.registered_voters(), Some(2_500_000));
        assert!(!config.seed_demo_data());
    }
}
