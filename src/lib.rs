#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{Config, ConfigFairing, EngineFairing};
use crate::engine::Engine;
use crate::logging::LoggerFairing;
use crate::scheduler::{SchedulerFairing, SessionSweeperFairing};

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod scheduled_task;
pub mod scheduler;
pub mod store;

/// Build the server from `Rocket.toml` and the environment.
///
/// Fairing order matters: the engine needs the config, and the scheduler
/// and sweeper need the engine.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .attach(ConfigFairing)
        .attach(EngineFairing)
        .attach(SchedulerFairing)
        .attach(SessionSweeperFairing)
        .attach(LoggerFairing)
}

/// Build a server around an existing engine, with default config.
pub fn rocket_for_engine(engine: Engine) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .register("/", api::catchers())
        .manage(Config::default())
        .manage(engine)
        .attach(SchedulerFairing)
        .attach(LoggerFairing)
}
