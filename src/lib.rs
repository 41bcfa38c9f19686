#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod insight;
pub mod logging;
pub mod model;
pub mod services;
pub mod sweep;
pub mod tally;

use config::{AwsFairing, ConfigFairing, DatabaseFairing, GenAiFairing, RendererFairing};
use logging::LoggerFairing;
use sweep::SweepFairing;

/// Construct the server, ready for launch.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AwsFairing)
        .attach(GenAiFairing)
        .attach(RendererFairing)
        .attach(LoggerFairing)
        .attach(SweepFairing)
}
