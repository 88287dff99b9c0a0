pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{scenario::ScenarioConfig, DevConfig, DEV_ORIGIN_ENV};
pub use core::{
    broadcaster::{DevReadyBroadcaster, PendingPing},
    scenario::{ScenarioReport, ScenarioRunner},
    AssetsManifest, DevNotifier, PingPayload, ServerBuild,
};
pub use utils::error::{DevReadyError, Result};
