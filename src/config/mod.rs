//! Configuration: the optional `.keeper.toml` file and the validated
//! per-invocation `ClientConfig` built from it.

mod client;
mod settings;

pub use client::{ClientConfig, ClientConfigBuilder};
pub use settings::Settings;
