#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod agent;
pub mod commands;
pub mod config;
pub mod engines;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod pipeline;
pub mod providers;
pub mod response;
pub mod storage;
pub mod ui;

pub use commands::{ConfigCommands, ProjectCommands};
pub use config::Config;
