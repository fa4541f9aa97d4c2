#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod policy;
pub mod present;
pub mod session;
pub mod store;
pub mod translator;
pub mod utils;

pub use cli::app::{Cli, Command};
