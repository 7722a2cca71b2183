pub mod cli;
pub mod commands;
pub mod env_loader;
pub mod error;
pub mod kronos;
pub mod logging;
