pub mod audit;
pub mod boot;
pub mod config;
pub mod host;
pub mod kodi;
pub mod moon;
pub mod notify;
pub mod orchestrator;
pub mod paths;
pub mod saturn;
pub mod state;
