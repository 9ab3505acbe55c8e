pub mod api;
pub mod config;
pub mod errors;
pub mod logging;
pub mod password;
pub mod seed;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
