pub mod codes;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod error;
pub mod geo;
pub mod logging;
pub mod metrics;
pub mod permissions;
pub mod server;
pub mod storage;
