pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod navigation;

pub use errors::DashError;
