// Library interface for the CLI and tests

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod fragment;
pub mod models;
pub mod queries;
pub mod recordings;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod tier;

pub use constants::EXPECTED_DB_VERSION;
pub use error::{Error, Result};
