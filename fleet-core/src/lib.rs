pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod manifest;
pub mod registry;

pub use error::{FleetError, Result};
