pub mod collab;
pub mod config;
pub mod error;
pub mod types;

pub use error::{QuarryError, Result};
