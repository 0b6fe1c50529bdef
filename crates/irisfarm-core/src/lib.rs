//! # IrisFarm Core
//! Shared error type, configuration, and the transport seam.

pub mod config;
pub mod error;
pub mod transport;

pub use config::FarmConfig;
pub use error::{FarmError, Result};
pub use transport::CommandTransport;
