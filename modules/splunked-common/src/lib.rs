pub mod types;
pub mod training;
pub mod config;
pub mod error;

pub use types::*;
pub use training::*;
pub use config::Config;
pub use error::SplunkedError;
