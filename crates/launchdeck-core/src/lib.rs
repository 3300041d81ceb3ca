pub mod account;
pub mod backend;
pub mod error;
pub mod instance;
pub mod settings;
pub mod store;
pub mod vault;

// Re-export common error type
pub use error::LaunchdeckError;
