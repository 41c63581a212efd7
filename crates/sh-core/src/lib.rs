pub mod config;
pub mod environment;
pub mod error;
pub mod host;
pub mod types;
pub mod value;

pub use config::ExecutorConfig;
pub use environment::EnvironmentSnapshot;
pub use error::ScriptHostError;
pub use host::*;
pub use types::*;
pub use value::*;
