pub mod api;
pub mod config;
pub mod core;
pub mod storage;
pub mod utils;

pub use config::{CliConfig, ServiceDescriptor, ServiceRegistry};
pub use core::{CredentialStore, EnvCredentials, SyncEngine};
pub use storage::CountStore;
pub use utils::error::{ListsError, Result};
