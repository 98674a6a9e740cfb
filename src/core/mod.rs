pub mod accessor;
pub mod credentials;
pub mod model;
pub mod sync;

pub use credentials::{CredentialStore, EnvCredentials, StaticCredentials};
pub use model::{AggregateSnapshot, ServiceSnapshot, SyncFailure};
pub use sync::SyncEngine;
