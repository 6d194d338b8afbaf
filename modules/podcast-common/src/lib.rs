pub mod env_config;
pub mod error;
pub mod hashing;
pub mod site;

pub use env_config::{EnvConfig, ProviderKind, StorageEnv};
pub use error::{CoreError, Result};
pub use hashing::content_hash;
pub use site::{Correction, CorrectionsFile, FeedConfig, Site, SiteRegistry};
