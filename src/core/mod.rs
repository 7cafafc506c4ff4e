pub mod access_policy;
pub mod clock;
pub mod config;
pub mod github;
pub mod jwt_auth;
pub mod list_cache;
mod responses;
pub mod storage;
mod telemetry;
pub mod utils;

pub use self::config::AppConfig;
pub use access_policy::AccessPolicy;
pub use clock::{Clock, SystemClock};
pub use github::RepositoryClient;
pub use list_cache::ListCache;
pub use responses::*;
pub use storage::StorageClient;
pub use telemetry::*;
