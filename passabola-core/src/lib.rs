//! Core library for the Passa a Bola backend.
//!
//! JSON-file collections stand in for a database, every operation leaves a
//! line in a plain-text audit log, and accounts authenticate with Argon2
//! password hashes and signed, expiring tokens. The HTTP gateway and the CLI
//! are thin callers of the services exported here.

pub mod audit;
pub mod auth;
pub mod config;
pub mod errors;
pub mod logging;
pub mod resources;
pub mod seed;
pub mod store;
pub mod users;

pub use audit::AuditLog;
pub use auth::{Role, TokenClaims, TokenService};
pub use errors::{PlatformError, Result as CoreResult};
pub use resources::{ResourceKind, ResourceService};
pub use store::{CollectionStore, Record};
pub use users::UserService;

use config::{AuthConfig, CoreConfig};

/// Everything a caller needs, wired from configuration.
#[derive(Clone)]
pub struct Platform {
    pub store: CollectionStore,
    pub users: UserService,
    pub players: ResourceService,
    pub events: ResourceService,
}

impl Platform {
    pub fn new(store: CollectionStore, auth: &AuthConfig) -> Self {
        let tokens = TokenService::new(auth);
        Self {
            users: UserService::new(store.clone(), tokens),
            players: ResourceService::players(store.clone()),
            events: ResourceService::events(store.clone()),
            store,
        }
    }

    /// File-backed platform rooted at `core.data_dir`.
    pub fn from_config(core: &CoreConfig, auth: &AuthConfig) -> Self {
        let audit = AuditLog::new(core.log_file.clone());
        Self::new(CollectionStore::json_files(core.data_dir.clone(), audit), auth)
    }

    pub fn audit(&self) -> &AuditLog {
        self.store.audit()
    }

    pub fn tokens(&self) -> &TokenService {
        self.users.tokens()
    }
}
