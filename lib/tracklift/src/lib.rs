pub mod apple_music;
pub mod batch;
pub mod credential;
pub mod error;
pub mod migration;
pub mod resolver;
pub mod spotify;
pub mod traits;

pub use batch::{BatchWriter, DEFAULT_MAX_BATCH_SIZE};
pub use credential::AccessToken;
pub use migration::{Migration, MigrationConfig, MigrationFailure, SearchFailurePolicy};
pub use resolver::{MatchPolicy, TrackResolver};
pub use traits::{Authorizer, DestinationCatalog, SourceCatalog};
