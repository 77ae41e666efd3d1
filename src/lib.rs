//! # movierama-sync
//!
//! Client-side state synchronization for the Movierama service: two
//! independently paginated movie feeds, a per-viewer vote cache reconciled
//! against server responses, and a session whose credential is torn down
//! when the service rejects it.
//!
//! [`MovieStore`] is the entry point. It talks to the service through a
//! [`Transport`]; [`HttpTransport`] is the production one.

pub mod config;
pub mod enums;
pub mod interceptor;
pub mod models;
pub mod pagination;
pub mod session;
pub mod store;
pub mod traits;
pub mod transport;
pub mod vote_cache;

// Re-export core traits
pub use traits::{ClientError, CredentialStore, Transport};

pub use config::ClientConfig;
pub use enums::{Sort, SortDirection, SortField, View, VoteType};
pub use interceptor::Api;
pub use models::{Movie, MovieId, Page};
pub use pagination::ViewState;
pub use session::{decode_subject, ClaimsError, FileCredentialStore, MemoryCredentialStore, Session};
pub use store::MovieStore;
pub use transport::{ApiRequest, ApiResponse, HttpTransport};
pub use vote_cache::VoteCache;
