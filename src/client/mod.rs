//! Client-side session handling for consumers of the HTTP API.

pub mod api;
pub mod session;
pub mod store;

pub use api::{ApiClient, ClientError};
pub use session::Session;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
