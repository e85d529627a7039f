//! Client-side state store: holds the auth session and the FAQ page a UI is showing, and
//! performs every HTTP call against the portal.

pub mod api;
pub mod session;
pub mod store;

pub use api::{ApiClient, ClientError, FaqQuery};
pub use session::{FileSessionStorage, MemorySessionStorage, PersistedSession, SessionStorage};
pub use store::{ClientStore, OpResult};
