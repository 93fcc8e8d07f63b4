//! Client-side access to the portal: an HTTP backend, a local mock that can
//! stand in for it, and the facade that chooses between them.

pub mod api;
pub mod config;
pub mod connectivity;
pub mod facade;
pub mod live;
pub mod mock;
pub mod realtime;

pub use api::{ClientError, ClientResult, PortalBackend};
pub use config::ClientConfig;
pub use connectivity::{Connectivity, DataMode};
pub use facade::DataAccess;
pub use live::LiveBackend;
pub use mock::MockBackend;
pub use realtime::{RealtimeClient, RealtimeSubscription, ReconnectPolicy, TokenSource};
