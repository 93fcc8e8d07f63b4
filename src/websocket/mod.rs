pub mod connection;
pub mod handler;
pub mod types;

pub use connection::RoomRegistry;
pub use handler::ws_handler;
