//! Inbound IPC: newline-delimited JSON commands over a Unix socket, feeding the
//! two availability entry points and the tree queries.

pub mod commands;
pub mod messages;
pub mod server;

pub use commands::handle_request;
pub use messages::Response;
pub use server::IpcServer;
