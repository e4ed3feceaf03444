//! Web UI and JSON API front-end.
mod handler;
mod http;
mod page;
mod server;


pub use server::ApiServer;
