//! Listening side: [`Server`] accepts connections and hands each one to an
//! [`HttpConnection`](crate::connection::HttpConnection) task, configured by
//! [`ServerConfig`].

mod config;
#[expect(clippy::module_inception, reason = "the module is named after the type it holds")]
mod server;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use server::Server;
