/// Core Module
///
/// - config.rs: environment-backed settings, loaded once at startup
/// - rpc.rs: JSON-RPC 2.0 envelope and method dispatch
/// - server.rs: HTTP and stdio transports

pub mod config;
pub mod rpc;
pub mod server;
