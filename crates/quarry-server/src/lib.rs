pub mod auth;
pub mod launch;
pub mod server;
