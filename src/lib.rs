//! staticd - Static File Server
//!
//! Core library: request parsing, file resolution, response building and
//! the bounded accept/worker loop that ties them together.

pub mod cli;
pub mod config;
pub mod files;
pub mod http;
pub mod server;
