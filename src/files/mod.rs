//! Static file lookup
//!
//! This module maps request targets onto files under the configured web
//! root and loads them into memory.

pub mod resolver;

pub use resolver::{Resolved, StaticFiles};
