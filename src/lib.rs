//! Shelf application library
//!
//! Resource modules (authors, books, articles, posts, comments), the generic
//! resource controller behind them, and the bootstrap wiring them into the
//! kernel and HTTP server.

pub mod app;
pub mod modules;
pub mod resource;
pub mod utils;
