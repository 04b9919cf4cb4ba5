pub mod analyzer;
pub mod config;
pub mod editor;
pub mod error;
pub mod model;
pub mod server;
pub mod splitter;
pub mod util;
