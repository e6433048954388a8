pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod output;
pub mod parser;
pub mod session;
pub mod stats;
