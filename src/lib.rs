/// SearchDeck - Search Relevance Admin Console
///
/// Core library providing the relevance matcher, search preview
/// orchestration, engine client, and HTTP API for managing synonym and
/// curated-override rules on a hosted search engine.

pub mod config;
pub mod core;
pub mod database;
pub mod engine;
pub mod server;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
