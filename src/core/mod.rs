//! Core domain logic: relevance rules, the query-to-rule matcher, the search
//! preview state machine, caches, and session lifecycle.

pub mod cache;
pub mod logging;
pub mod matcher;
pub mod preview;
pub mod rules;
pub mod session;
