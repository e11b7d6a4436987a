//! Domains module containing business logic organized by bounded contexts.
//!
//! The server exposes a single domain: tools discovered from script files.

pub mod tools;
