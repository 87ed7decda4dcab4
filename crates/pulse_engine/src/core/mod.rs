//! Core engine modules
//!
//! Cross-cutting concerns shared by every subsystem, currently the unified
//! configuration types.

pub mod config;
