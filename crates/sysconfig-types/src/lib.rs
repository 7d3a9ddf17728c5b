//! Shared types, collaborator traits, and core utilities for sysconfig.
//!
//! This crate contains the foundational types shared between the registry
//! crate and the store/cache implementations. Keeping them separate lets
//! store adapters compile without pulling in the registry itself.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod cache_adapter;
pub mod error;
pub mod path;
pub mod prelude;
pub mod store_adapter;
pub mod types;

// vim: ts=4
