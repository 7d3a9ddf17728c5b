//! Typed, namespaced configuration registry.
//!
//! Applications register sections of typed fields under a namespace; callers
//! read and write them by `namespace.section.field` paths through the
//! [`accessor::ConfigAccessor`]. Values are persisted through a
//! [`StoreAdapter`](sysconfig_types::store_adapter::StoreAdapter), cached,
//! validated before every write and encrypted at rest for secret fields.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod accessor;
pub mod app;
pub mod cache;
pub mod display;
pub mod encryption;
pub mod logging;
pub mod memory_store;
pub mod prelude;
pub mod registry;
pub mod validator;
pub mod value_type;

pub use app::{SysConfig, SysConfigBuilder, SysConfigOpts};
pub use sysconfig_types::{cache_adapter, error, path, store_adapter, types};

// vim: ts=4
