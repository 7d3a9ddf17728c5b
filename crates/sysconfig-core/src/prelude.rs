pub use sysconfig_types::prelude::*;
pub use sysconfig_types::store_adapter::{StoreAdapter, StoredValue};

// vim: ts=4
