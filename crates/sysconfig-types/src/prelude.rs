pub use crate::error::{ClResult, Error, ValidationError};
pub use crate::path::{ConfigPath, SectionPath, StoreKey};
pub use crate::types::ConfigValue;

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
