//! Pipeline configuration.
//!
//! Configuration comes from two JSON (or YAML) documents merged key-by-key:
//! 1. **Base** - `config.json`, required
//! 2. **Local** - `config-local.json`, optional developer override
//!
//! ## Merge Strategy
//! - Top-level keys in the local document replace base keys wholesale
//! - Keys absent locally keep their base value
//! - A local `null` means "not specified" and keeps the base value
//! - A base `null` falls back to the field default
//!
//! ## Environment Variables
//! - `THEME_PIPELINE_CONFIG` - Base config file (default: `config.json`)
//! - `THEME_PIPELINE_LOCAL_CONFIG` - Local config file (default: `config-local.json`)

mod loader;
mod merge;
mod types;

pub use loader::{
    BASE_CONFIG_FILE, ConfigLoader, ConfigPaths, ConfigTier, LOCAL_CONFIG_FILE, load_document,
};
pub use merge::{shallow_merge, strip_nulls};
pub use types::*;
