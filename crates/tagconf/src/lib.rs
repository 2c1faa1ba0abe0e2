//! Load YAML and JSON configuration into tagged Rust structs.
//!
//! tagconf fills plain structs from configuration documents, driven by
//! per-field attributes:
//! - Source keys per document format (`yaml = "..."`, `json = "..."`)
//! - Default literals for absent keys
//! - Validation rules (`required`, `>0`, `<=10`, `len=3`)
//!
//! Every problem in a document is reported at once, and fields the document
//! does not mention keep whatever value the struct already held.
//!
//! # Example
//!
//! ```
//! use tagconf::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Database {
//!     #[config(yaml = "url", validate = "required")]
//!     url: String,
//!     #[config(yaml = "pool_size", default = "10", validate = ">0,<=100")]
//!     pool_size: u32,
//! }
//!
//! #[derive(Debug, Default, Record)]
//! struct AppConfig {
//!     #[config(yaml = "name", validate = "required,len<=32")]
//!     name: String,
//!     #[config(yaml = "database")]
//!     database: Database,
//!     #[config(yaml = "features")]
//!     features: Vec<String>,
//! }
//!
//! let yaml = r#"
//! name: billing
//! database:
//!   url: postgres://localhost/billing
//! features: [invoices, refunds]
//! "#;
//!
//! let mut config = AppConfig::default();
//! tagconf::from_yaml_str(yaml, &mut config).unwrap();
//!
//! assert_eq!(config.database.pool_size, 10);
//! assert_eq!(config.features.len(), 2);
//! ```
//!
//! # Validation Errors
//!
//! ```
//! use tagconf::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Limits {
//!     #[config(json = "min", validate = ">=0")]
//!     min: i32,
//!     #[config(json = "max", validate = "required")]
//!     max: i32,
//! }
//!
//! let mut limits = Limits::default();
//! let err = tagconf::from_json_str(r#"{"min": -1}"#, &mut limits).unwrap_err();
//!
//! assert_eq!(err.decode_errors().map(|errors| errors.len()), Some(2));
//! ```

#![warn(missing_docs)]

mod error;
mod loader;

use std::io::Read;
use std::path::Path;

pub use error::{LoadError, LoadResult};
pub use loader::{Format, Loader};
pub use tagconf_core::*;
pub use tagconf_core::Record;
pub use tagconf_macros::Record;

/// Fills `record` from a YAML string.
pub fn from_yaml_str<R: Record>(content: &str, record: &mut R) -> LoadResult<()> {
    yaml().load_str(content, record)
}

/// Fills `record` from YAML bytes.
pub fn from_yaml_slice<R: Record>(content: &[u8], record: &mut R) -> LoadResult<()> {
    yaml().load_slice(content, record)
}

/// Fills `record` from a YAML reader.
pub fn from_yaml_reader<R: Record>(reader: impl Read, record: &mut R) -> LoadResult<()> {
    yaml().load_reader(reader, record)
}

/// Fills `record` from a YAML file, relative to the working directory.
pub fn from_yaml_file<R: Record>(path: impl AsRef<Path>, record: &mut R) -> LoadResult<()> {
    yaml().load_file(path, record)
}

/// Fills `record` from a JSON string.
pub fn from_json_str<R: Record>(content: &str, record: &mut R) -> LoadResult<()> {
    json().load_str(content, record)
}

/// Fills `record` from JSON bytes.
pub fn from_json_slice<R: Record>(content: &[u8], record: &mut R) -> LoadResult<()> {
    json().load_slice(content, record)
}

/// Fills `record` from a JSON reader.
pub fn from_json_reader<R: Record>(reader: impl Read, record: &mut R) -> LoadResult<()> {
    json().load_reader(reader, record)
}

/// Fills `record` from a JSON file, relative to the working directory.
pub fn from_json_file<R: Record>(path: impl AsRef<Path>, record: &mut R) -> LoadResult<()> {
    json().load_file(path, record)
}

fn yaml() -> Loader {
    Loader::new().with_format(Format::Yaml)
}

fn json() -> Loader {
    Loader::new().with_format(Format::Json)
}
