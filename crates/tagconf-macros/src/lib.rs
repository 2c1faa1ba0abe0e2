//! Derive macro for tagconf records.
//!
//! `#[derive(Record)]` turns a struct with named fields into a record the
//! tagconf decoder can fill. Every field annotated with `#[config(...)]`
//! gets a static descriptor; fields without the attribute are left alone.
//!
//! # Example
//!
//! ```rust,ignore
//! use tagconf::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct Server {
//!     #[config(yaml = "host", json = "host", validate = "required")]
//!     host: String,
//!     #[config(key = "port", default = "8080", validate = ">0")]
//!     port: u16,
//!     #[config(yaml = "tls")]
//!     tls: Tls,
//! }
//! ```
//!
//! # Attributes
//!
//! On fields:
//! - `validate = "..."`: comma-separated validation rules
//! - `default = "..."`: YAML literal used when the key is absent
//! - any other `name = "key"`: the source key for tag `name`; `key` is used
//!   for every tag name without its own entry
//!
//! On the struct:
//! - `crate = "path"`: path to the runtime crate, `::tagconf` by default

mod parse;
mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives `Record`, `Field` and `Element` for a struct with named fields.
///
/// The struct must implement `Default` and have no generic parameters.
#[proc_macro_derive(Record, attributes(config))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
