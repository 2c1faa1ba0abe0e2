//! Document loading.
//!
//! This module provides the [`Loader`], which parses a YAML or JSON
//! document, checks that its top level is a mapping and hands the mapping to
//! the record decoder.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tagconf_core::{Decoder, JsonValue, LazyValue, Record, SourceMap, ValidatorCache, YamlValue};

use crate::{LoadError, LoadResult};

/// Format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl Format {
    /// Tag name used to look up source keys for this format.
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// Infers the format from a file extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Infers the format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

impl FromStr for Format {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| LoadError::unsupported_format(s))
    }
}

/// Configuration loader.
///
/// The loader picks the document format (explicitly, or from the file
/// extension), parses the document and fills a record with it. The tag name
/// defaults to the format's name (`yaml` or `json`).
///
/// # Example
///
/// ```
/// use tagconf::{Format, Loader, Record};
///
/// #[derive(Debug, Default, Record)]
/// struct Server {
///     #[config(key = "port", validate = "required,>0")]
///     port: u16,
/// }
///
/// let mut server = Server::default();
/// Loader::new()
///     .with_format(Format::Json)
///     .load_str(r#"{"port": 8080}"#, &mut server)
///     .unwrap();
///
/// assert_eq!(server.port, 8080);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    format: Option<Format>,
    tag_name: Option<String>,
    cache: Option<Arc<ValidatorCache>>,
}

impl Loader {
    /// Create a new loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `format` regardless of file extension.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Select source keys with `tag_name` instead of the format's name.
    #[must_use]
    pub fn with_tag(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    /// Compile validators into `cache` instead of the global cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ValidatorCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load a record from a string.
    ///
    /// Uses YAML unless another format was selected.
    pub fn load_str<R: Record>(&self, content: &str, record: &mut R) -> LoadResult<()> {
        match self.format_or_yaml() {
            Format::Yaml => {
                let document: serde_yaml::Value = serde_yaml::from_str(content)?;
                self.fill_yaml(document, record)
            }
            Format::Json => {
                let document: serde_json::Value = serde_json::from_str(content)?;
                self.fill_json(document, record)
            }
        }
    }

    /// Load a record from raw bytes.
    pub fn load_slice<R: Record>(&self, content: &[u8], record: &mut R) -> LoadResult<()> {
        match self.format_or_yaml() {
            Format::Yaml => {
                let document: serde_yaml::Value = serde_yaml::from_slice(content)?;
                self.fill_yaml(document, record)
            }
            Format::Json => {
                let document: serde_json::Value = serde_json::from_slice(content)?;
                self.fill_json(document, record)
            }
        }
    }

    /// Load a record from a reader.
    pub fn load_reader<R: Record>(&self, reader: impl Read, record: &mut R) -> LoadResult<()> {
        match self.format_or_yaml() {
            Format::Yaml => {
                let document: serde_yaml::Value = serde_yaml::from_reader(reader)?;
                self.fill_yaml(document, record)
            }
            Format::Json => {
                let document: serde_json::Value = serde_json::from_reader(reader)?;
                self.fill_json(document, record)
            }
        }
    }

    /// Load a record from a file.
    ///
    /// Relative paths are resolved against the current working directory.
    /// Without an explicit format, the file extension decides.
    pub fn load_file<R: Record>(&self, path: impl AsRef<Path>, record: &mut R) -> LoadResult<()> {
        let path = resolve(path.as_ref())?;
        let format = match self.format.or_else(|| Format::from_path(&path)) {
            Some(format) => format,
            None => return Err(LoadError::unsupported_format(path.display().to_string())),
        };

        if !path.exists() {
            return Err(LoadError::file_not_found(path));
        }

        tracing::debug!(path = %path.display(), %format, "loading configuration file");
        let content = fs::read(&path).map_err(|e| LoadError::read_error(&path, e))?;

        self.clone().with_format(format).load_slice(&content, record)
    }

    /// Load a record from a file if it exists.
    ///
    /// Returns `false` and leaves the record untouched when the file is
    /// missing.
    pub fn load_optional_file<R: Record>(
        &self,
        path: impl AsRef<Path>,
        record: &mut R,
    ) -> LoadResult<bool> {
        let path = resolve(path.as_ref())?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "optional configuration file not found");
            return Ok(false);
        }
        self.load_file(path, record)?;
        Ok(true)
    }

    fn format_or_yaml(&self) -> Format {
        self.format.unwrap_or(Format::Yaml)
    }

    fn decoder(&self, format: Format) -> Decoder {
        let builder = Decoder::builder().tag_name(
            self.tag_name
                .clone()
                .unwrap_or_else(|| format.tag_name().to_owned()),
        );
        let builder = match &self.cache {
            Some(cache) => builder.cache(Arc::clone(cache)),
            None => builder,
        };
        builder.build()
    }

    fn fill_yaml<R: Record>(&self, document: serde_yaml::Value, record: &mut R) -> LoadResult<()> {
        // A null document is an empty mapping.
        if document.is_null() {
            return self.fill(Format::Yaml, &SourceMap::<YamlValue>::new(), record);
        }
        if !document.is_mapping() {
            return Err(LoadError::not_a_mapping(YamlValue(document).type_name()));
        }
        let source = YamlValue::source_map(document).unwrap_or_default();
        self.fill(Format::Yaml, &source, record)
    }

    fn fill_json<R: Record>(&self, document: serde_json::Value, record: &mut R) -> LoadResult<()> {
        if !document.is_object() {
            return Err(LoadError::not_a_mapping(JsonValue(document).type_name()));
        }
        let source = JsonValue::source_map(document).unwrap_or_default();
        self.fill(Format::Json, &source, record)
    }

    fn fill<R: Record, L: LazyValue>(
        &self,
        format: Format,
        source: &SourceMap<L>,
        record: &mut R,
    ) -> LoadResult<()> {
        self.decoder(format).decode(record, source)?;
        Ok(())
    }
}

fn resolve(path: &Path) -> LoadResult<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
