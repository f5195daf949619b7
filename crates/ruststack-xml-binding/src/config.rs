//! Codec configuration.
//!
//! Provides [`CodecConfig`] for tuning serialization and parsing. Values can be
//! loaded from environment variables via [`CodecConfig::from_env`].

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Serialization and parsing options.
///
/// # Examples
///
/// ```
/// use ruststack_xml_binding::CodecConfig;
///
/// let config = CodecConfig::default();
/// assert!(config.xml_declaration);
/// assert!(!config.mtom_enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CodecConfig {
    /// Emit `<?xml version="1.0" encoding="UTF-8"?>` before whole documents.
    #[builder(default = true)]
    pub xml_declaration: bool,

    /// Send binary fields as MTOM attachments when an attachment sink is supplied.
    #[builder(default = false)]
    pub mtom_enabled: bool,

    /// Binaries shorter than this many bytes stay inline even with MTOM enabled.
    #[builder(default = 1024)]
    pub mtom_threshold: usize,

    /// Maximum record nesting accepted while parsing.
    #[builder(default = 64)]
    pub max_depth: usize,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            mtom_enabled: false,
            mtom_threshold: 1024,
            max_depth: 64,
            log_level: String::from("info"),
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `XMLBIND_XML_DECLARATION` | `true` |
    /// | `XMLBIND_MTOM_ENABLED` | `false` |
    /// | `XMLBIND_MTOM_THRESHOLD` | `1024` |
    /// | `XMLBIND_MAX_DEPTH` | `64` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// Unparseable numbers keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, using the variables of
    /// [`CodecConfig::from_env`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("XMLBIND_XML_DECLARATION") {
            config.xml_declaration = parse_bool(&v);
        }
        if let Some(v) = lookup("XMLBIND_MTOM_ENABLED") {
            config.mtom_enabled = parse_bool(&v);
        }
        if let Some(v) = lookup("XMLBIND_MTOM_THRESHOLD") {
            if let Ok(n) = v.parse::<usize>() {
                config.mtom_threshold = n;
            }
        }
        if let Some(v) = lookup("XMLBIND_MAX_DEPTH") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_depth = n;
            }
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}

/// Parse a string as a boolean, accepting `"1"`, `"true"` and `"yes"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}
