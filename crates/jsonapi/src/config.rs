//! Codec configuration.
//!
//! Services embedding the codec usually want its decode policy configurable
//! without a rebuild. [`CodecConfig`] reads it from command line flags or
//! environment variables and turns it into [`DecodeOptions`] and a
//! [`TypeRegistryBuilder`].
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JSONAPI_ALLOW_GENERIC` | false | Build generic nodes for unregistered types |
//! | `JSONAPI_DUPLICATE_POLICY` | last-write-wins | `last-write-wins` or `reject` |
//! | `JSONAPI_FAIL_FAST` | false | Abort a decode on its first invalid resource |
//! | `JSONAPI_STRICT_INCLUDES` | false | Report orphaned includes and unresolved lids |
//! | `JSONAPI_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use helios_jsonapi::{CodecConfig, DuplicatePolicy};
//!
//! let config = CodecConfig {
//!     duplicate_policy: DuplicatePolicy::Reject,
//!     strict_includes: true,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert!(config.decode_options().strict_includes);
//! ```

use clap::Parser;

use crate::decode::{DecodeOptions, DuplicatePolicy};
use crate::error::JsonApiError;
use crate::registry::{TypeRegistry, TypeRegistryBuilder};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Decode policy and logging settings for the JSON:API codec.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "jsonapi-codec")]
#[command(about = "JSON:API resource graph codec")]
pub struct CodecConfig {
    /// Build generic nodes for types without a registered kind.
    #[arg(long, env = "JSONAPI_ALLOW_GENERIC", default_value = "false")]
    pub allow_generic: bool,

    /// How to treat two resources with the same identity in one document.
    #[arg(
        long,
        env = "JSONAPI_DUPLICATE_POLICY",
        value_enum,
        default_value_t = DuplicatePolicy::LastWriteWins
    )]
    pub duplicate_policy: DuplicatePolicy,

    /// Abort a decode on its first invalid resource.
    #[arg(long, env = "JSONAPI_FAIL_FAST", default_value = "false")]
    pub fail_fast: bool,

    /// Report included resources nothing links to, and lid linkage with no matching resource.
    #[arg(long, env = "JSONAPI_STRICT_INCLUDES", default_value = "false")]
    pub strict_includes: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "JSONAPI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            allow_generic: false,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            fail_fast: false,
            strict_includes: false,
            log_level: "info".to_string(),
        }
    }
}

impl CodecConfig {
    /// Creates a configuration from `JSONAPI_*` environment variables.
    ///
    /// Command line arguments of the host process are not read. An unset
    /// variable takes its default; a value that cannot be parsed is an error.
    pub fn from_env() -> Result<Self, JsonApiError> {
        Self::try_parse_from([env!("CARGO_PKG_NAME")])
            .map_err(|err| JsonApiError::Config(vec![err.to_string().trim_end().to_string()]))
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "Unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            allow_generic: self.allow_generic,
            duplicate_policy: self.duplicate_policy,
            fail_fast: self.fail_fast,
            strict_includes: self.strict_includes,
        }
    }

    /// A registry builder with the configured generic policy.
    pub fn registry_builder(&self) -> TypeRegistryBuilder {
        TypeRegistry::builder().allow_generic(self.allow_generic)
    }
}
