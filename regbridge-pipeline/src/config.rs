//! Configuration traits and utilities.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::LoggingConfig;
use crate::error::{BridgeError, Result};
use crate::pipeline::PipelineSettings;

/// Trait for bridge configuration types.
///
/// Implement this trait for a bridge's configuration struct to get
/// loading, validation, and access to the fields the pipeline needs.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use regbridge_pipeline::{BridgeConfig, LoggingConfig, PipelineSettings};
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyBridgeConfig {
///     pub logging: LoggingConfig,
///     pub pipeline: PipelineSettings,
///     pub registers: Vec<RegisterDescriptor>,
/// }
///
/// impl BridgeConfig for MyBridgeConfig {
///     fn logging(&self) -> &LoggingConfig {
///         &self.logging
///     }
///
///     fn pipeline(&self) -> &PipelineSettings {
///         &self.pipeline
///     }
/// }
/// ```
pub trait BridgeConfig: Sized + DeserializeOwned {
    /// Get the logging configuration.
    fn logging(&self) -> &LoggingConfig;

    /// Get the pipeline timing and sizing settings.
    fn pipeline(&self) -> &PipelineSettings;

    /// Validate the configuration.
    ///
    /// Called automatically after loading. The default checks the pipeline
    /// settings; override to add bridge-specific checks.
    fn validate(&self) -> Result<()> {
        self.pipeline().validate()
    }

    /// Load configuration from a JSON5 string and validate it.
    fn parse(content: &str) -> Result<Self> {
        let config: Self = regbridge_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    ///
    /// Supports JSON5 format. Calls [`validate`](Self::validate) after loading.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let config: Self = regbridge_common::load_config(path)?;
        config.validate()?;
        Ok(config)
    }
}
