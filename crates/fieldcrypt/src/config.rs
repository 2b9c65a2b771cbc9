//! Configuration loading and validation for the field encryption service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any variable is missing or invalid.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Deployment mode. Decides which key source may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Production,
    Development,
    Test,
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuntimeMode::Production => "production",
            RuntimeMode::Development => "development",
            RuntimeMode::Test => "test",
        })
    }
}

/// Where encryption keys come from, as decided by [`Config::key_source`].
#[derive(Clone, PartialEq, Eq)]
pub enum KeySourceSetting {
    /// KMS data keys under `key_id`.
    Managed {
        key_id: String,
        endpoint: Option<String>,
    },
    /// Key derived from a development secret (`None` = built-in default).
    Derived { secret: Option<String> },
}

impl fmt::Debug for KeySourceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySourceSetting::Managed { key_id, endpoint } => f
                .debug_struct("Managed")
                .field("key_id", key_id)
                .field("endpoint", endpoint)
                .finish(),
            KeySourceSetting::Derived { secret } => f
                .debug_struct("Derived")
                .field("secret", &secret.as_ref().map(|_| "[REDACTED]"))
                .finish(),
        }
    }
}

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// `production`, `development` or `test`.
    #[serde(default = "default_runtime_mode")]
    pub runtime_mode: RuntimeMode,

    /// KMS key ID or alias for data key generation. **Required in production.**
    #[serde(default)]
    pub kms_key_id: Option<String>,

    /// Optional KMS endpoint URL override.
    #[serde(default)]
    pub aws_kms_endpoint: Option<String>,

    /// Secret hashed into the development key. Rejected in production.
    #[serde(default)]
    pub dev_encryption_secret: Option<String>,

    /// Emit key-versioned envelopes.
    #[serde(default = "default_versioned_envelopes")]
    pub versioned_envelopes: bool,

    /// Key versions retained for decryption, including the active one.
    #[serde(default = "default_max_key_versions")]
    pub max_key_versions: usize,

    /// Background rotation interval in seconds; `0` disables it.
    #[serde(default)]
    pub key_rotation_interval_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// OTLP gRPC endpoint for span export. Logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_runtime_mode() -> RuntimeMode {
    RuntimeMode::Development
}
fn default_versioned_envelopes() -> bool {
    true
}
fn default_max_key_versions() -> usize {
    5
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Decide the key source for this configuration.
    ///
    /// Production always yields [`KeySourceSetting::Managed`]; [`Config::validate`]
    /// guarantees the key ID is present.
    pub fn key_source(&self) -> KeySourceSetting {
        match self.runtime_mode {
            RuntimeMode::Production => KeySourceSetting::Managed {
                key_id: self.kms_key_id.clone().unwrap_or_default(),
                endpoint: self.aws_kms_endpoint.clone(),
            },
            RuntimeMode::Development | RuntimeMode::Test => KeySourceSetting::Derived {
                secret: self.dev_encryption_secret.clone(),
            },
        }
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty_if_set(&self.kms_key_id, "KMS_KEY_ID")?;
        ensure_non_empty_if_set(&self.aws_kms_endpoint, "AWS_KMS_ENDPOINT")?;
        ensure_non_empty_if_set(&self.dev_encryption_secret, "DEV_ENCRYPTION_SECRET")?;
        ensure_non_empty_if_set(
            &self.otel_exporter_otlp_endpoint,
            "OTEL_EXPORTER_OTLP_ENDPOINT",
        )?;

        if self.runtime_mode == RuntimeMode::Production {
            if self.kms_key_id.is_none() {
                anyhow::bail!("KMS_KEY_ID is required when RUNTIME_MODE=production");
            }
            if self.dev_encryption_secret.is_some() {
                anyhow::bail!("DEV_ENCRYPTION_SECRET must not be set when RUNTIME_MODE=production");
            }
        }
        if self.max_key_versions == 0 {
            anyhow::bail!("MAX_KEY_VERSIONS must be > 0");
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("runtime_mode", &self.runtime_mode)
            .field("kms_key_id", &self.kms_key_id)
            .field("aws_kms_endpoint", &self.aws_kms_endpoint)
            .field(
                "dev_encryption_secret",
                &self.dev_encryption_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("versioned_envelopes", &self.versioned_envelopes)
            .field("max_key_versions", &self.max_key_versions)
            .field("key_rotation_interval_secs", &self.key_rotation_interval_secs)
            .field("listen_port", &self.listen_port)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty_if_set(value: &Option<String>, name: &str) -> Result<()> {
    if let Some(v) = value {
        if v.trim().is_empty() {
            anyhow::bail!("{name} must not be empty when set");
        }
    }
    Ok(())
}
