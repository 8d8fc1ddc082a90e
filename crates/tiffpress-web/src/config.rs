//! Server configuration
//!
//! Values come from the process environment (after loading an optional `.env`
//! file). Every setting has a default, so an empty environment is valid.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{bail, Context};
use tiffpress_core::{CompressError, SizeBudget, Staging, TargetDimensions};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WIDTH: u32 = 1024;
const DEFAULT_HEIGHT: u32 = 768;
const DEFAULT_MAX_OUTPUT_MB: u64 = 3;
const DEFAULT_MAX_UPLOAD_MB: usize = 2048;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Width used when the form leaves it empty.
    pub default_width: u32,
    /// Height used when the form leaves it empty.
    pub default_height: u32,
    /// Per-image JPEG ceiling.
    pub max_output: SizeBudget,
    /// Request body ceiling for one upload batch.
    pub max_upload_bytes: usize,
    pub staging: Staging,
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            max_output: SizeBudget::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            staging: Staging::Memory,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port_var = lookup("TIFFPRESS_PORT").map(|v| ("TIFFPRESS_PORT", v));
        let port_var = port_var.or_else(|| lookup("PORT").map(|v| ("PORT", v)));
        let port = match port_var {
            Some((key, value)) => parse_var(key, &value)?,
            None => defaults.port,
        };

        let max_output_mb: u64 = parse_or(&lookup, "TIFFPRESS_MAX_OUTPUT_MB", DEFAULT_MAX_OUTPUT_MB)?;
        let max_output = SizeBudget::from_megabytes(max_output_mb)
            .context("TIFFPRESS_MAX_OUTPUT_MB must be greater than zero")?;

        let max_upload_mb: usize =
            parse_or(&lookup, "TIFFPRESS_MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?;
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .context("TIFFPRESS_MAX_UPLOAD_MB is too large")?;

        let staging = match lookup("TIFFPRESS_STAGING") {
            Some(value) => value
                .parse::<Staging>()
                .map_err(anyhow::Error::msg)
                .context("Invalid TIFFPRESS_STAGING")?,
            None => defaults.staging,
        };

        let config = Self {
            host: lookup("TIFFPRESS_HOST").unwrap_or(defaults.host),
            port,
            default_width: parse_or(&lookup, "TIFFPRESS_DEFAULT_WIDTH", DEFAULT_WIDTH)?,
            default_height: parse_or(&lookup, "TIFFPRESS_DEFAULT_HEIGHT", DEFAULT_HEIGHT)?,
            max_output,
            max_upload_bytes,
            staging,
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or(defaults.environment),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.default_dimensions()
            .context("Invalid TIFFPRESS_DEFAULT_WIDTH / TIFFPRESS_DEFAULT_HEIGHT")?;
        if self.max_upload_bytes == 0 {
            bail!("TIFFPRESS_MAX_UPLOAD_MB must be greater than zero");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Output size used for form fields left empty.
    pub fn default_dimensions(&self) -> Result<TargetDimensions, CompressError> {
        TargetDimensions::new(self.default_width, self.default_height)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid {key}={value:?}: {e}"))
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => parse_var(key, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!((config.default_width, config.default_height), (1024, 768));
        assert_eq!(config.max_output.bytes(), 3 * 1024 * 1024);
        assert_eq!(config.max_upload_bytes, 2048 * 1024 * 1024);
        assert_eq!(config.staging, Staging::Memory);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TIFFPRESS_HOST", "127.0.0.1"),
            ("TIFFPRESS_PORT", "9000"),
            ("TIFFPRESS_DEFAULT_WIDTH", "800"),
            ("TIFFPRESS_DEFAULT_HEIGHT", "600"),
            ("TIFFPRESS_MAX_OUTPUT_MB", "1"),
            ("TIFFPRESS_MAX_UPLOAD_MB", "64"),
            ("TIFFPRESS_STAGING", "tempdir"),
            ("ENVIRONMENT", "Production"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.default_dimensions().unwrap(), TargetDimensions::new(800, 600).unwrap());
        assert_eq!(config.max_output.bytes(), 1024 * 1024);
        assert_eq!(config.max_upload_bytes, 64 * 1024 * 1024);
        assert_eq!(config.staging, Staging::TempDir);
        assert!(config.is_production());
    }

    #[test]
    fn test_port_fallback() {
        let config = config_from(&[("PORT", "3000")]).unwrap();
        assert_eq!(config.port, 3000);

        let config = config_from(&[("PORT", "3000"), ("TIFFPRESS_PORT", "4000")]).unwrap();
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = config_from(&[("TIFFPRESS_DEFAULT_WIDTH", "wide")]).unwrap_err();
        assert!(err.to_string().contains("TIFFPRESS_DEFAULT_WIDTH"), "{err}");

        let err = config_from(&[("TIFFPRESS_STAGING", "cloud")]).unwrap_err();
        assert!(format!("{err:#}").contains("TIFFPRESS_STAGING"), "{err:#}");
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(config_from(&[("TIFFPRESS_DEFAULT_HEIGHT", "0")]).is_err());
        assert!(config_from(&[("TIFFPRESS_DEFAULT_WIDTH", "70000")]).is_err());
        assert!(config_from(&[("TIFFPRESS_MAX_OUTPUT_MB", "0")]).is_err());
        assert!(config_from(&[("TIFFPRESS_MAX_UPLOAD_MB", "0")]).is_err());
    }
}
