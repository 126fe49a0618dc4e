//! Configuration loading from TOML (std only).

use core::fmt::Write;
use std::fs;
use std::path::Path;

use crate::error::{Error, InvalidArgument, Result};

use super::{validate_config, SystemConfig};

/// Load and validate a system configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SystemConfig> {
    let contents = fs::read_to_string(path).map_err(|_| Error::Io)?;
    parse_config(&contents)
}

/// Parse and validate a system configuration from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<SystemConfig> {
    let config: SystemConfig = toml::from_str(toml_str).map_err(|e| {
        let mut msg = heapless::String::<128>::new();
        let _ = write!(msg, "{}", e);
        Error::InvalidArgument(InvalidArgument::ParseError(msg))
    })?;

    validate_config(&config)?;
    Ok(config)
}
