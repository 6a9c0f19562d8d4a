// SPDX-License-Identifier: Apache-2.0

use cni_ipam::{CniError, ErrorKind, IpamError};

pub(crate) const DEFAULT_ERROR_CODE: i32 = 1;

#[derive(Debug)]
pub(crate) struct CliError {
    pub(crate) code: i32,
    pub(crate) cni_code: u32,
    pub(crate) cni_version: String,
    pub(crate) error_msg: String,
}

impl Default for CliError {
    fn default() -> Self {
        Self {
            code: DEFAULT_ERROR_CODE,
            cni_code: ErrorKind::Bug.cni_code(),
            cni_version: String::new(),
            error_msg: String::new(),
        }
    }
}

impl CliError {
    pub(crate) fn with_cni_version(mut self, cni_version: &str) -> Self {
        if self.cni_version.is_empty() {
            self.cni_version = cni_version.to_string();
        }
        self
    }

    /// Error document to print on STDOUT for the container runtime.
    pub(crate) fn to_cni_error(&self) -> CniError {
        CniError::new(&self.cni_version, self.cni_code, self.error_msg.clone())
    }
}

impl From<&str> for CliError {
    fn from(msg: &str) -> Self {
        Self {
            error_msg: msg.into(),
            ..Default::default()
        }
    }
}

impl From<String> for CliError {
    fn from(error_msg: String) -> Self {
        Self {
            error_msg,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error_msg)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self {
            cni_code: ErrorKind::IoFailure.cni_code(),
            error_msg: format!("std::io::Error: {e}"),
            ..Default::default()
        }
    }
}

impl From<IpamError> for CliError {
    fn from(e: IpamError) -> Self {
        Self {
            cni_code: e.cni_code(),
            error_msg: e.msg().to_string(),
            ..Default::default()
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            cni_code: ErrorKind::DecodingFailure.cni_code(),
            error_msg: format!("serde_json::Error {e}"),
            ..Default::default()
        }
    }
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        Self {
            cni_code: ErrorKind::InvalidArgument.cni_code(),
            error_msg: format!("toml::de::Error {e}"),
            ..Default::default()
        }
    }
}

impl From<log::ParseLevelError> for CliError {
    fn from(e: log::ParseLevelError) -> Self {
        Self {
            cni_code: ErrorKind::InvalidArgument.cni_code(),
            error_msg: format!("Invalid log level: {e}"),
            ..Default::default()
        }
    }
}
