// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidArgument,
    InvalidEnvironment,
    IncompatibleVersion,
    DecodingFailure,
    IoFailure,
    NotFound,
    PluginFailure,
    Bug,
}

impl ErrorKind {
    /// CNI well-known error code for this kind of failure.
    pub fn cni_code(&self) -> u32 {
        match self {
            ErrorKind::IncompatibleVersion => 1,
            ErrorKind::InvalidEnvironment => 4,
            ErrorKind::IoFailure | ErrorKind::NotFound => 5,
            ErrorKind::DecodingFailure => 6,
            ErrorKind::InvalidArgument => 7,
            ErrorKind::PluginFailure => 11,
            ErrorKind::Bug => 999,
        }
    }
}

impl Default for ErrorKind {
    fn default() -> Self {
        Self::Bug
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::fmt::Display for IpamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl Error for IpamError {}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct IpamError {
    kind: ErrorKind,
    msg: String,
    plugin_code: Option<u32>,
}

impl IpamError {
    pub fn new(kind: ErrorKind, msg: String) -> Self {
        Self {
            kind,
            msg,
            ..Default::default()
        }
    }

    /// Failure reported by a delegated plugin through a CNI error document.
    pub fn new_plugin_error(code: u32, msg: String) -> Self {
        Self {
            kind: ErrorKind::PluginFailure,
            msg,
            plugin_code: Some(code),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn msg(&self) -> &str {
        self.msg.as_str()
    }

    /// The error code reported by the failing plugin, if any.
    pub fn plugin_code(&self) -> Option<u32> {
        self.plugin_code
    }

    /// Code to report in the CNI error document: the plugin's own code
    /// when the failure came from a delegated plugin.
    pub fn cni_code(&self) -> u32 {
        self.plugin_code.unwrap_or_else(|| self.kind.cni_code())
    }
}

impl From<serde_json::Error> for IpamError {
    fn from(e: serde_json::Error) -> Self {
        IpamError::new(
            ErrorKind::DecodingFailure,
            format!("Invalid JSON: {e}"),
        )
    }
}

impl From<std::io::Error> for IpamError {
    fn from(e: std::io::Error) -> Self {
        IpamError::new(ErrorKind::IoFailure, format!("std::io::Error: {e}"))
    }
}
