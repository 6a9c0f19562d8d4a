// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::str::FromStr;

use crate::{ErrorKind, IpamError};

pub(crate) const ENV_COMMAND: &str = "CNI_COMMAND";
pub(crate) const ENV_CONTAINER_ID: &str = "CNI_CONTAINERID";
pub(crate) const ENV_NETNS: &str = "CNI_NETNS";
pub(crate) const ENV_IFNAME: &str = "CNI_IFNAME";
pub(crate) const ENV_ARGS: &str = "CNI_ARGS";
pub(crate) const ENV_PATH: &str = "CNI_PATH";

const PATH_LIST_SEPARATOR: char = ':';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CniCommand {
    Add,
    Del,
    Check,
    Version,
}

impl std::fmt::Display for CniCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Add => "ADD",
                Self::Del => "DEL",
                Self::Check => "CHECK",
                Self::Version => "VERSION",
            }
        )
    }
}

impl FromStr for CniCommand {
    type Err = IpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADD" => Ok(Self::Add),
            "DEL" => Ok(Self::Del),
            "CHECK" => Ok(Self::Check),
            "VERSION" => Ok(Self::Version),
            _ => Err(IpamError::new(
                ErrorKind::InvalidEnvironment,
                format!("unknown {ENV_COMMAND} \"{s}\""),
            )),
        }
    }
}

impl CniCommand {
    pub fn from_env() -> Result<Self, IpamError> {
        match std::env::var(ENV_COMMAND) {
            Ok(s) => s.parse(),
            Err(_) => Err(IpamError::new(
                ErrorKind::InvalidEnvironment,
                format!("required env variables [{ENV_COMMAND}] missing"),
            )),
        }
    }

    fn required_envs(&self) -> &'static [&'static str] {
        match self {
            Self::Add | Self::Check => {
                &[ENV_CONTAINER_ID, ENV_NETNS, ENV_IFNAME, ENV_PATH]
            }
            Self::Del => &[ENV_CONTAINER_ID, ENV_IFNAME, ENV_PATH],
            Self::Version => &[],
        }
    }
}

/// Arguments of one plugin invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct CmdArgs {
    pub container_id: String,
    pub netns: String,
    pub if_name: String,
    /// Raw `CNI_ARGS`, `KEY1=VAL1;KEY2=VAL2`.
    pub args: String,
    /// Raw `CNI_PATH`, colon separated plugin folders.
    pub path: String,
    /// Network configuration read from STDIN.
    pub stdin_data: Vec<u8>,
}

impl CmdArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the invocation arguments from `CNI_*` environment
    /// variables, failing when any variable required by `command` is
    /// unset or empty.
    pub fn from_env(
        command: CniCommand,
        stdin_data: Vec<u8>,
    ) -> Result<Self, IpamError> {
        Self::from_env_lookup(command, stdin_data, |k| std::env::var(k).ok())
    }

    pub(crate) fn from_env_lookup<F>(
        command: CniCommand,
        stdin_data: Vec<u8>,
        lookup: F,
    ) -> Result<Self, IpamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing: Vec<&str> = command
            .required_envs()
            .iter()
            .copied()
            .filter(|k| lookup(*k).map(|v| v.is_empty()).unwrap_or(true))
            .collect();
        if !missing.is_empty() {
            return Err(IpamError::new(
                ErrorKind::InvalidEnvironment,
                format!(
                    "required env variables [{}] missing",
                    missing.join(",")
                ),
            ));
        }
        let get = |k: &str| lookup(k).unwrap_or_default();
        Ok(Self {
            container_id: get(ENV_CONTAINER_ID),
            netns: get(ENV_NETNS),
            if_name: get(ENV_IFNAME),
            args: get(ENV_ARGS),
            path: get(ENV_PATH),
            stdin_data,
        })
    }

    /// Folders listed in `CNI_PATH`, in order.
    pub fn plugin_paths(&self) -> Vec<PathBuf> {
        self.path
            .split(PATH_LIST_SEPARATOR)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Environment overrides for a plugin this invocation delegates to.
    pub fn plugin_env(&self, command: CniCommand) -> Vec<(String, String)> {
        vec![
            (ENV_COMMAND.to_string(), command.to_string()),
            (ENV_CONTAINER_ID.to_string(), self.container_id.clone()),
            (ENV_NETNS.to_string(), self.netns.clone()),
            (ENV_IFNAME.to_string(), self.if_name.clone()),
            (ENV_ARGS.to_string(), self.args.clone()),
            (ENV_PATH.to_string(), self.path.clone()),
        ]
    }
}
