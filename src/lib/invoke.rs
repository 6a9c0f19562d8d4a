// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Output, Stdio};

use crate::{
    cmd_args::ENV_COMMAND, CniCommand, CniError, ErrorKind, IpamError,
    PluginInfo,
};

// Reported by plugins built before the VERSION command existed.
const LEGACY_VERSION_UNKNOWN_MSG: &str = "unknown CNI_COMMAND: VERSION";

/// Runs an external CNI plugin binary.
pub trait PluginExec {
    /// Execute `plugin` feeding `stdin` to it, with `env` set on top of the
    /// inherited environment. Return the plugin STDOUT on success.
    fn exec_plugin(
        &self,
        plugin: &Path,
        stdin: &[u8],
        env: &[(String, String)],
    ) -> Result<Vec<u8>, IpamError>;
}

/// [PluginExec] spawning the plugin as a child process.
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct RawExec;

impl RawExec {
    pub fn new() -> Self {
        Self
    }
}

impl PluginExec for RawExec {
    fn exec_plugin(
        &self,
        plugin: &Path,
        stdin: &[u8],
        env: &[(String, String)],
    ) -> Result<Vec<u8>, IpamError> {
        log::debug!("Executing plugin {}", plugin.display());
        let mut child = Command::new(plugin)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                IpamError::new(
                    ErrorKind::IoFailure,
                    format!(
                        "Failed to execute plugin {}: {e}",
                        plugin.display()
                    ),
                )
            })?;
        // Fed from another thread so a plugin filling its STDOUT or STDERR
        // pipe before reading STDIN cannot block on us.
        let writer = child.stdin.take().map(|mut child_stdin| {
            let data = stdin.to_vec();
            std::thread::spawn(move || child_stdin.write_all(&data))
        });
        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => (),
                // Plugin may exit without consuming STDIN
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    log::debug!(
                        "Plugin {} closed STDIN early: {e}",
                        plugin.display()
                    );
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(IpamError::new(
                        ErrorKind::Bug,
                        format!(
                            "STDIN writer of plugin {} panicked",
                            plugin.display()
                        ),
                    ));
                }
            }
        }
        if !output.stderr.is_empty() {
            log::debug!(
                "Plugin {} STDERR: {}",
                plugin.display(),
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(plugin_failure(plugin, &output))
        }
    }
}

fn plugin_failure(plugin: &Path, output: &Output) -> IpamError {
    if let Ok(e) = serde_json::from_slice::<CniError>(&output.stdout) {
        return IpamError::new_plugin_error(
            e.code,
            format!("plugin {} failed: {e}", plugin.display()),
        );
    }
    let raw = if output.stdout.is_empty() {
        &output.stderr
    } else {
        &output.stdout
    };
    IpamError::new(
        ErrorKind::PluginFailure,
        format!(
            "plugin {} failed with {}: {}",
            plugin.display(),
            output.status,
            String::from_utf8_lossy(raw).trim_end()
        ),
    )
}

/// Search `dirs` in order for an executable file named `plugin`. The name
/// must be a bare file name, paths are refused.
pub fn find_in_path(
    plugin: &str,
    dirs: &[PathBuf],
) -> Result<PathBuf, IpamError> {
    if plugin.is_empty() {
        return Err(IpamError::new(
            ErrorKind::InvalidArgument,
            "no plugin name provided".to_string(),
        ));
    }
    let mut components = Path::new(plugin).components();
    if plugin.contains('/')
        || !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    {
        return Err(IpamError::new(
            ErrorKind::InvalidArgument,
            format!("invalid plugin name \"{plugin}\", must be a file name"),
        ));
    }
    if dirs.is_empty() {
        return Err(IpamError::new(
            ErrorKind::InvalidArgument,
            "no plugin search path provided".to_string(),
        ));
    }
    for dir in dirs {
        let full_path = dir.join(plugin);
        if full_path.is_file() {
            return Ok(full_path);
        }
    }
    Err(IpamError::new(
        ErrorKind::NotFound,
        format!("failed to find plugin \"{plugin}\" in path {dirs:?}"),
    ))
}

/// Locate `plugin` in `dirs` and run it with `command`.
pub fn delegate<E>(
    exec: &E,
    plugin: &str,
    dirs: &[PathBuf],
    command: CniCommand,
    stdin: &[u8],
    env: &[(String, String)],
) -> Result<Vec<u8>, IpamError>
where
    E: PluginExec + ?Sized,
{
    let plugin_path = find_in_path(plugin, dirs)?;
    let mut env = env.to_vec();
    env.retain(|(k, _)| k != ENV_COMMAND);
    env.push((ENV_COMMAND.to_string(), command.to_string()));
    log::debug!("Delegating {command} to {}", plugin_path.display());
    exec.exec_plugin(&plugin_path, stdin, &env)
}

/// Ask the plugin which result versions it supports. `env` is passed along
/// with `CNI_COMMAND` replaced by `VERSION`.
pub fn version_info<E>(
    exec: &E,
    plugin: &Path,
    cni_version: &str,
    env: &[(String, String)],
) -> Result<PluginInfo, IpamError>
where
    E: PluginExec + ?Sized,
{
    let stdin = serde_json::to_vec(&serde_json::json!({
        "cniVersion": cni_version,
    }))?;
    let mut env = env.to_vec();
    env.retain(|(k, _)| k != ENV_COMMAND);
    env.push((ENV_COMMAND.to_string(), CniCommand::Version.to_string()));
    match exec.exec_plugin(plugin, &stdin, &env) {
        Ok(output) => Ok(serde_json::from_slice(&output)?),
        Err(e)
            if e.kind() == ErrorKind::PluginFailure
                && e.msg().contains(LEGACY_VERSION_UNKNOWN_MSG) =>
        {
            Ok(PluginInfo::new("0.1.0", vec!["0.1.0".to_string()]))
        }
        Err(e) => Err(e),
    }
}
