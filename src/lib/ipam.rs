// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::{
    cni_args::{parse_cni_args, IP_INFOS_KEY},
    invoke::delegate,
    CmdArgs, CniCommand, CniResult, ErrorKind, IpInfo, IpamError, PluginExec,
    RawExec,
};

/// Address assigned to one container interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Allocation {
    /// VLAN the address belongs to, 0 when untagged or when allocated by
    /// an IPAM plugin.
    pub vlan_id: u16,
    pub result: CniResult,
}

impl Allocation {
    pub fn new(vlan_id: u16, result: CniResult) -> Self {
        Self { vlan_id, result }
    }
}

/// Resolve container addresses either from the `IPInfos` CNI argument or
/// by delegating to an IPAM plugin.
#[derive(Debug, Clone, Default)]
pub struct IpamDelegate<E: PluginExec = RawExec> {
    exec: E,
    extra_plugin_dirs: Vec<PathBuf>,
}

impl IpamDelegate<RawExec> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: PluginExec> IpamDelegate<E> {
    pub fn with_exec(exec: E) -> Self {
        Self {
            exec,
            extra_plugin_dirs: Vec::new(),
        }
    }

    /// Folders searched for the IPAM plugin after the `CNI_PATH` ones.
    pub fn set_extra_plugin_dirs(&mut self, dirs: Vec<PathBuf>) -> &mut Self {
        self.extra_plugin_dirs = dirs;
        self
    }

    pub fn exec(&self) -> &E {
        &self.exec
    }

    /// Use `IPInfos` from `CNI_ARGS` when present, otherwise invoke the
    /// `ipam_type` plugin with `ADD`.
    pub fn allocate(
        &self,
        ipam_type: &str,
        args: &CmdArgs,
    ) -> Result<Vec<Allocation>, IpamError> {
        let kv_map = parse_cni_args(&args.args)?;
        if let Some(ip_infos_str) =
            kv_map.get(IP_INFOS_KEY).filter(|s| !s.is_empty())
        {
            let ip_infos: Vec<IpInfo> = serde_json::from_str(ip_infos_str)
                .map_err(|e| {
                    IpamError::new(
                        ErrorKind::InvalidArgument,
                        format!(
                            "failed to unmarshal ipInfo from args {:?}: {e}",
                            args.args
                        ),
                    )
                })?;
            if ip_infos.is_empty() {
                return Err(IpamError::new(
                    ErrorKind::InvalidArgument,
                    "empty ipInfos".to_string(),
                ));
            }
            log::debug!(
                "Using {} address(es) from {IP_INFOS_KEY} of CNI_ARGS",
                ip_infos.len()
            );
            return Ok(ip_infos
                .iter()
                .map(|i| Allocation::new(i.vlan, i.to_result()))
                .collect());
        }
        if ipam_type.is_empty() {
            return Err(IpamError::new(
                ErrorKind::InvalidArgument,
                "neither ipInfo from cni args nor ipam type from netconf"
                    .to_string(),
            ));
        }
        let output = self.run(ipam_type, args, CniCommand::Add)?;
        let result = CniResult::from_plugin_output(&output)?;
        if result.ip4.is_none() {
            return Err(IpamError::new(
                ErrorKind::PluginFailure,
                "IPAM plugin returned missing IPv4 config".to_string(),
            ));
        }
        log::info!("IPAM plugin {ipam_type} allocated {result:?}");
        Ok(vec![Allocation::new(0, result)])
    }

    /// Invoke the `ipam_type` plugin with `DEL`. Nothing to release when no
    /// IPAM plugin is configured.
    pub fn release(
        &self,
        ipam_type: &str,
        args: &CmdArgs,
    ) -> Result<(), IpamError> {
        if ipam_type.is_empty() {
            return Ok(());
        }
        self.run(ipam_type, args, CniCommand::Del)?;
        log::info!("IPAM plugin {ipam_type} released {}", args.container_id);
        Ok(())
    }

    pub fn check(
        &self,
        ipam_type: &str,
        args: &CmdArgs,
    ) -> Result<(), IpamError> {
        if ipam_type.is_empty() {
            return Ok(());
        }
        self.run(ipam_type, args, CniCommand::Check)?;
        Ok(())
    }

    fn run(
        &self,
        ipam_type: &str,
        args: &CmdArgs,
        command: CniCommand,
    ) -> Result<Vec<u8>, IpamError> {
        let mut dirs = args.plugin_paths();
        dirs.extend(self.extra_plugin_dirs.iter().cloned());
        delegate(
            &self.exec,
            ipam_type,
            &dirs,
            command,
            &args.stdin_data,
            &args.plugin_env(command),
        )
    }
}

pub fn allocate(
    ipam_type: &str,
    args: &CmdArgs,
) -> Result<Vec<Allocation>, IpamError> {
    IpamDelegate::new().allocate(ipam_type, args)
}

pub fn release(ipam_type: &str, args: &CmdArgs) -> Result<(), IpamError> {
    IpamDelegate::new().release(ipam_type, args)
}

pub fn check(ipam_type: &str, args: &CmdArgs) -> Result<(), IpamError> {
    IpamDelegate::new().check(ipam_type, args)
}
