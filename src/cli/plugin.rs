// SPDX-License-Identifier: Apache-2.0

use std::io::Read;

use cni_ipam::{
    is_current_version, is_legacy_version, supported_versions, Allocation,
    CmdArgs, CniCommand, CurrentResult, ErrorKind, IpamDelegate, IpamError,
    NetConf, PluginInfo, CURRENT_CNI_VERSIONS,
};
use serde::Deserialize;

use crate::{config::Config, error::CliError};

/// Serve one CNI invocation, returning what to print on STDOUT.
pub(crate) fn run(config: &Config) -> Result<String, CliError> {
    let mut stdin_data = Vec::new();
    std::io::stdin().read_to_end(&mut stdin_data)?;
    respond(config, CniCommand::from_env(), stdin_data)
}

// Errors carry the requested `cniVersion` even when raised before the
// network configuration is fully decoded.
fn respond(
    config: &Config,
    command: Result<CniCommand, IpamError>,
    stdin_data: Vec<u8>,
) -> Result<String, CliError> {
    let cni_version = requested_cni_version(&stdin_data);
    serve(config, command, stdin_data)
        .map_err(|e| e.with_cni_version(&cni_version))
}

fn serve(
    config: &Config,
    command: Result<CniCommand, IpamError>,
    stdin_data: Vec<u8>,
) -> Result<String, CliError> {
    let command = command?;
    log::debug!("Got CNI command {command}");

    if command == CniCommand::Version {
        return version(&stdin_data);
    }

    let args = CmdArgs::from_env(command, stdin_data)?;
    let net_conf = NetConf::from_slice(&args.stdin_data)?;
    let mut ipam = IpamDelegate::new();
    ipam.set_extra_plugin_dirs(config.plugin.extra_dirs.clone());

    let result = match command {
        CniCommand::Add => add(&ipam, &net_conf, &args),
        CniCommand::Del => ipam
            .release(net_conf.ipam_type(), &args)
            .map(|_| String::new())
            .map_err(CliError::from),
        CniCommand::Check => ipam
            .check(net_conf.ipam_type(), &args)
            .map(|_| String::new())
            .map_err(CliError::from),
        _ => Err(CliError::from(format!("Unsupported CNI command {command}"))),
    };
    result.map_err(|e| e.with_cni_version(&net_conf.cni_version))
}

fn add(
    ipam: &IpamDelegate,
    net_conf: &NetConf,
    args: &CmdArgs,
) -> Result<String, CliError> {
    let allocations = ipam.allocate(net_conf.ipam_type(), args)?;
    for allocation in allocations.iter() {
        log::info!(
            "Container {} interface {} vlan {}: {:?}",
            args.container_id,
            args.if_name,
            allocation.vlan_id,
            allocation.result
        );
    }
    encode_result(&net_conf.cni_version, &allocations)
}

/// Encode the allocations in the result layout of `cni_version`. The
/// `0.1.0`/`0.2.0` layout holds only the first allocation.
pub(crate) fn encode_result(
    cni_version: &str,
    allocations: &[Allocation],
) -> Result<String, CliError> {
    if cni_version.is_empty() || is_legacy_version(cni_version) {
        let mut result = match allocations.first() {
            Some(a) => a.result.clone(),
            None => return Err(CliError::from("No address allocated")),
        };
        if !cni_version.is_empty() {
            result.cni_version = cni_version.to_string();
        }
        if allocations.len() > 1 {
            log::warn!(
                "CNI result version {} holds a single address, dropping {} \
                more",
                result.cni_version,
                allocations.len() - 1
            );
        }
        Ok(serde_json::to_string(&result)?)
    } else if is_current_version(cni_version) {
        let result = CurrentResult::from_legacy_results(
            cni_version,
            allocations.iter().map(|a| &a.result),
        );
        Ok(serde_json::to_string(&result)?)
    } else {
        Err(CliError {
            cni_code: ErrorKind::IncompatibleVersion.cni_code(),
            error_msg: format!("Unsupported CNI version {cni_version}"),
            ..Default::default()
        })
    }
}

/// `cniVersion` of the STDIN document, empty when absent or undecodable.
fn requested_cni_version(stdin_data: &[u8]) -> String {
    #[derive(Deserialize)]
    struct VersionRequest {
        #[serde(rename = "cniVersion", default)]
        cni_version: String,
    }

    serde_json::from_slice::<VersionRequest>(stdin_data)
        .map(|r| r.cni_version)
        .unwrap_or_default()
}

fn version(stdin_data: &[u8]) -> Result<String, CliError> {
    let requested = requested_cni_version(stdin_data);
    let cni_version = if requested.is_empty() {
        CURRENT_CNI_VERSIONS[CURRENT_CNI_VERSIONS.len() - 1].to_string()
    } else {
        requested
    };
    Ok(serde_json::to_string(&PluginInfo::new(
        &cni_version,
        supported_versions(),
    ))?)
}
