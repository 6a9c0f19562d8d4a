// SPDX-License-Identifier: Apache-2.0

//! Resolve the IP addresses of a container interface for a CNI plugin.
//!
//! Addresses come either from the `IPInfos` key of `CNI_ARGS`, already
//! decided by the orchestrator, or from a delegated IPAM plugin binary
//! executed with the CNI exec protocol.
//!
//! ```no_run
//! use cni_ipam::{CmdArgs, CniCommand, NetConf};
//!
//! let stdin = br#"{"cniVersion":"0.2.0","name":"net","type":"bridge",
//!     "ipam":{"type":"host-local","subnet":"10.0.0.0/24"}}"#.to_vec();
//! let args = CmdArgs::from_env(CniCommand::Add, stdin).unwrap();
//! let net_conf = NetConf::from_slice(&args.stdin_data).unwrap();
//! for allocation in cni_ipam::allocate(net_conf.ipam_type(), &args).unwrap()
//! {
//!     println!("vlan {}: {:?}", allocation.vlan_id, allocation.result);
//! }
//! ```

mod cmd_args;
mod cni_args;
mod error;
mod invoke;
mod ip_info;
mod ipam;
mod netconf;
mod types;

pub use crate::cmd_args::{CmdArgs, CniCommand};
pub use crate::cni_args::{parse_cni_args, IP_INFOS_KEY};
pub use crate::error::{ErrorKind, IpamError};
pub use crate::invoke::{
    delegate, find_in_path, version_info, PluginExec, RawExec,
};
pub use crate::ip_info::IpInfo;
pub use crate::ipam::{allocate, check, release, Allocation, IpamDelegate};
pub use crate::netconf::{IpamConf, NetConf};
pub use crate::types::{
    is_current_version, is_legacy_version, supported_versions, CniError,
    CniInterface, CniResult, CurrentIpConfig, CurrentResult, Dns, IpConfig,
    PluginInfo, Route, CURRENT_CNI_VERSIONS, LEGACY_CNI_VERSION,
    LEGACY_CNI_VERSIONS,
};
