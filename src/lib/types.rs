// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, IpamError};

/// Result format version emitted for orchestrator provided addresses and
/// for plugin results converted down.
pub const LEGACY_CNI_VERSION: &str = "0.2.0";

/// Versions sharing the `ip4`/`ip6` result layout.
pub const LEGACY_CNI_VERSIONS: [&str; 2] = ["0.1.0", "0.2.0"];

/// Versions sharing the `interfaces`/`ips` result layout.
pub const CURRENT_CNI_VERSIONS: [&str; 5] =
    ["0.3.0", "0.3.1", "0.4.0", "1.0.0", "1.1.0"];

// Plugins omitting `cniVersion` predate the field.
const IMPLICIT_CNI_VERSION: &str = "0.1.0";

pub fn is_legacy_version(version: &str) -> bool {
    LEGACY_CNI_VERSIONS.contains(&version)
}

pub fn is_current_version(version: &str) -> bool {
    CURRENT_CNI_VERSIONS.contains(&version)
}

pub fn supported_versions() -> Vec<String> {
    LEGACY_CNI_VERSIONS
        .iter()
        .chain(CURRENT_CNI_VERSIONS.iter())
        .map(|v| v.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Route {
    pub dst: IpNet,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gw: Option<IpAddr>,
}

impl Route {
    pub fn new(dst: IpNet, gw: Option<IpAddr>) -> Self {
        Self { dst, gw }
    }

    fn is_ipv4(&self) -> bool {
        self.dst.addr().is_ipv4()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Dns {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub nameservers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub search: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<String>,
}

impl Dns {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Address of one IP family in the `0.1.0`/`0.2.0` result layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IpConfig {
    pub ip: IpNet,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gateway: Option<IpAddr>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub routes: Vec<Route>,
}

impl IpConfig {
    pub fn new(ip: IpNet, gateway: Option<IpAddr>, routes: Vec<Route>) -> Self {
        Self {
            ip,
            gateway,
            routes,
        }
    }
}

/// CNI result in the `0.1.0`/`0.2.0` layout. Example:
/// ```json
/// {
///   "cniVersion": "0.2.0",
///   "ip4": {
///     "ip": "10.0.0.2/24",
///     "gateway": "10.0.0.1",
///     "routes": [{"dst": "0.0.0.0/0"}]
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CniResult {
    #[serde(default)]
    pub cni_version: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ip4: Option<IpConfig>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ip6: Option<IpConfig>,
    #[serde(skip_serializing_if = "Dns::is_empty", default)]
    pub dns: Dns,
}

impl CniResult {
    pub fn new() -> Self {
        Self {
            cni_version: LEGACY_CNI_VERSION.to_string(),
            ..Default::default()
        }
    }

    /// Decode the STDOUT of an IPAM plugin whatever result version it
    /// speaks, converting newer layouts down to `0.2.0`.
    pub fn from_plugin_output(output: &[u8]) -> Result<Self, IpamError> {
        #[derive(Deserialize)]
        struct VersionField {
            #[serde(rename = "cniVersion", default)]
            cni_version: String,
        }

        let versioned: VersionField = serde_json::from_slice(output)?;
        let version = if versioned.cni_version.is_empty() {
            IMPLICIT_CNI_VERSION
        } else {
            versioned.cni_version.as_str()
        };

        if is_legacy_version(version) {
            let mut ret: CniResult = serde_json::from_slice(output)?;
            ret.cni_version = version.to_string();
            Ok(ret)
        } else if is_current_version(version) {
            let current: CurrentResult = serde_json::from_slice(output)?;
            current.to_legacy()
        } else {
            Err(IpamError::new(
                ErrorKind::IncompatibleVersion,
                format!("unsupported CNI result version \"{version}\""),
            ))
        }
    }

    pub fn to_current(&self, cni_version: &str) -> CurrentResult {
        CurrentResult::from_legacy_results(cni_version, [self])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CniInterface {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub mac: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub sandbox: String,
}

/// Address entry of the `0.3.0` and later result layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CurrentIpConfig {
    /// Only used by `0.3.x` and `0.4.0`: "4" or "6".
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    /// Index into the `interfaces` list of the result.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interface: Option<usize>,
    pub address: IpNet,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gateway: Option<IpAddr>,
}

/// CNI result in the `0.3.0` and later layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CurrentResult {
    pub cni_version: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub interfaces: Vec<CniInterface>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ips: Vec<CurrentIpConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub routes: Vec<Route>,
    #[serde(skip_serializing_if = "Dns::is_empty", default)]
    pub dns: Dns,
}

impl CurrentResult {
    /// Keep the first address of each IP family and attach every route to
    /// the configuration matching its destination family.
    pub fn to_legacy(&self) -> Result<CniResult, IpamError> {
        let mut ret = CniResult {
            dns: self.dns.clone(),
            ..CniResult::new()
        };
        for ip in self.ips.iter() {
            let slot = if ip.address.addr().is_ipv4() {
                &mut ret.ip4
            } else {
                &mut ret.ip6
            };
            if slot.is_none() {
                *slot = Some(IpConfig::new(ip.address, ip.gateway, Vec::new()));
            }
        }
        if ret.ip4.is_none() && ret.ip6.is_none() {
            return Err(IpamError::new(
                ErrorKind::DecodingFailure,
                "cannot convert CNI result: no valid IP addresses".to_string(),
            ));
        }
        for route in self.routes.iter() {
            let slot = if route.is_ipv4() {
                &mut ret.ip4
            } else {
                &mut ret.ip6
            };
            if let Some(ip_conf) = slot.as_mut() {
                ip_conf.routes.push(route.clone());
            }
        }
        Ok(ret)
    }

    /// Merge `0.2.0` results into one result of the requested version.
    /// DNS is taken from the first result holding any.
    pub fn from_legacy_results<'a, I>(cni_version: &str, results: I) -> Self
    where
        I: IntoIterator<Item = &'a CniResult>,
    {
        let with_ip_version = cni_version.starts_with("0.");
        let mut ret = Self {
            cni_version: cni_version.to_string(),
            ..Default::default()
        };
        for result in results {
            for (family, ip_conf) in
                [("4", result.ip4.as_ref()), ("6", result.ip6.as_ref())]
            {
                if let Some(ip_conf) = ip_conf {
                    ret.ips.push(CurrentIpConfig {
                        version: if with_ip_version {
                            Some(family.to_string())
                        } else {
                            None
                        },
                        interface: None,
                        address: ip_conf.ip,
                        gateway: ip_conf.gateway,
                    });
                    ret.routes.extend(ip_conf.routes.iter().cloned());
                }
            }
            if ret.dns.is_empty() && !result.dns.is_empty() {
                ret.dns = result.dns.clone();
            }
        }
        ret
    }
}

/// CNI error document, printed by a failing plugin on STDOUT.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct CniError {
    #[serde(default)]
    pub cni_version: String,
    pub code: u32,
    pub msg: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub details: String,
}

impl CniError {
    pub fn new(cni_version: &str, code: u32, msg: String) -> Self {
        Self {
            cni_version: cni_version.to_string(),
            code,
            msg,
            details: String::new(),
        }
    }

    pub fn from_ipam_error(cni_version: &str, e: &IpamError) -> Self {
        Self {
            cni_version: cni_version.to_string(),
            code: e.cni_code(),
            msg: e.msg().to_string(),
            details: String::new(),
        }
    }
}

impl std::fmt::Display for CniError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.details.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{}; {}", self.msg, self.details)
        }
    }
}

/// Reply of the `VERSION` command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct PluginInfo {
    pub cni_version: String,
    #[serde(default)]
    pub supported_versions: Vec<String>,
}

impl PluginInfo {
    pub fn new(cni_version: &str, supported_versions: Vec<String>) -> Self {
        Self {
            cni_version: cni_version.to_string(),
            supported_versions,
        }
    }
}
