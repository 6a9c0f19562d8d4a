// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::{CniResult, IpConfig, Route};

/// Address already resolved by the orchestrator for one container
/// interface. Example of `IPInfos` content in `CNI_ARGS`:
/// ```json
/// [{"ip": "10.0.0.2/24", "vlan": 2, "gateway": "10.0.0.1"}]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IpInfo {
    /// Container address with the prefix length of its subnet.
    pub ip: IpNet,
    /// VLAN the address belongs to, 0 when untagged.
    #[serde(default)]
    pub vlan: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gateway: Option<IpAddr>,
    /// Subnet of the node hosting the container.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub routable_subnet: Option<IpNet>,
}

impl IpInfo {
    pub fn new(ip: IpNet, vlan: u16, gateway: Option<IpAddr>) -> Self {
        Self {
            ip,
            vlan,
            gateway,
            routable_subnet: None,
        }
    }

    /// Express the address as a `0.2.0` CNI result holding a default
    /// route without explicit next hop.
    pub fn to_result(&self) -> CniResult {
        // 0.0.0.0/0 or ::/0
        let default_route = match self.ip {
            IpNet::V4(_) => IpNet::V4(Ipv4Net::default()),
            IpNet::V6(_) => IpNet::V6(Ipv6Net::default()),
        };
        let ip_conf = IpConfig::new(
            self.ip,
            self.gateway,
            vec![Route::new(default_route, None)],
        );
        let mut ret = CniResult::new();
        if self.ip.addr().is_ipv4() {
            ret.ip4 = Some(ip_conf);
        } else {
            ret.ip6 = Some(ip_conf);
        }
        ret
    }
}
