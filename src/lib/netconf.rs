// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::IpamError;

/// Network configuration handed to the plugin on STDIN. Only the fields
/// needed to pick the IPAM plugin are typed, everything else is preserved.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct NetConf {
    #[serde(default)]
    pub cni_version: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ipam: Option<IpamConf>,
    #[serde(flatten)]
    pub others: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IpamConf {
    /// Name of the IPAM plugin binary.
    /// Serialize and deserialize to/from `type`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub others: Map<String, Value>,
}

impl NetConf {
    pub fn from_slice(data: &[u8]) -> Result<Self, IpamError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Name of the IPAM plugin, empty when not configured.
    pub fn ipam_type(&self) -> &str {
        self.ipam.as_ref().map(|i| i.kind.as_str()).unwrap_or_default()
    }
}
