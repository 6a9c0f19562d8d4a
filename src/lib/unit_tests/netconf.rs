// SPDX-License-Identifier: Apache-2.0

use crate::{unit_tests::testlib::NET_CONF, ErrorKind, NetConf};

#[test]
fn test_net_conf_ipam_type() {
    let net_conf = NetConf::from_slice(NET_CONF.as_bytes()).unwrap();

    assert_eq!(net_conf.cni_version, "0.2.0");
    assert_eq!(net_conf.name, "underlay");
    assert_eq!(net_conf.kind, "vlan");
    assert_eq!(net_conf.ipam_type(), "host-local");
    assert_eq!(
        net_conf.ipam.as_ref().unwrap().others["subnet"],
        serde_json::json!("10.0.0.0/24")
    );
}

#[test]
fn test_net_conf_without_ipam() {
    let net_conf = NetConf::from_slice(
        br#"{"cniVersion": "0.3.1", "name": "n", "type": "vlan", "vlan": 2}"#,
    )
    .unwrap();

    assert_eq!(net_conf.ipam_type(), "");
    assert_eq!(net_conf.others["vlan"], serde_json::json!(2));
}

#[test]
fn test_net_conf_keep_unknown_keys() {
    let net_conf = NetConf::from_slice(NET_CONF.as_bytes()).unwrap();

    let value = serde_json::to_value(&net_conf).unwrap();

    assert_eq!(value["ipam"]["subnet"], serde_json::json!("10.0.0.0/24"));
    assert_eq!(value["type"], serde_json::json!("vlan"));
}

#[test]
fn test_net_conf_invalid_json() {
    let result = NetConf::from_slice(b"{not json");

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::DecodingFailure);
    }
}
