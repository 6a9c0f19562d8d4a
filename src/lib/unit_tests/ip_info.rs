// SPDX-License-Identifier: Apache-2.0

use crate::{CniResult, IpInfo};

#[test]
fn test_ip_info_deserialize() {
    let ip_infos: Vec<IpInfo> = serde_json::from_str(
        r#"[
        {
            "ip": "10.0.0.2/24",
            "vlan": 2,
            "gateway": "10.0.0.1",
            "routable_subnet": "192.168.0.0/16"
        },
        {
            "ip": "10.1.0.2/24"
        }]"#,
    )
    .unwrap();

    assert_eq!(ip_infos.len(), 2);
    assert_eq!(ip_infos[0].ip, "10.0.0.2/24".parse().unwrap());
    assert_eq!(ip_infos[0].vlan, 2);
    assert_eq!(ip_infos[0].gateway, Some("10.0.0.1".parse().unwrap()));
    assert_eq!(
        ip_infos[0].routable_subnet,
        Some("192.168.0.0/16".parse().unwrap())
    );
    assert_eq!(ip_infos[1].vlan, 0);
    assert_eq!(ip_infos[1].gateway, None);
}

#[test]
fn test_ip_info_invalid_ip() {
    let result = serde_json::from_str::<IpInfo>(r#"{"ip": "10.0.0.300/24"}"#);

    assert!(result.is_err());
}

#[test]
fn test_ip_info_ipv4_to_result() {
    let ip_info = IpInfo::new(
        "10.0.0.2/24".parse().unwrap(),
        2,
        Some("10.0.0.1".parse().unwrap()),
    );

    let expected: CniResult = serde_json::from_str(
        r#"{
        "cniVersion": "0.2.0",
        "ip4": {
            "ip": "10.0.0.2/24",
            "gateway": "10.0.0.1",
            "routes": [{"dst": "0.0.0.0/0"}]
        }}"#,
    )
    .unwrap();

    assert_eq!(ip_info.to_result(), expected);
}

#[test]
fn test_ip_info_ipv6_to_result() {
    let ip_info = IpInfo::new("2001:db8::2/64".parse().unwrap(), 0, None);

    let result = ip_info.to_result();

    assert!(result.ip4.is_none());
    let ip6 = result.ip6.unwrap();
    assert_eq!(ip6.ip, "2001:db8::2/64".parse().unwrap());
    assert_eq!(ip6.gateway, None);
    assert_eq!(ip6.routes.len(), 1);
    assert_eq!(ip6.routes[0].dst, "::/0".parse().unwrap());
    assert_eq!(ip6.routes[0].gw, None);
}
