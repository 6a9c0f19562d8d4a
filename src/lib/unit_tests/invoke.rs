// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use crate::{
    delegate, find_in_path, unit_tests::testlib::new_plugin_dir,
    unit_tests::testlib::FakeExec, version_info, CniCommand, ErrorKind,
    IpamError,
};

#[test]
fn test_find_in_path_first_match_wins() {
    let dir1 = new_plugin_dir(&["static"]);
    let dir2 = new_plugin_dir(&["host-local", "static"]);
    let dirs = vec![
        PathBuf::from("/nonexistent"),
        dir1.path().to_path_buf(),
        dir2.path().to_path_buf(),
    ];

    assert_eq!(
        find_in_path("static", &dirs).unwrap(),
        dir1.path().join("static")
    );
    assert_eq!(
        find_in_path("host-local", &dirs).unwrap(),
        dir2.path().join("host-local")
    );
}

#[test]
fn test_find_in_path_ignore_folder() {
    let dir = new_plugin_dir(&[]);
    std::fs::create_dir(dir.path().join("host-local")).unwrap();

    let result = find_in_path("host-local", &[dir.path().to_path_buf()]);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::NotFound);
        assert!(e.msg().contains("host-local"));
    }
}

#[test]
fn test_find_in_path_no_dirs() {
    let result = find_in_path("host-local", &[]);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_find_in_path_no_name() {
    let result = find_in_path("", &[PathBuf::from("/opt/cni/bin")]);

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::InvalidArgument);
    }
}

#[test]
fn test_find_in_path_refuse_path_name() {
    let dir = new_plugin_dir(&["host-local"]);
    let dirs = vec![dir.path().to_path_buf()];

    for name in [
        "/bin/sh",
        "../../../../bin/sh",
        "sub/host-local",
        "./host-local",
        "..",
        ".",
    ] {
        let result = find_in_path(name, &dirs);
        assert!(result.is_err(), "{name} should be refused");
        if let Err(e) = result {
            assert_eq!(e.kind(), ErrorKind::InvalidArgument);
        }
    }
}

#[test]
fn test_delegate_refuse_absolute_plugin() {
    let dir = new_plugin_dir(&["host-local"]);
    let exec = FakeExec::new("{}");

    let result = delegate(
        &exec,
        "/bin/sh",
        &[dir.path().to_path_buf()],
        CniCommand::Add,
        b"",
        &[],
    );

    assert!(result.is_err());
    assert!(exec.calls().is_empty());
}

#[test]
fn test_delegate_override_command() {
    let dir = new_plugin_dir(&["host-local"]);
    let exec = FakeExec::new("{}");

    delegate(
        &exec,
        "host-local",
        &[dir.path().to_path_buf()],
        CniCommand::Add,
        b"netconf",
        &[
            ("CNI_COMMAND".to_string(), "DEL".to_string()),
            ("CNI_IFNAME".to_string(), "eth0".to_string()),
        ],
    )
    .unwrap();

    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].plugin, dir.path().join("host-local"));
    assert_eq!(calls[0].stdin, b"netconf".to_vec());
    assert_eq!(calls[0].env_value("CNI_COMMAND"), Some("ADD"));
    assert_eq!(calls[0].env_value("CNI_IFNAME"), Some("eth0"));
    assert_eq!(
        calls[0]
            .env
            .iter()
            .filter(|(k, _)| k == "CNI_COMMAND")
            .count(),
        1
    );
}

#[test]
fn test_delegate_plugin_not_found() {
    let dir = new_plugin_dir(&[]);
    let exec = FakeExec::new("{}");

    let result = delegate(
        &exec,
        "host-local",
        &[dir.path().to_path_buf()],
        CniCommand::Add,
        b"",
        &[],
    );

    assert!(result.is_err());
    assert!(exec.calls().is_empty());
}

#[test]
fn test_version_info() {
    let exec = FakeExec::new(
        r#"{"cniVersion": "1.0.0",
            "supportedVersions": ["0.3.1", "0.4.0", "1.0.0"]}"#,
    );

    let info = version_info(
        &exec,
        Path::new("/opt/cni/bin/host-local"),
        "1.0.0",
        &[
            ("CNI_COMMAND".to_string(), "ADD".to_string()),
            ("CNI_PATH".to_string(), "/opt/cni/bin".to_string()),
        ],
    )
    .unwrap();

    assert_eq!(info.cni_version, "1.0.0");
    assert_eq!(info.supported_versions.len(), 3);
    let calls = exec.calls();
    assert_eq!(calls[0].env_value("CNI_COMMAND"), Some("VERSION"));
    assert_eq!(calls[0].env_value("CNI_PATH"), Some("/opt/cni/bin"));
    assert_eq!(
        calls[0]
            .env
            .iter()
            .filter(|(k, _)| k == "CNI_COMMAND")
            .count(),
        1
    );
    let stdin: serde_json::Value =
        serde_json::from_slice(&calls[0].stdin).unwrap();
    assert_eq!(stdin["cniVersion"], serde_json::json!("1.0.0"));
}

#[test]
fn test_version_info_of_legacy_plugin() {
    let exec = FakeExec::new_failure(IpamError::new_plugin_error(
        4,
        "plugin /opt/cni/bin/old failed: unknown CNI_COMMAND: VERSION"
            .to_string(),
    ));

    let info =
        version_info(&exec, Path::new("/opt/cni/bin/old"), "0.2.0", &[])
            .unwrap();

    assert_eq!(info.cni_version, "0.1.0");
    assert_eq!(info.supported_versions, vec!["0.1.0".to_string()]);
}

#[test]
fn test_version_info_failure() {
    let exec = FakeExec::new_failure(IpamError::new(
        ErrorKind::IoFailure,
        "permission denied".to_string(),
    ));

    let result = version_info(
        &exec,
        Path::new("/opt/cni/bin/host-local"),
        "0.2.0",
        &[],
    );

    assert!(result.is_err());
    if let Err(e) = result {
        assert_eq!(e.kind(), ErrorKind::IoFailure);
    }
}
