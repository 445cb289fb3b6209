use nspin_core::*;
use std::io::Write;
use std::net::Ipv4Addr;

#[test]
fn test_target_from_strings() {
    let target = TargetConfig::new("ha-test", "ha-0-0", "2.2.2.3/24", "2.2.2.2").unwrap();
    assert_eq!(target, TargetConfig::default());

    assert!(TargetConfig::new("", "ha-0-0", "2.2.2.3/24", "2.2.2.2").is_err());
    assert!(TargetConfig::new("ha-test", "", "2.2.2.3/24", "2.2.2.2").is_err());
    assert!(TargetConfig::new("ha-test", "ha-0-0", "2.2.2.3", "2.2.2.2").is_err());
    assert!(TargetConfig::new("ha-test", "ha-0-0", "2.2.2.3/24", "").is_err());
}

#[test]
fn test_cidr_host_strips_prefix() {
    let addr: CidrAddress = "192.168.7.10/23".parse().unwrap();
    assert_eq!(addr.host(), Ipv4Addr::new(192, 168, 7, 10));
    assert_eq!(addr.to_string(), "192.168.7.10/23");
}

#[test]
fn test_settings_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[target]
namespace = "lab"
interface = "veth-lab"
address = "10.9.0.2/24"
gateway = "10.9.0.1"

[paths]
unit_dir = "/tmp/units"

[diagnostics]
probe_targets = ["1.1.1.1"]
iperf_port = 5001
"#
    )
    .unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    assert_eq!(settings.target.namespace.as_str(), "lab");
    assert_eq!(settings.target.gateway, Ipv4Addr::new(10, 9, 0, 1));
    assert_eq!(settings.paths.unit_dir.to_str(), Some("/tmp/units"));
    assert_eq!(settings.paths.lock_dir.to_str(), Some("/run/lock"));
    assert_eq!(settings.diagnostics.probe_targets, vec![Ipv4Addr::new(1, 1, 1, 1)]);
    assert_eq!(settings.diagnostics.iperf_port, 5001);
    assert_eq!(settings.diagnostics.ping_count, 4);
}

#[test]
fn test_settings_missing_file() {
    let err = Settings::from_file(std::path::Path::new("/nonexistent/nspin.toml")).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_resolve_file_then_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[target]\nnamespace = \"lab\"\ngateway = \"10.9.0.1\"").unwrap();

    let overrides = TargetOverrides {
        gateway: Some("10.9.0.254".to_string()),
        ..Default::default()
    };
    let settings = Settings::resolve(Some(file.path()), &overrides).unwrap();

    assert_eq!(settings.target.namespace.as_str(), "lab");
    assert_eq!(settings.target.gateway, Ipv4Addr::new(10, 9, 0, 254));
}

#[test]
fn test_resolve_without_file_is_default() {
    let settings = Settings::resolve(None, &TargetOverrides::default()).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_relative_ip_path_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[paths]\nip_path = \"ip\"").unwrap();
    assert!(Settings::from_file(file.path()).is_err());
}
