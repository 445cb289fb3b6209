//! Target and runtime configuration
//!
//! Resolution order, later wins: built-in defaults, an optional TOML file,
//! then per-field overrides from the command line. The result is validated
//! once and handed to every component by reference.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::types::{CidrAddress, InterfaceName, NamespaceName};
use crate::{Error, Result};

/// The single namespace/interface/address/gateway this tool maintains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Network namespace name
    pub namespace: NamespaceName,

    /// Interface moved into the namespace
    pub interface: InterfaceName,

    /// Address assigned to the interface, with prefix
    pub address: CidrAddress,

    /// Default gateway inside the namespace
    pub gateway: Ipv4Addr,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            namespace: NamespaceName::new_unchecked("ha-test"),
            interface: InterfaceName::new_unchecked("ha-0-0"),
            address: CidrAddress::new_unchecked(Ipv4Addr::new(2, 2, 2, 3), 24),
            gateway: Ipv4Addr::new(2, 2, 2, 2),
        }
    }
}

impl TargetConfig {
    /// Create a target from string values
    ///
    /// # Errors
    /// Returns error if any value fails validation
    pub fn new(namespace: &str, interface: &str, address: &str, gateway: &str) -> Result<Self> {
        Ok(Self {
            namespace: namespace.parse()?,
            interface: interface.parse()?,
            address: address.parse()?,
            gateway: parse_gateway(gateway)?,
        })
    }

    /// Replace the namespace
    #[must_use]
    pub fn with_namespace(mut self, namespace: NamespaceName) -> Self {
        self.namespace = namespace;
        self
    }

    /// Replace the interface
    #[must_use]
    pub fn with_interface(mut self, interface: InterfaceName) -> Self {
        self.interface = interface;
        self
    }

    /// Replace the address
    #[must_use]
    pub const fn with_address(mut self, address: CidrAddress) -> Self {
        self.address = address;
        self
    }

    /// Replace the gateway
    #[must_use]
    pub const fn with_gateway(mut self, gateway: Ipv4Addr) -> Self {
        self.gateway = gateway;
        self
    }
}

fn parse_gateway(gateway: &str) -> Result<Ipv4Addr> {
    gateway
        .parse()
        .map_err(|e| Error::invalid(format!("'{gateway}': invalid gateway address: {e}")))
}

/// Filesystem locations and host binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory the unit file is written to
    pub unit_dir: PathBuf,

    /// Directory `install` copies the executable into
    pub install_dir: PathBuf,

    /// Directory holding the per-namespace lock file
    pub lock_dir: PathBuf,

    /// Absolute path of `ip`, embedded in the unit file
    pub ip_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            unit_dir: PathBuf::from("/etc/systemd/system"),
            install_dir: PathBuf::from("/usr/local/bin"),
            lock_dir: PathBuf::from("/run/lock"),
            ip_path: PathBuf::from("/usr/sbin/ip"),
        }
    }
}

/// Connectivity probe settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Probed after the gateway, in order
    pub probe_targets: Vec<Ipv4Addr>,

    /// Echo requests per target
    pub ping_count: u32,

    /// Throughput client binary
    pub iperf_binary: String,

    /// Throughput server host
    pub iperf_host: String,

    /// Throughput server port
    pub iperf_port: u16,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            probe_targets: vec![
                Ipv4Addr::new(2, 2, 2, 2),
                Ipv4Addr::new(8, 8, 8, 8),
                Ipv4Addr::new(192, 168, 7, 1),
            ],
            ping_count: 4,
            iperf_binary: "iperf".to_string(),
            iperf_host: "216.218.207.42".to_string(),
            iperf_port: 5201,
        }
    }
}

/// Everything a single invocation needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Target state
    pub target: TargetConfig,

    /// Paths
    pub paths: PathsConfig,

    /// Diagnostics
    pub diagnostics: DiagnosticsConfig,
}

/// Per-field overrides, typically from command-line flags
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    /// Namespace override
    pub namespace: Option<String>,
    /// Interface override
    pub interface: Option<String>,
    /// Address override
    pub address: Option<String>,
    /// Gateway override
    pub gateway: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");

        Ok(settings)
    }

    /// Resolve settings: defaults, then the optional file, then overrides
    ///
    /// # Errors
    /// Returns error if the file is unreadable or any value is invalid
    pub fn resolve(path: Option<&Path>, overrides: &TargetOverrides) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.with_overrides(overrides)
    }

    /// Apply command-line overrides on top of these settings
    ///
    /// # Errors
    /// Returns error if an override value is invalid
    pub fn with_overrides(mut self, overrides: &TargetOverrides) -> Result<Self> {
        if let Some(ref namespace) = overrides.namespace {
            self.target.namespace = namespace.parse()?;
        }
        if let Some(ref interface) = overrides.interface {
            self.target.interface = interface.parse()?;
        }
        if let Some(ref address) = overrides.address {
            self.target.address = address.parse()?;
        }
        if let Some(ref gateway) = overrides.gateway {
            self.target.gateway = parse_gateway(gateway)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints the types cannot express
    ///
    /// # Errors
    /// Returns error describing the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if !self.paths.ip_path.is_absolute() {
            return Err(Error::invalid(format!(
                "ip_path must be absolute, got {}",
                self.paths.ip_path.display()
            )));
        }
        if self.diagnostics.ping_count == 0 {
            return Err(Error::invalid("ping_count must be at least 1"));
        }
        if self.diagnostics.iperf_port == 0 {
            return Err(Error::invalid("iperf_port must be non-zero"));
        }
        if self.diagnostics.iperf_host.trim().is_empty() {
            return Err(Error::invalid("iperf_host cannot be empty"));
        }
        if self.diagnostics.iperf_binary.trim().is_empty() {
            return Err(Error::invalid("iperf_binary cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target() {
        let target = TargetConfig::default();
        assert_eq!(target.namespace.as_str(), "ha-test");
        assert_eq!(target.interface.as_str(), "ha-0-0");
        assert_eq!(target.address.to_string(), "2.2.2.3/24");
        assert_eq!(target.gateway, Ipv4Addr::new(2, 2, 2, 2));
    }

    #[test]
    fn test_builder_pattern() {
        let target = TargetConfig::default()
            .with_namespace(NamespaceName::new("blue").unwrap())
            .with_gateway(Ipv4Addr::new(10, 0, 0, 1));

        assert_eq!(target.namespace.as_str(), "blue");
        assert_eq!(target.interface.as_str(), "ha-0-0");
        assert_eq!(target.gateway, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[target]
namespace = "blue"
address = "10.0.0.5/16"

[diagnostics]
ping_count = 2
"#,
        )
        .unwrap();

        assert_eq!(settings.target.namespace.as_str(), "blue");
        assert_eq!(settings.target.interface.as_str(), "ha-0-0");
        assert_eq!(settings.target.address.prefix_len(), 16);
        assert_eq!(settings.diagnostics.ping_count, 2);
        assert_eq!(settings.diagnostics.probe_targets.len(), 3);
        assert_eq!(settings.paths, PathsConfig::default());
    }

    #[test]
    fn test_toml_rejects_invalid_values() {
        assert!(toml::from_str::<Settings>("[target]\naddress = \"2.2.2.3\"\n").is_err());
        assert!(toml::from_str::<Settings>("[target]\nnamspace = \"typo\"\n").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = TargetOverrides {
            interface: Some("veth-blue".to_string()),
            gateway: Some("10.1.1.1".to_string()),
            ..Default::default()
        };
        let settings = Settings::default().with_overrides(&overrides).unwrap();

        assert_eq!(settings.target.namespace.as_str(), "ha-test");
        assert_eq!(settings.target.interface.as_str(), "veth-blue");
        assert_eq!(settings.target.gateway, Ipv4Addr::new(10, 1, 1, 1));
    }

    #[test]
    fn test_invalid_override() {
        let overrides = TargetOverrides {
            gateway: Some("not-an-ip".to_string()),
            ..Default::default()
        };
        assert!(Settings::default().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_validate_ping_count() {
        let mut settings = Settings::default();
        settings.diagnostics.ping_count = 0;
        assert!(settings.validate().is_err());
    }
}
