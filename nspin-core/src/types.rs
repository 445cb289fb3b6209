//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::{Error, Result};

/// Network namespace name with validation
///
/// The name becomes a file under `/run/netns` and part of the unit file
/// name, so it is restricted to a conservative character set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Maximum length for namespace names
    pub const MAX_LENGTH: usize = 64;

    /// Create a new `NamespaceName` with validation
    ///
    /// # Errors
    /// Returns error if the name is empty, too long, `.`/`..`, or contains
    /// characters other than alphanumerics, dash, underscore and dot
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Built-in literals that are known to be valid
    pub(crate) fn new_unchecked(name: &'static str) -> Self {
        Self(name.to_string())
    }

    fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("Namespace name cannot be empty"));
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(Error::invalid(format!(
                "Namespace name too long (max {} chars)",
                Self::MAX_LENGTH
            )));
        }

        if name == "." || name == ".." {
            return Err(Error::invalid(format!("Namespace name '{name}' is reserved")));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(Error::invalid(
                "Namespace name can only contain alphanumeric, dash, underscore, and dot",
            ));
        }

        Ok(())
    }

    /// Get the namespace name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NamespaceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<NamespaceName> for String {
    fn from(name: NamespaceName) -> Self {
        name.0
    }
}

/// Network interface name, bounded by the kernel's `IFNAMSIZ`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Maximum length (`IFNAMSIZ` minus the trailing NUL)
    pub const MAX_LENGTH: usize = 15;

    /// Create a new `InterfaceName` with validation
    ///
    /// # Errors
    /// Returns error if the name is empty, longer than 15 bytes, or contains
    /// whitespace, `/` or `:`
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::invalid("Interface name cannot be empty"));
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(Error::invalid(format!(
                "Interface name too long (max {} chars)",
                Self::MAX_LENGTH
            )));
        }

        if name
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == ':')
        {
            return Err(Error::invalid(
                "Interface name cannot contain whitespace, '/' or ':'",
            ));
        }

        Ok(Self(name))
    }

    pub(crate) fn new_unchecked(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Get the interface name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for InterfaceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<InterfaceName> for String {
    fn from(name: InterfaceName) -> Self {
        name.0
    }
}

/// IPv4 address with prefix length, e.g. `2.2.2.3/24`
///
/// Host bits are kept: the address is the one assigned to the interface,
/// not the network address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrAddress {
    host: Ipv4Addr,
    prefix_len: u8,
}

impl CidrAddress {
    /// Create from parts
    ///
    /// # Errors
    /// Returns error if `prefix_len` exceeds 32
    pub fn new(host: Ipv4Addr, prefix_len: u8) -> Result<Self> {
        if prefix_len > 32 {
            return Err(Error::invalid(format!(
                "Prefix length {prefix_len} out of range (0-32)"
            )));
        }
        Ok(Self { host, prefix_len })
    }

    pub(crate) const fn new_unchecked(host: Ipv4Addr, prefix_len: u8) -> Self {
        Self { host, prefix_len }
    }

    /// Address portion with the prefix stripped
    #[must_use]
    pub const fn host(&self) -> Ipv4Addr {
        self.host
    }

    /// Prefix length
    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl fmt::Display for CidrAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.prefix_len)
    }
}

impl FromStr for CidrAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, prefix) = s
            .split_once('/')
            .ok_or_else(|| Error::invalid(format!("'{s}' is not a CIDR address (missing '/')")))?;

        let host: Ipv4Addr = host
            .parse()
            .map_err(|e| Error::invalid(format!("'{s}': invalid IPv4 address: {e}")))?;

        // u8 parsing alone would accept "+24" and "024"
        if prefix.is_empty()
            || !prefix.bytes().all(|b| b.is_ascii_digit())
            || (prefix.len() > 1 && prefix.starts_with('0'))
        {
            return Err(Error::invalid(format!("'{s}': invalid prefix length")));
        }
        let prefix_len: u8 = prefix
            .parse()
            .map_err(|_| Error::invalid(format!("'{s}': invalid prefix length")))?;

        Self::new(host, prefix_len)
    }
}

impl TryFrom<String> for CidrAddress {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CidrAddress> for String {
    fn from(addr: CidrAddress) -> Self {
        addr.to_string()
    }
}
