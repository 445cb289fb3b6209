//! `ip(8)` command builders
//!
//! The same builders produce both the commands run by the reconciler and
//! the lines embedded in the boot unit, so the two cannot drift apart.

use nspin_core::{CidrAddress, InterfaceName, NamespaceName};
use std::net::Ipv4Addr;

use crate::runner::CommandSpec;

/// Builder for `ip` invocations using a given program path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ip {
    program: String,
}

impl Default for Ip {
    fn default() -> Self {
        Self::new(Self::PROGRAM)
    }
}

impl Ip {
    /// Program name resolved through `PATH`
    pub const PROGRAM: &'static str = "ip";

    /// Create a builder for the given program path
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn cmd<const N: usize>(&self, args: [&str; N]) -> CommandSpec {
        CommandSpec::new(self.program.clone(), args)
    }

    /// `ip netns list`
    #[must_use]
    pub fn netns_list(&self) -> CommandSpec {
        self.cmd(["netns", "list"])
    }

    /// `ip netns add <ns>`
    #[must_use]
    pub fn netns_add(&self, namespace: &NamespaceName) -> CommandSpec {
        self.cmd(["netns", "add", namespace.as_str()])
    }

    /// `ip netns del <ns>`
    #[must_use]
    pub fn netns_delete(&self, namespace: &NamespaceName) -> CommandSpec {
        self.cmd(["netns", "del", namespace.as_str()])
    }

    /// `ip link show <if>` in the current namespace
    #[must_use]
    pub fn link_show(&self, interface: &InterfaceName) -> CommandSpec {
        self.cmd(["link", "show", interface.as_str()])
    }

    /// `ip link set dev <if> netns <ns>`
    #[must_use]
    pub fn link_set_netns(&self, interface: &InterfaceName, namespace: &NamespaceName) -> CommandSpec {
        self.cmd(["link", "set", "dev", interface.as_str(), "netns", namespace.as_str()])
    }

    /// `ip link set <name> up`
    #[must_use]
    pub fn link_up(&self, name: &str) -> CommandSpec {
        self.cmd(["link", "set", name, "up"])
    }

    /// `ip addr show dev <if>`
    #[must_use]
    pub fn addr_show(&self, interface: &InterfaceName) -> CommandSpec {
        self.cmd(["addr", "show", "dev", interface.as_str()])
    }

    /// `ip addr add <cidr> dev <if>`
    #[must_use]
    pub fn addr_add(&self, address: &CidrAddress, interface: &InterfaceName) -> CommandSpec {
        let address = address.to_string();
        self.cmd(["addr", "add", address.as_str(), "dev", interface.as_str()])
    }

    /// `ip route add default via <gw>`
    #[must_use]
    pub fn route_add_default(&self, gateway: Ipv4Addr) -> CommandSpec {
        let gateway = gateway.to_string();
        self.cmd(["route", "add", "default", "via", gateway.as_str()])
    }

    /// `ip netns exec <ns> <command...>`
    #[must_use]
    pub fn netns_exec(&self, namespace: &NamespaceName, inner: &CommandSpec) -> CommandSpec {
        let mut args = vec![
            "netns".to_string(),
            "exec".to_string(),
            namespace.to_string(),
            inner.program.clone(),
        ];
        args.extend(inner.args.iter().cloned());
        CommandSpec {
            program: self.program.clone(),
            args,
        }
    }
}

/// True if `name` is listed in `ip netns list` output
///
/// Lines look like `ha-test (id: 0)` or just `ha-test`.
#[must_use]
pub fn netns_list_contains(output: &str, name: &NamespaceName) -> bool {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|first| first == name.as_str())
}

/// True if `ip addr show` output carries `address` as an `inet` entry
///
/// Only the host part is compared, so `2.2.2.3/16` still counts as
/// assigned when the target is `2.2.2.3/24`.
#[must_use]
pub fn addr_show_contains(output: &str, address: &CidrAddress) -> bool {
    let host = address.host().to_string();
    output.lines().any(|line| {
        let mut tokens = line.split_whitespace();
        tokens.next() == Some("inet")
            && tokens
                .next()
                .and_then(|cidr| cidr.split('/').next())
                .is_some_and(|found| found == host)
    })
}
