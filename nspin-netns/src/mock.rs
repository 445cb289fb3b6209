//! Simulated host for testing without root or a real network stack
//!
//! [`MockRunner`] interprets the subset of `ip`, `systemctl`, `ping`,
//! `iperf` and `which` invocations this workspace issues, against an
//! in-memory model of namespaces, links, addresses, routes and units.

use async_trait::async_trait;
use nspin_core::{CidrAddress, Error, InterfaceLocation, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::runner::{CommandOutput, CommandRunner, CommandSpec, OutputMode};

const BUILTIN_PROGRAMS: [&str; 4] = ["ip", "ping", "systemctl", "which"];

#[derive(Debug, Clone, Default)]
struct Link {
    up: bool,
    addresses: Vec<CidrAddress>,
}

#[derive(Debug, Clone)]
struct Namespace {
    links: BTreeMap<String, Link>,
    default_route: Option<Ipv4Addr>,
}

impl Namespace {
    fn fresh() -> Self {
        let mut links = BTreeMap::new();
        links.insert("lo".to_string(), Link::default());
        Self {
            links,
            default_route: None,
        }
    }
}

/// Initial state of a simulated host, built up fluently
#[derive(Debug, Clone, Default)]
pub struct SimulatedHost {
    namespaces: BTreeMap<String, Namespace>,
    root_links: BTreeSet<String>,
    binaries: BTreeSet<String>,
    unreachable: BTreeSet<String>,
    broken_programs: BTreeSet<String>,
    enabled_units: BTreeSet<String>,
    active_units: BTreeSet<String>,
    daemon_reloads: usize,
    namespaces_created: usize,
}

impl SimulatedHost {
    /// Empty host: no namespaces, no interfaces besides loopback
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface to the root namespace
    #[must_use]
    pub fn with_root_interface(mut self, name: &str) -> Self {
        self.root_links.insert(name.to_string());
        self
    }

    /// Add an empty namespace
    #[must_use]
    pub fn with_namespace(mut self, name: &str) -> Self {
        self.namespaces.insert(name.to_string(), Namespace::fresh());
        self
    }

    /// Make an extra binary (e.g. `iperf`) available
    #[must_use]
    pub fn with_binary(mut self, name: &str) -> Self {
        self.binaries.insert(name.to_string());
        self
    }

    /// Make pings to `target` fail
    #[must_use]
    pub fn with_unreachable(mut self, target: &str) -> Self {
        self.unreachable.insert(target.to_string());
        self
    }

    /// Make launching `program` fail as if it could not be executed
    #[must_use]
    pub fn with_broken_program(mut self, program: &str) -> Self {
        self.broken_programs.insert(program.to_string());
        self
    }

    /// Start with a unit already enabled
    #[must_use]
    pub fn with_enabled_unit(mut self, unit: &str) -> Self {
        self.enabled_units.insert(unit.to_string());
        self
    }

    fn has_program(&self, program: &str) -> bool {
        BUILTIN_PROGRAMS.contains(&program) || self.binaries.contains(program)
    }

    fn links(&self, namespace: Option<&str>) -> Option<BTreeSet<String>> {
        match namespace {
            None => Some(self.root_links.clone()),
            Some(ns) => self
                .namespaces
                .get(ns)
                .map(|n| n.links.keys().cloned().collect()),
        }
    }

    fn execute(&mut self, argv: &[&str], namespace: Option<&str>) -> Reply {
        let Some((&program, args)) = argv.split_first() else {
            return Reply::fail(255, "empty command");
        };
        let program = Path::new(program)
            .file_name()
            .and_then(|p| p.to_str())
            .unwrap_or(program);

        match program {
            "ip" => self.ip(args, namespace),
            "ping" => self.ping(args),
            "which" => self.which(args),
            "systemctl" => self.systemctl(args),
            "iperf" if self.binaries.contains("iperf") => Reply::ok("[  1] 0.0-10.0 sec  112 MBytes  94.0 Mbits/sec"),
            other => Reply::fail(127, &format!("{other}: command not found")),
        }
    }

    fn ip(&mut self, args: &[&str], ctx: Option<&str>) -> Reply {
        match args {
            ["netns", "list"] => {
                let listing: String = self
                    .namespaces
                    .keys()
                    .enumerate()
                    .map(|(id, name)| format!("{name} (id: {id})\n"))
                    .collect();
                Reply::ok(&listing)
            }
            ["netns", "add", name] => {
                if self.namespaces.contains_key(*name) {
                    return Reply::fail(1, &format!("Cannot create namespace file \"/run/netns/{name}\": File exists"))
                        .mutating();
                }
                self.namespaces.insert((*name).to_string(), Namespace::fresh());
                self.namespaces_created += 1;
                Reply::ok("").mutating()
            }
            ["netns", "del" | "delete", name] => match self.namespaces.remove(*name) {
                // Physical devices fall back to the root namespace, addresses flushed
                Some(removed) => {
                    self.root_links
                        .extend(removed.links.into_keys().filter(|l| l != "lo"));
                    Reply::ok("").mutating()
                }
                None => Reply::fail(
                    1,
                    &format!("Cannot remove namespace file \"/run/netns/{name}\": No such file or directory"),
                )
                .mutating(),
            },
            ["netns", "exec", name, inner @ ..] => {
                if !self.namespaces.contains_key(*name) {
                    return Reply::fail(
                        1,
                        &format!("Cannot open network namespace \"{name}\": No such file or directory"),
                    );
                }
                let Some(&program) = inner.first() else {
                    return Reply::fail(255, "No command specified");
                };
                if !self.has_program(program) {
                    return Reply::fail(255, &format!("exec of \"{program}\" failed: No such file or directory"));
                }
                self.execute(inner, Some(*name))
            }
            ["link", "show", interface] => match self.links(ctx) {
                Some(links) if links.contains(*interface) => {
                    Reply::ok(&format!("3: {interface}: <BROADCAST,MULTICAST> mtu 1500\n"))
                }
                _ => Reply::fail(1, &format!("Device \"{interface}\" does not exist.")),
            },
            ["link", "set", "dev", interface, "netns", target] => {
                if ctx.is_some() || !self.root_links.contains(*interface) {
                    return Reply::fail(1, "Cannot find device").mutating();
                }
                let Some(ns) = self.namespaces.get_mut(*target) else {
                    return Reply::fail(1, &format!("Invalid \"netns\" value \"{target}\"")).mutating();
                };
                self.root_links.remove(*interface);
                ns.links.insert((*interface).to_string(), Link::default());
                Reply::ok("").mutating()
            }
            ["link", "set", interface, "up"] => match self.link_mut(ctx, interface) {
                Some(link) => {
                    link.up = true;
                    Reply::ok("").mutating()
                }
                None => Reply::fail(1, "Cannot find device").mutating(),
            },
            ["addr", "show", "dev", interface] => match self.link_mut(ctx, interface) {
                Some(link) => {
                    let mut out = format!("3: {interface}: <BROADCAST,MULTICAST> mtu 1500\n");
                    for addr in &link.addresses {
                        out.push_str(&format!("    inet {addr} scope global {interface}\n"));
                    }
                    Reply::ok(&out)
                }
                None => Reply::fail(1, &format!("Device \"{interface}\" does not exist.")),
            },
            ["addr", "add", cidr, "dev", interface] => {
                let Ok(address) = cidr.parse::<CidrAddress>() else {
                    return Reply::fail(1, "Error: any valid prefix is expected").mutating();
                };
                match self.link_mut(ctx, interface) {
                    Some(link) if link.addresses.contains(&address) => {
                        Reply::fail(2, "RTNETLINK answers: File exists").mutating()
                    }
                    Some(link) => {
                        link.addresses.push(address);
                        Reply::ok("").mutating()
                    }
                    None => Reply::fail(1, "Cannot find device").mutating(),
                }
            }
            ["route", "add", "default", "via", gateway] => {
                let Some(ns) = ctx.and_then(|name| self.namespaces.get_mut(name)) else {
                    return Reply::fail(2, "RTNETLINK answers: Operation not permitted").mutating();
                };
                let Ok(gateway) = gateway.parse::<Ipv4Addr>() else {
                    return Reply::fail(1, "Error: inet address is expected").mutating();
                };
                if ns.default_route.is_some() {
                    return Reply::fail(2, "RTNETLINK answers: File exists").mutating();
                }
                let on_link = ns
                    .links
                    .values()
                    .filter(|l| l.up)
                    .flat_map(|l| l.addresses.iter())
                    .any(|addr| same_subnet(addr, gateway));
                if !on_link {
                    return Reply::fail(2, "RTNETLINK answers: Network is unreachable").mutating();
                }
                ns.default_route = Some(gateway);
                Reply::ok("").mutating()
            }
            _ => Reply::fail(255, &format!("simulated ip: unsupported arguments {args:?}")),
        }
    }

    fn link_mut(&mut self, ctx: Option<&str>, interface: &str) -> Option<&mut Link> {
        self.namespaces.get_mut(ctx?)?.links.get_mut(interface)
    }

    fn ping(&self, args: &[&str]) -> Reply {
        match args.last() {
            Some(target) if !self.unreachable.contains(*target) => {
                Reply::ok(&format!("--- {target} ping statistics ---\n0% packet loss\n"))
            }
            Some(target) => Reply::fail(1, &format!("--- {target} ping statistics ---\n100% packet loss")),
            None => Reply::fail(2, "ping: usage error: Destination address required"),
        }
    }

    fn which(&self, args: &[&str]) -> Reply {
        match args {
            [program] if self.has_program(program) => Reply::ok(&format!("/usr/bin/{program}\n")),
            _ => Reply::fail(1, ""),
        }
    }

    fn systemctl(&mut self, args: &[&str]) -> Reply {
        let args: Vec<&str> = args
            .iter()
            .copied()
            .filter(|a| !a.starts_with("--"))
            .collect();

        match args.as_slice() {
            ["daemon-reload"] => {
                self.daemon_reloads += 1;
                Reply::ok("").mutating()
            }
            ["enable", unit] => {
                self.enabled_units.insert((*unit).to_string());
                Reply::ok("").mutating()
            }
            ["disable", unit] => {
                if self.enabled_units.remove(*unit) {
                    self.active_units.remove(*unit);
                    Reply::ok("").mutating()
                } else {
                    Reply::fail(1, &format!("Failed to disable unit: Unit file {unit} does not exist.")).mutating()
                }
            }
            ["restart", unit] => {
                if self.enabled_units.contains(*unit) {
                    self.active_units.insert((*unit).to_string());
                    Reply::ok("").mutating()
                } else {
                    Reply::fail(5, &format!("Failed to restart {unit}: Unit {unit} not found.")).mutating()
                }
            }
            ["is-enabled", unit] => {
                if self.enabled_units.contains(*unit) {
                    Reply::ok("enabled\n")
                } else {
                    Reply::fail(1, "disabled")
                }
            }
            ["status", unit] => {
                if self.active_units.contains(*unit) {
                    Reply::ok(&format!("{unit} - active (exited)\n"))
                } else {
                    Reply::fail(3, &format!("{unit} - inactive (dead)\n"))
                }
            }
            _ => Reply::fail(1, "simulated systemctl: unsupported arguments"),
        }
    }
}

fn same_subnet(address: &CidrAddress, other: Ipv4Addr) -> bool {
    let mask = u32::MAX
        .checked_shl(32 - u32::from(address.prefix_len()))
        .unwrap_or(0);
    (u32::from(address.host()) & mask) == (u32::from(other) & mask)
}

struct Reply {
    output: CommandOutput,
    mutating: bool,
}

impl Reply {
    fn ok(stdout: &str) -> Self {
        Self {
            output: CommandOutput {
                code: Some(0),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
            mutating: false,
        }
    }

    fn fail(code: i32, stderr: &str) -> Self {
        Self {
            output: CommandOutput {
                code: Some(code),
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            },
            mutating: false,
        }
    }

    const fn mutating(mut self) -> Self {
        self.mutating = true;
        self
    }
}

/// A recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// The command as issued
    pub command: CommandSpec,
    /// How its output was handled
    pub mode: OutputMode,
    /// Whether the simulated host treats it as a state change attempt
    pub mutating: bool,
}

struct MockState {
    host: SimulatedHost,
    calls: Vec<MockCall>,
}

/// Mock runner for testing (doesn't touch the real network stack)
///
/// # Example
/// ```
/// use nspin_netns::{CommandRunner, CommandSpec, MockRunner, OutputMode, SimulatedHost};
///
/// # tokio_test::block_on(async {
/// let mock = MockRunner::new(SimulatedHost::new().with_root_interface("ha-0-0"));
///
/// let add = CommandSpec::new("ip", ["netns", "add", "ha-test"]);
/// mock.run(&add, OutputMode::Stream).await.unwrap();
///
/// assert!(mock.namespace_exists("ha-test").await);
/// assert_eq!(mock.mutations().await, vec!["ip netns add ha-test"]);
/// # });
/// ```
#[derive(Clone)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

impl MockRunner {
    /// Create a runner over a simulated host
    #[must_use]
    pub fn new(host: SimulatedHost) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                host,
                calls: Vec::new(),
            })),
        }
    }

    /// Every call so far
    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// Every call so far, rendered
    pub async fn commands(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .map(|c| c.command.to_string())
            .collect()
    }

    /// Calls that attempted a state change, rendered
    pub async fn mutations(&self) -> Vec<String> {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.mutating)
            .map(|c| c.command.to_string())
            .collect()
    }

    /// Forget recorded calls, keeping host state
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Check if a namespace exists
    pub async fn namespace_exists(&self, name: &str) -> bool {
        self.state.lock().await.host.namespaces.contains_key(name)
    }

    /// How many times `ip netns add` succeeded
    pub async fn namespaces_created(&self) -> usize {
        self.state.lock().await.host.namespaces_created
    }

    /// Where an interface is, relative to `namespace`
    pub async fn interface_location(&self, interface: &str, namespace: &str) -> InterfaceLocation {
        let state = self.state.lock().await;
        let host = &state.host;
        if host
            .namespaces
            .get(namespace)
            .is_some_and(|ns| ns.links.contains_key(interface))
        {
            InterfaceLocation::InTargetNamespace
        } else if host.root_links.contains(interface) {
            InterfaceLocation::InRootNamespace
        } else {
            InterfaceLocation::Absent
        }
    }

    /// Addresses on an interface inside a namespace
    pub async fn addresses(&self, namespace: &str, interface: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .host
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.links.get(interface))
            .map(|link| link.addresses.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether a link inside a namespace is up
    pub async fn link_is_up(&self, namespace: &str, interface: &str) -> bool {
        let state = self.state.lock().await;
        state
            .host
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.links.get(interface))
            .is_some_and(|link| link.up)
    }

    /// Default route of a namespace
    pub async fn default_route(&self, namespace: &str) -> Option<Ipv4Addr> {
        let state = self.state.lock().await;
        state.host.namespaces.get(namespace)?.default_route
    }

    /// Whether a unit is enabled
    pub async fn unit_enabled(&self, unit: &str) -> bool {
        self.state.lock().await.host.enabled_units.contains(unit)
    }

    /// Whether a unit has been (re)started and not disabled since
    pub async fn unit_active(&self, unit: &str) -> bool {
        self.state.lock().await.host.active_units.contains(unit)
    }

    /// Number of `systemctl daemon-reload` calls
    pub async fn daemon_reloads(&self) -> usize {
        self.state.lock().await.host.daemon_reloads
    }
}

impl std::fmt::Debug for MockRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRunner").finish_non_exhaustive()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &CommandSpec, mode: OutputMode) -> Result<CommandOutput> {
        let mut state = self.state.lock().await;

        let program = Path::new(&command.program)
            .file_name()
            .and_then(|p| p.to_str())
            .unwrap_or(&command.program)
            .to_string();

        if state.host.broken_programs.contains(&program) {
            return Err(Error::Spawn {
                command: command.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        if !state.host.has_program(&program) {
            return Err(Error::Spawn {
                command: command.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        let reply = state.host.execute(&command.argv(), None);

        tracing::debug!(
            command = %command,
            code = ?reply.output.code,
            mutating = reply.mutating,
            "Mock: Ran command"
        );

        state.calls.push(MockCall {
            command: command.clone(),
            mode,
            mutating: reply.mutating,
        });

        Ok(reply.output)
    }
}
