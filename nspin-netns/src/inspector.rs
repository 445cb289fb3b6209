//! Read-only queries against the host's network namespace state
//!
//! Every boolean query fails soft: a non-zero exit and a command that could
//! not even be launched both read as `false`. The `probe_*` variants keep the
//! two apart for callers that care.

use nspin_core::{InterfaceLocation, ObservedState, TargetConfig};
use tracing::warn;

use crate::executor::Executor;
use crate::ip::{self, Ip};
use crate::runner::{CommandOutput, CommandSpec};

/// Result of a single inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// The condition holds
    Present,
    /// The condition does not hold, or the query exited non-zero
    Absent,
    /// The query could not be run at all
    Failed(String),
}

impl Inspection {
    /// Fold into the boolean contract: only `Present` is true
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    const fn from_bool(value: bool) -> Self {
        if value { Self::Present } else { Self::Absent }
    }
}

/// Answers existence questions about one target
#[derive(Debug, Clone)]
pub struct StateInspector {
    executor: Executor,
    target: TargetConfig,
    ip: Ip,
}

impl StateInspector {
    /// Create an inspector for a target
    #[must_use]
    pub fn new(executor: Executor, target: TargetConfig) -> Self {
        Self {
            executor,
            target,
            ip: Ip::default(),
        }
    }

    /// Target this inspector looks at
    #[must_use]
    pub const fn target(&self) -> &TargetConfig {
        &self.target
    }

    async fn query<F>(&self, command: &CommandSpec, interpret: F) -> Inspection
    where
        F: FnOnce(&CommandOutput) -> bool,
    {
        match self.executor.capture(command).await {
            Ok(output) if output.success() => Inspection::from_bool(interpret(&output)),
            Ok(_) => Inspection::Absent,
            Err(e) => {
                warn!("Inspection could not run, treating as absent: {e}");
                Inspection::Failed(e.to_string())
            }
        }
    }

    fn in_namespace(&self, inner: &CommandSpec) -> CommandSpec {
        self.ip.netns_exec(&self.target.namespace, inner)
    }

    /// Whether the namespace is listed by `ip netns list`
    pub async fn probe_namespace_exists(&self) -> Inspection {
        let namespace = &self.target.namespace;
        self.query(&self.ip.netns_list(), |out| {
            ip::netns_list_contains(&out.stdout_string(), namespace)
        })
        .await
    }

    /// Whether the interface is visible inside the target namespace
    pub async fn probe_interface_in_namespace(&self) -> Inspection {
        let cmd = self.in_namespace(&self.ip.link_show(&self.target.interface));
        self.query(&cmd, |_| true).await
    }

    /// Whether the interface is visible in the root namespace
    pub async fn probe_interface_in_root(&self) -> Inspection {
        self.query(&self.ip.link_show(&self.target.interface), |_| true)
            .await
    }

    /// Whether the interface is visible where it is expected to be
    ///
    /// That is inside the target namespace once it exists, and in the root
    /// namespace before that.
    pub async fn probe_interface_exists(&self) -> Inspection {
        match self.probe_namespace_exists().await {
            Inspection::Present => self.probe_interface_in_namespace().await,
            Inspection::Absent => self.probe_interface_in_root().await,
            failed @ Inspection::Failed(_) => failed,
        }
    }

    /// Whether the target address is on the interface inside the namespace
    pub async fn probe_address_assigned(&self) -> Inspection {
        let cmd = self.in_namespace(&self.ip.addr_show(&self.target.interface));
        let address = &self.target.address;
        self.query(&cmd, |out| {
            ip::addr_show_contains(&out.stdout_string(), address)
        })
        .await
    }

    /// See [`Self::probe_namespace_exists`]
    pub async fn namespace_exists(&self) -> bool {
        self.probe_namespace_exists().await.is_present()
    }

    /// See [`Self::probe_interface_exists`]
    pub async fn interface_exists(&self) -> bool {
        self.probe_interface_exists().await.is_present()
    }

    /// See [`Self::probe_interface_in_namespace`]
    pub async fn interface_in_namespace(&self) -> bool {
        self.probe_interface_in_namespace().await.is_present()
    }

    /// See [`Self::probe_address_assigned`]
    pub async fn address_assigned(&self) -> bool {
        self.probe_address_assigned().await.is_present()
    }

    /// Take a full snapshot of the target's state
    pub async fn observe(&self) -> ObservedState {
        let namespace_exists = self.namespace_exists().await;

        let interface_location = if namespace_exists && self.interface_in_namespace().await {
            InterfaceLocation::InTargetNamespace
        } else if self.probe_interface_in_root().await.is_present() {
            InterfaceLocation::InRootNamespace
        } else {
            InterfaceLocation::Absent
        };

        let address_assigned = matches!(interface_location, InterfaceLocation::InTargetNamespace)
            && self.address_assigned().await;

        ObservedState {
            namespace_exists,
            interface_location,
            address_assigned,
        }
    }
}
