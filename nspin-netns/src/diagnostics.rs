//! Connectivity probes run inside the namespace

use nspin_core::{DiagnosticsConfig, Result, TargetConfig};
use std::net::Ipv4Addr;
use tracing::{info, warn};

use crate::executor::{Executor, FailurePolicy, Outcome};
use crate::inspector::StateInspector;
use crate::ip::Ip;
use crate::runner::CommandSpec;

/// Outcome of pinging one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Probed address
    pub target: Ipv4Addr,
    /// Whether the ping succeeded
    pub reachable: bool,
}

/// Outcome of the reachability sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachabilityReport {
    /// The namespace was missing, so nothing was probed
    pub namespace_missing: bool,
    /// One entry per target, in probe order
    pub results: Vec<ProbeResult>,
}

impl ReachabilityReport {
    /// Targets that did not answer
    #[must_use]
    pub fn failed(&self) -> Vec<Ipv4Addr> {
        self.results
            .iter()
            .filter(|r| !r.reachable)
            .map(|r| r.target)
            .collect()
    }

    /// Every target answered
    #[must_use]
    pub fn all_reachable(&self) -> bool {
        !self.namespace_missing && self.results.iter().all(|r| r.reachable)
    }
}

/// Outcome of the throughput probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThroughputOutcome {
    /// The throughput client is not installed
    ToolMissing,
    /// The client session ran to completion
    Completed,
}

/// Reachability and throughput probes for one target
#[derive(Debug, Clone)]
pub struct Diagnostics {
    executor: Executor,
    inspector: StateInspector,
    config: DiagnosticsConfig,
    ip: Ip,
}

impl Diagnostics {
    /// Create probes for a target
    #[must_use]
    pub fn new(executor: Executor, target: TargetConfig, config: DiagnosticsConfig) -> Self {
        let inspector = StateInspector::new(executor.clone(), target);
        Self {
            executor,
            inspector,
            config,
            ip: Ip::default(),
        }
    }

    /// Gateway first, then the configured probe targets
    #[must_use]
    pub fn reachability_targets(&self) -> Vec<Ipv4Addr> {
        std::iter::once(self.inspector.target().gateway)
            .chain(self.config.probe_targets.iter().copied())
            .collect()
    }

    /// Ping every target from inside the namespace
    ///
    /// A failing target never stops the remaining ones. If the namespace
    /// does not exist nothing is probed.
    ///
    /// # Errors
    /// Currently infallible; failures are recorded in the report
    pub async fn test_reachability(&self) -> Result<ReachabilityReport> {
        let ns = &self.inspector.target().namespace;
        info!("--- TESTING Namespace (Ping) ---");

        if !self.inspector.namespace_exists().await {
            warn!("Namespace '{ns}' does not exist. Please run 'add' first.");
            return Ok(ReachabilityReport {
                namespace_missing: true,
                results: Vec::new(),
            });
        }

        let count = self.config.ping_count.to_string();
        let mut report = ReachabilityReport::default();

        for target in self.reachability_targets() {
            info!("Pinging {target} inside namespace {ns}...");
            let ping = CommandSpec::new("ping", ["-c".to_string(), count.clone(), target.to_string()]);
            let cmd = self.ip.netns_exec(ns, &ping);

            let reachable = match self.executor.run(&cmd, FailurePolicy::Tolerate).await? {
                Outcome::Succeeded => true,
                Outcome::Tolerated(_) => {
                    warn!("Ping to {target} failed.");
                    false
                }
            };
            report.results.push(ProbeResult { target, reachable });
        }

        Ok(report)
    }

    /// Run one throughput client session from inside the namespace
    ///
    /// # Errors
    /// Returns error if the client exits non-zero or cannot be launched
    pub async fn test_throughput(&self) -> Result<ThroughputOutcome> {
        let ns = &self.inspector.target().namespace;
        let binary = &self.config.iperf_binary;
        info!("--- TEST2: Verifying {binary} connection in namespace {ns} ---");

        let which = CommandSpec::new("which", [binary.as_str()]);
        let installed = self
            .executor
            .capture(&which)
            .await
            .is_ok_and(|out| out.success());

        if !installed {
            warn!("{binary} not found.");
            return Ok(ThroughputOutcome::ToolMissing);
        }

        let client = CommandSpec::new(
            binary.clone(),
            [
                "-p".to_string(),
                self.config.iperf_port.to_string(),
                "-c".to_string(),
                self.config.iperf_host.clone(),
            ],
        );
        self.executor
            .run(&self.ip.netns_exec(ns, &client), FailurePolicy::Propagate)
            .await?;

        Ok(ThroughputOutcome::Completed)
    }
}
