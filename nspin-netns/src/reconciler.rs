//! Converge one namespace towards its target state

use nspin_core::{Error, ReconcileEvent, Result, TargetConfig};
use tracing::info;

use crate::executor::{Executor, FailurePolicy, Outcome};
use crate::inspector::StateInspector;
use crate::ip::Ip;
use crate::step::{Check, Step};

/// What a converge run did, step by step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergeReport {
    /// Events in the order they happened
    pub events: Vec<ReconcileEvent>,
}

impl ConvergeReport {
    fn push(&mut self, event: ReconcileEvent) {
        event.emit_trace();
        self.events.push(event);
    }

    fn steps_where(&self, pick: impl Fn(&ReconcileEvent) -> Option<&String>) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(pick)
            .map(String::as_str)
            .collect()
    }

    /// Descriptions of steps whose command ran and succeeded
    #[must_use]
    pub fn applied(&self) -> Vec<&str> {
        self.steps_where(|e| match e {
            ReconcileEvent::StepApplied { step } => Some(step),
            _ => None,
        })
    }

    /// Descriptions of steps skipped by their guard
    #[must_use]
    pub fn skipped(&self) -> Vec<&str> {
        self.steps_where(|e| match e {
            ReconcileEvent::StepSkipped { step, .. } => Some(step),
            _ => None,
        })
    }

    /// Descriptions of steps that failed under a tolerate policy
    #[must_use]
    pub fn tolerated(&self) -> Vec<&str> {
        self.steps_where(|e| match e {
            ReconcileEvent::StepTolerated { step, .. } => Some(step),
            _ => None,
        })
    }
}

/// Target-state reconciler
#[derive(Debug, Clone)]
pub struct Reconciler {
    executor: Executor,
    inspector: StateInspector,
    ip: Ip,
}

impl Reconciler {
    /// Create a reconciler for a target
    #[must_use]
    pub fn new(executor: Executor, target: TargetConfig) -> Self {
        let inspector = StateInspector::new(executor.clone(), target);
        Self {
            executor,
            inspector,
            ip: Ip::default(),
        }
    }

    /// Inspector bound to the same target
    #[must_use]
    pub const fn inspector(&self) -> &StateInspector {
        &self.inspector
    }

    const fn target(&self) -> &TargetConfig {
        self.inspector.target()
    }

    /// The ordered steps of a converge run
    ///
    /// Guards are not evaluated here; each one is checked right before its
    /// step runs, because earlier steps change the answers.
    #[must_use]
    pub fn plan(&self, force: bool) -> Vec<Step> {
        let target = self.target();
        let ns = &target.namespace;
        let iface = &target.interface;
        let inside = |cmd| self.ip.netns_exec(ns, &cmd);

        let mut steps = Vec::with_capacity(7);

        if force {
            steps.push(
                Step::new(
                    "Creating Namespace",
                    format!("Delete namespace {ns} for force-add"),
                    self.ip.netns_delete(ns),
                )
                .only_if(Check::NamespaceExists, format!("Namespace {ns} not present")),
            );
        }

        steps.push(
            Step::new(
                "Creating Namespace",
                format!("Create namespace {ns}"),
                self.ip.netns_add(ns),
            )
            .unless(Check::NamespaceExists, format!("Namespace {ns} already exists")),
        );

        steps.push(
            Step::new(
                "Moving Interface to Namespace",
                format!("Move interface {iface} into {ns}"),
                self.ip.link_set_netns(iface, ns),
            )
            .unless(
                Check::InterfaceInNamespace,
                format!("Interface '{iface}' is already inside namespace '{ns}'"),
            ),
        );

        steps.push(Step::new(
            "Bringing Interface Up",
            format!("Bring {iface} up"),
            inside(self.ip.link_up(iface.as_str())),
        ));

        steps.push(Step::new(
            "Bringing Interface Up",
            "Bring lo up",
            inside(self.ip.link_up("lo")),
        ));

        steps.push(
            Step::new(
                "Setting IP Address",
                format!("Assign {} to {iface}", target.address),
                inside(self.ip.addr_add(&target.address, iface)),
            )
            .unless(
                Check::AddressAssigned,
                format!(
                    "IP address {} already exists on interface '{iface}'",
                    target.address
                ),
            ),
        );

        steps.push(
            Step::new(
                "Setting Default Route",
                format!("Add default route via {}", target.gateway),
                inside(self.ip.route_add_default(target.gateway)),
            )
            .tolerate_failure(),
        );

        steps
    }

    async fn holds(&self, check: Check) -> bool {
        match check {
            Check::NamespaceExists => self.inspector.namespace_exists().await,
            Check::InterfaceInNamespace => self.inspector.interface_in_namespace().await,
            Check::AddressAssigned => self.inspector.address_assigned().await,
        }
    }

    /// Run steps in order, evaluating each guard right before its step
    ///
    /// # Errors
    /// Returns the first failure of a step whose policy is `Propagate`
    pub async fn apply(&self, steps: &[Step], report: &mut ConvergeReport) -> Result<()> {
        let mut section = "";

        for step in steps {
            if step.section != section {
                section = step.section;
                info!("--- {section} ---");
            }

            if let Some(check) = step.guard.check()
                && !step.guard.admits(self.holds(check).await)
            {
                report.push(ReconcileEvent::StepSkipped {
                    step: step.description.clone(),
                    reason: step.skip_note.clone(),
                });
                continue;
            }

            match self.executor.run(&step.command, step.policy).await? {
                Outcome::Succeeded => report.push(ReconcileEvent::StepApplied {
                    step: step.description.clone(),
                }),
                Outcome::Tolerated(status) => report.push(ReconcileEvent::StepTolerated {
                    step: step.description.clone(),
                    status,
                }),
            }
        }

        Ok(())
    }

    /// Bring the host to the target state
    ///
    /// With `force`, an existing namespace is deleted and recreated first,
    /// discarding anything else inside it.
    ///
    /// # Errors
    /// Returns [`Error::InterfaceMissing`] before any change if the interface
    /// is not visible, or the first propagated command failure
    pub async fn converge(&self, force: bool) -> Result<ConvergeReport> {
        let target = self.target();
        let mut report = ConvergeReport::default();

        info!("--- Checking if interface '{}' exists ---", target.interface);
        if !self.inspector.interface_exists().await {
            report.push(ReconcileEvent::PreconditionFailed {
                interface: target.interface.to_string(),
            });
            let namespace = self
                .inspector
                .namespace_exists()
                .await
                .then(|| target.namespace.to_string());
            return Err(Error::InterfaceMissing {
                interface: target.interface.to_string(),
                namespace,
            });
        }

        self.apply(&self.plan(force), &mut report).await?;

        report.push(ReconcileEvent::Converged {
            namespace: target.namespace.to_string(),
            forced: force,
        });

        Ok(report)
    }

    /// Delete the namespace if it exists
    ///
    /// Returns whether a namespace was deleted.
    ///
    /// # Errors
    /// Returns error if `ip netns del` fails
    pub async fn delete_namespace(&self) -> Result<bool> {
        let ns = &self.target().namespace;
        info!("--- Removing Namespace ---");

        if !self.inspector.namespace_exists().await {
            info!("Namespace {ns} not found, skipping.");
            return Ok(false);
        }

        self.executor
            .run(&self.ip.netns_delete(ns), FailurePolicy::Propagate)
            .await?;
        Ok(true)
    }
}
