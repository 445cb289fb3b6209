//! Snapshot of what the host currently looks like

use std::fmt;

/// Where the target interface is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceLocation {
    /// Not visible in the root namespace nor the target namespace
    Absent,
    /// Visible in the root namespace
    InRootNamespace,
    /// Visible inside the target namespace
    InTargetNamespace,
}

impl fmt::Display for InterfaceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::InRootNamespace => write!(f, "root namespace"),
            Self::InTargetNamespace => write!(f, "target namespace"),
        }
    }
}

/// Observed OS state, derived fresh for every query and never cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservedState {
    /// Target namespace is listed
    pub namespace_exists: bool,
    /// Where the interface is
    pub interface_location: InterfaceLocation,
    /// Target address already present on the interface inside the namespace
    pub address_assigned: bool,
}

impl ObservedState {
    /// True if nothing is left for a non-forced converge to change, apart
    /// from the naturally idempotent bring-up and route steps
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.namespace_exists
            && matches!(self.interface_location, InterfaceLocation::InTargetNamespace)
            && self.address_assigned
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Observed state:")?;
        writeln!(f, "  Namespace: {}", yes_no(self.namespace_exists))?;
        writeln!(f, "  Interface: {}", self.interface_location)?;
        writeln!(f, "  Address:   {}", yes_no(self.address_assigned))
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "present" } else { "absent" }
}
