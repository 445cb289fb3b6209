//! CLI argument definitions

use clap::Parser;
use nspin_core::TargetOverrides;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const ACTIONS: &str = "\
Actions:
  add        Create the namespace and install the boot unit
  force-add  Like add, but delete and recreate an existing namespace first
  update     Rewrite and re-enable the boot unit only
  remove     Remove the boot unit and delete the namespace
  status     Show namespace, interface, address and unit state
  restart    Remove the unit and namespace, then add them again
  reload     Rewrite the boot unit and restart it
  test       Ping the gateway and probe targets from inside the namespace
  test2      Run a throughput client from inside the namespace
  install    Copy this executable to <install_dir>/ns-<namespace>";

#[derive(Parser)]
#[command(name = "nspin")]
#[command(about = "Persistent network namespace manager", long_about = None)]
#[command(version)]
#[command(after_help = ACTIONS)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Namespace name
    #[arg(long)]
    pub namespace: Option<String>,

    /// Interface moved into the namespace
    #[arg(long)]
    pub interface: Option<String>,

    /// Address with prefix, e.g. 2.2.2.3/24
    #[arg(long)]
    pub address: Option<String>,

    /// Default gateway inside the namespace
    #[arg(long)]
    pub gateway: Option<String>,

    /// Action to perform (case-insensitive)
    #[arg(value_name = "ACTION")]
    pub action: Option<String>,
}

impl Cli {
    /// The requested action, or a message explaining why there is none
    pub fn action(&self) -> Result<Action, String> {
        match self.action.as_deref() {
            Some(raw) => raw.parse(),
            None => Err("No action given.".to_string()),
        }
    }

    /// Target overrides from the command line
    pub fn overrides(&self) -> TargetOverrides {
        TargetOverrides {
            namespace: self.namespace.clone(),
            interface: self.interface.clone(),
            address: self.address.clone(),
            gateway: self.gateway.clone(),
        }
    }
}

/// Short usage text printed on a missing or unknown action
pub fn usage() -> String {
    format!("Usage: nspin [OPTIONS] <ACTION>\n\n{ACTIONS}\n\nRun 'nspin --help' for options.")
}

/// Top-level verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    ForceAdd,
    Update,
    Remove,
    Status,
    Restart,
    Reload,
    Test,
    Test2,
    Install,
}

impl Action {
    pub const ALL: [Self; 10] = [
        Self::Add,
        Self::ForceAdd,
        Self::Update,
        Self::Remove,
        Self::Status,
        Self::Restart,
        Self::Reload,
        Self::Test,
        Self::Test2,
        Self::Install,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::ForceAdd => "force-add",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Status => "status",
            Self::Restart => "restart",
            Self::Reload => "reload",
            Self::Test => "test",
            Self::Test2 => "test2",
            Self::Install => "install",
        }
    }

    /// Whether the action changes host state and must hold the namespace lock
    pub const fn mutates(self) -> bool {
        matches!(
            self,
            Self::Add | Self::ForceAdd | Self::Update | Self::Remove | Self::Restart | Self::Reload
        )
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| format!("Unknown action: {wanted}"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ADD".parse::<Action>().unwrap(), Action::Add);
        assert_eq!("Force-Add".parse::<Action>().unwrap(), Action::ForceAdd);
        assert_eq!("test2".parse::<Action>().unwrap(), Action::Test2);
    }

    #[test]
    fn test_unknown_action() {
        let err = "bogus".parse::<Action>().unwrap_err();
        assert_eq!(err, "Unknown action: bogus");
    }

    #[test]
    fn test_usage_lists_every_action() {
        let usage = usage();
        for action in Action::ALL {
            assert!(usage.contains(&format!("  {action} ")), "missing {action}");
        }
    }

    #[test]
    fn test_missing_action() {
        let cli = Cli::parse_from(["nspin"]);
        assert!(cli.action().is_err());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::parse_from(["nspin", "--namespace", "blue", "--gateway", "10.0.0.1", "status"]);
        let overrides = cli.overrides();

        assert_eq!(cli.action().unwrap(), Action::Status);
        assert_eq!(overrides.namespace.as_deref(), Some("blue"));
        assert_eq!(overrides.gateway.as_deref(), Some("10.0.0.1"));
        assert!(overrides.interface.is_none());
    }

    #[test]
    fn test_read_only_actions_do_not_lock() {
        assert!(Action::Add.mutates());
        assert!(Action::Reload.mutates());
        assert!(!Action::Status.mutates());
        assert!(!Action::Test.mutates());
        assert!(!Action::Install.mutates());
    }
}
