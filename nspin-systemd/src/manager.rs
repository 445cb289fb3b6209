//! Unit lifecycle: install, remove, status, restart

use nspin_core::{Error, Result, Settings};
use nspin_netns::{CommandSpec, Executor, FailurePolicy};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::SYSTEMCTL;
use crate::unit::UnitFile;

/// What `install_unit` did to the file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No unit file existed
    Created,
    /// An existing unit file with different or unreadable contents was replaced
    Updated,
    /// The existing file already had the rendered contents
    Unchanged,
}

/// Manages the boot unit of one target
#[derive(Debug, Clone)]
pub struct UnitManager {
    executor: Executor,
    unit: UnitFile,
    path: PathBuf,
}

impl UnitManager {
    /// Create a manager for the target described by `settings`
    #[must_use]
    pub fn new(executor: Executor, settings: &Settings) -> Self {
        let unit = UnitFile::render(&settings.target, &settings.paths.ip_path);
        let path = settings.paths.unit_dir.join(unit.name());
        Self {
            executor,
            unit,
            path,
        }
    }

    /// The rendered unit
    #[must_use]
    pub const fn unit(&self) -> &UnitFile {
        &self.unit
    }

    /// Where the unit file lives
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn systemctl(&self, args: &[&str]) -> CommandSpec {
        let mut argv = args.to_vec();
        argv.push(self.unit.name());
        CommandSpec::new(SYSTEMCTL, argv)
    }

    async fn daemon_reload(&self) -> Result<()> {
        self.executor
            .run(
                &CommandSpec::new(SYSTEMCTL, ["daemon-reload"]),
                FailurePolicy::Propagate,
            )
            .await?;
        Ok(())
    }

    /// Write the unit file, reload systemd and enable the unit
    ///
    /// Any existing file is overwritten.
    ///
    /// # Errors
    /// Returns error if the file cannot be written or `systemctl` fails
    pub async fn install_unit(&self) -> Result<InstallOutcome> {
        info!("--- Creating systemd service for persistence ---");

        let outcome = match fs::read_to_string(&self.path).await {
            Ok(existing) if existing == self.unit.body() => InstallOutcome::Unchanged,
            Err(e) if e.kind() == ErrorKind::NotFound => InstallOutcome::Created,
            Ok(_) | Err(_) => InstallOutcome::Updated,
        };

        if let Some(dir) = self.path.parent()
            && !dir.exists()
        {
            debug!("Creating unit directory: {}", dir.display());
            fs::create_dir_all(dir).await?;
        }

        fs::write(&self.path, self.unit.body())
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => Error::PermissionDenied {
                    operation: format!("Write {}: {e}", self.path.display()),
                },
                _ => Error::Io(e),
            })?;

        match outcome {
            InstallOutcome::Created => info!("Created {}", self.path.display()),
            InstallOutcome::Updated => info!("Updated {} with new contents", self.path.display()),
            InstallOutcome::Unchanged => info!("{} unchanged", self.path.display()),
        }

        self.daemon_reload().await?;
        self.executor
            .run(&self.systemctl(&["enable"]), FailurePolicy::Propagate)
            .await?;

        info!("Systemd service {} created and enabled.", self.unit.name());
        Ok(outcome)
    }

    /// Disable the unit and delete its file
    ///
    /// Returns whether a file was deleted.
    ///
    /// # Errors
    /// Returns error if the file cannot be deleted or the reload fails
    pub async fn remove_unit(&self) -> Result<bool> {
        info!("--- Removing systemd service ---");

        self.executor
            .run(&self.systemctl(&["disable"]), FailurePolicy::Tolerate)
            .await?;

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!("Service file {} not found, skipping.", self.path.display());
            return Ok(false);
        }

        fs::remove_file(&self.path).await?;
        self.daemon_reload().await?;
        info!("Removed {}", self.path.display());
        Ok(true)
    }

    /// Whether systemd reports the unit as enabled
    pub async fn is_enabled(&self) -> bool {
        self.executor
            .capture(&self.systemctl(&["is-enabled"]))
            .await
            .is_ok_and(|out| out.success())
    }

    /// Stream the unit's enablement and runtime status to the operator
    ///
    /// # Errors
    /// Currently infallible; both queries tolerate failure
    pub async fn unit_status(&self) -> Result<()> {
        info!("--- Systemd Service Status ---");
        self.executor
            .run(&self.systemctl(&["is-enabled"]), FailurePolicy::Tolerate)
            .await?;
        self.executor
            .run(&self.systemctl(&["status", "--no-pager"]), FailurePolicy::Tolerate)
            .await?;
        Ok(())
    }

    /// Restart the unit
    ///
    /// # Errors
    /// Returns error if `systemctl restart` fails
    pub async fn restart_unit(&self) -> Result<()> {
        info!("--- Restarting systemd service ---");
        self.executor
            .run(&self.systemctl(&["restart"]), FailurePolicy::Propagate)
            .await?;
        Ok(())
    }
}
