//! Restart and reload command implementations

use super::App;
use anyhow::{Context, Result};

/// Tear down unit and namespace, then build both again
pub async fn execute(app: &App) -> Result<()> {
    let ns = &app.settings.target.namespace;
    tracing::info!(namespace = %ns, "Restarting namespace and service");

    let units = app.units();
    let reconciler = app.reconciler();

    units
        .remove_unit()
        .await
        .context("Failed to remove systemd service")?;
    reconciler
        .delete_namespace()
        .await
        .context("Failed to delete namespace")?;

    reconciler
        .converge(false)
        .await
        .context("Failed to set up namespace")?;
    units
        .install_unit()
        .await
        .context("Failed to install systemd service")?;

    println!("\n✅ Restart complete.");
    Ok(())
}

/// Rewrite the unit and restart it; the live namespace is left to the unit
pub async fn reload(app: &App) -> Result<()> {
    tracing::info!(namespace = %app.settings.target.namespace, "Reloading service");

    let units = app.units();
    units
        .install_unit()
        .await
        .context("Failed to update systemd service")?;
    units
        .restart_unit()
        .await
        .context("Failed to restart systemd service")?;

    println!("\n✅ Reload complete.");
    Ok(())
}
