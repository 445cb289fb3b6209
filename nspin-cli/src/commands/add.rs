//! Add, force-add and update command implementations

use super::App;
use anyhow::{Context, Result};

pub async fn execute(app: &App, force: bool) -> Result<()> {
    let ns = &app.settings.target.namespace;
    tracing::info!(namespace = %ns, force, "Adding namespace");

    let report = app
        .reconciler()
        .converge(force)
        .await
        .context("Failed to set up namespace")?;
    tracing::debug!(
        applied = report.applied().len(),
        skipped = report.skipped().len(),
        tolerated = report.tolerated().len(),
        "Converge finished"
    );

    app.units()
        .install_unit()
        .await
        .context("Failed to install systemd service")?;

    if force {
        println!("\n✅ Namespace '{ns}' force-added and will persist after reboot.");
    } else {
        println!("\n✅ Namespace '{ns}' added and will persist after reboot.");
    }

    Ok(())
}

pub async fn update(app: &App) -> Result<()> {
    app.units()
        .install_unit()
        .await
        .context("Failed to update systemd service")?;

    println!("\n✅ Service updated with new settings (namespace unchanged).");
    Ok(())
}
