//! Remove command implementation

use super::App;
use anyhow::{Context, Result};

pub async fn execute(app: &App) -> Result<()> {
    let ns = &app.settings.target.namespace;
    tracing::info!(namespace = %ns, "Removing namespace");

    app.units()
        .remove_unit()
        .await
        .context("Failed to remove systemd service")?;

    app.reconciler()
        .delete_namespace()
        .await
        .context("Failed to delete namespace")?;

    println!("\n✅ Namespace '{ns}' and service removed.");
    Ok(())
}
