//! Status command implementation

use super::App;
use anyhow::{Context, Result};
use nspin_core::InterfaceLocation;

pub async fn execute(app: &App) -> Result<()> {
    let target = &app.settings.target;
    let ns = &target.namespace;
    tracing::info!(namespace = %ns, "Checking status");

    println!("\n📋 Namespace Status");
    println!("{:-<60}", "");

    let state = app.reconciler().inspector().observe().await;

    if state.namespace_exists {
        println!("✅ Namespace '{ns}' exists.");
    } else {
        println!("❌ Namespace '{ns}' does not exist.");
    }

    match state.interface_location {
        InterfaceLocation::InTargetNamespace => {
            println!("✅ Interface '{}' is inside '{ns}'.", target.interface);
        }
        InterfaceLocation::InRootNamespace => {
            println!("⚠️  Interface '{}' is in the root namespace.", target.interface);
        }
        InterfaceLocation::Absent => {
            println!("❌ Interface '{}' not found.", target.interface);
        }
    }

    if state.address_assigned {
        println!("✅ Address {} assigned.", target.address);
    } else {
        println!("❌ Address {} not assigned.", target.address);
    }

    if state.is_converged() {
        println!("✅ Namespace '{ns}' is fully set up.");
    } else {
        println!("⚠️  Namespace '{ns}' is not fully set up. Run 'add' to converge it.");
    }

    let units = app.units();
    if units.is_enabled().await {
        println!("✅ Service {} enabled.", units.unit().name());
    } else {
        println!("❌ Service {} not enabled.", units.unit().name());
    }
    println!("{:-<60}", "");

    units
        .unit_status()
        .await
        .context("Failed to query systemd service")?;

    Ok(())
}
