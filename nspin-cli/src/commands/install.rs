//! Install command implementation

use super::App;
use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use tokio::fs;

pub async fn execute(app: &App) -> Result<()> {
    let ns = &app.settings.target.namespace;
    let install_dir = &app.settings.paths.install_dir;
    let dest = install_dir.join(format!("ns-{ns}"));

    tracing::info!("--- Installing executable to {} ---", dest.display());

    let source = std::env::current_exe().context("Failed to locate running executable")?;

    fs::create_dir_all(install_dir)
        .await
        .with_context(|| format!("Failed to create {}", install_dir.display()))?;
    fs::copy(&source, &dest)
        .await
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
    fs::set_permissions(&dest, std::fs::Permissions::from_mode(0o755))
        .await
        .with_context(|| format!("Failed to make {} executable", dest.display()))?;

    println!("\n✅ Installed as: {}", dest.display());
    println!("\nUsage:\n  sudo ns-{ns} add | test | test2 | status | remove | etc.");

    Ok(())
}
