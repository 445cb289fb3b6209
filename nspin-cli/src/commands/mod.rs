use crate::cli::Action;
use anyhow::Result;
use nspin_core::Settings;
use nspin_netns::{CommandRunner, Diagnostics, Executor, Reconciler};
use nspin_systemd::UnitManager;
use std::sync::Arc;

pub mod add;
pub mod install;
pub mod remove;
pub mod restart;
pub mod status;

/// Resolved settings plus the runner every component shares
pub struct App {
    pub settings: Settings,
    executor: Executor,
}

impl App {
    pub fn new(settings: Settings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            settings,
            executor: Executor::new(runner),
        }
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.executor.clone(), self.settings.target.clone())
    }

    pub fn units(&self) -> UnitManager {
        UnitManager::new(self.executor.clone(), &self.settings)
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(
            self.executor.clone(),
            self.settings.target.clone(),
            self.settings.diagnostics.clone(),
        )
    }
}

/// Dispatch action to appropriate handler
pub async fn dispatch(action: Action, app: &App) -> Result<()> {
    tracing::debug!(action = %action, namespace = %app.settings.target.namespace, "Dispatching");

    match action {
        Action::Add => add::execute(app, false).await,
        Action::ForceAdd => add::execute(app, true).await,
        Action::Update => add::update(app).await,
        Action::Remove => remove::execute(app).await,
        Action::Status => status::execute(app).await,
        Action::Restart => restart::execute(app).await,
        Action::Reload => restart::reload(app).await,
        Action::Test => test::reachability(app).await,
        Action::Test2 => test::throughput(app).await,
        Action::Install => install::execute(app).await,
    }
}
