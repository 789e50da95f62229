//! gcloud configuration and authentication.

use crate::REQUIRED_SERVICES;
use citc_exec::{CmdLine, ExecError, Runner};

pub fn set_project_cmd(project: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["config", "set", "project"])
        .arg(project)
}

/// `gcloud config set project <project>`.
pub async fn set_project(runner: &Runner, project: &str) -> Result<(), ExecError> {
    runner.run(&set_project_cmd(project)).await
}

fn active_account_cmd() -> CmdLine {
    CmdLine::new("gcloud").args([
        "auth",
        "list",
        "--filter=status:ACTIVE",
        "--format=value(account)",
    ])
}

/// The currently authenticated account, if any.
///
/// Always probed for real, even under dry-run: the answer decides
/// whether the login stage appears in the flow at all.
pub async fn active_account(runner: &Runner) -> Result<Option<String>, ExecError> {
    let account = runner.probe(&active_account_cmd()).await?;
    Ok(Some(account).filter(|a| !a.is_empty()))
}

pub fn login_cmd() -> CmdLine {
    CmdLine::new("gcloud").args(["auth", "login"])
}

/// `gcloud auth login` (interactive).
pub async fn login(runner: &Runner) -> Result<(), ExecError> {
    runner.run(&login_cmd()).await
}

fn config_get_cmd(key: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["config", "get-value"])
        .arg(key)
}

/// Read a gcloud config value (`core/project`, `compute/zone`), treating
/// `(unset)` and empty output as absent.
pub async fn config_get(runner: &Runner, key: &str) -> Result<Option<String>, ExecError> {
    let value = runner.probe(&config_get_cmd(key)).await?;
    Ok(Some(value).filter(|v| !v.is_empty() && v != "(unset)"))
}

pub fn enable_services_cmd() -> CmdLine {
    CmdLine::new("gcloud")
        .args(["services", "enable"])
        .args(REQUIRED_SERVICES)
}

/// Enable the APIs the cluster needs.
pub async fn enable_services(runner: &Runner) -> Result<(), ExecError> {
    runner.run(&enable_services_cmd()).await
}
