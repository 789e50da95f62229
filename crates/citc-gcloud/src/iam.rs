//! Service-account management.
//!
//! The install flow creates a dedicated service account to run terraform
//! with. Creating it early doubles as a permission check: if the user
//! cannot manage IAM, the run fails here with a meaningful error rather
//! than deep inside `terraform apply`.

use crate::CREDENTIALS_FILE;
use citc_exec::{CmdLine, ExecError, Runner};

const ADMIN_ROLES: [&str; 2] = ["roles/editor", "roles/resourcemanager.projectIamAdmin"];

/// Service-account short name for a cluster, e.g. `citc-admin-wanted-mullet`.
pub fn admin_account_name(cluster_name: &str) -> String {
    format!("citc-admin-{cluster_name}")
}

/// Full service-account email within a project.
pub fn service_account_email(account: &str, project: &str) -> String {
    format!("{account}@{project}.iam.gserviceaccount.com")
}

fn create_account_cmd(account: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["iam", "service-accounts", "create"])
        .arg(account)
        .arg("--display-name")
        .arg(account)
}

fn add_binding_cmd(project: &str, email: &str, role: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["projects", "add-iam-policy-binding"])
        .arg(project)
        .arg("--member")
        .arg(format!("serviceAccount:{email}"))
        .arg("--role")
        .arg(role)
}

fn create_key_cmd(email: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["iam", "service-accounts", "keys", "create"])
        .arg(CREDENTIALS_FILE)
        .arg("--iam-account")
        .arg(email)
}

fn delete_account_cmd(email: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["iam", "service-accounts", "delete", "--quiet"])
        .arg(email)
}

/// Create the admin service account, grant it the roles terraform needs,
/// and write its key to [`CREDENTIALS_FILE`].
pub async fn create_admin_account(
    runner: &Runner,
    project: &str,
    cluster_name: &str,
) -> Result<(), ExecError> {
    let account = admin_account_name(cluster_name);
    let email = service_account_email(&account, project);

    runner.run(&create_account_cmd(&account)).await?;
    for role in ADMIN_ROLES {
        runner.run(&add_binding_cmd(project, &email, role)).await?;
    }
    runner.run(&create_key_cmd(&email)).await
}

/// Delete the admin service account during destroy.
pub async fn delete_service_account(runner: &Runner, email: &str) -> Result<(), ExecError> {
    runner.run(&delete_account_cmd(email)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_account_naming() {
        assert_eq!(admin_account_name("wanted-mullet"), "citc-admin-wanted-mullet");
        assert_eq!(
            service_account_email("citc-admin-wanted-mullet", "hpc-project"),
            "citc-admin-wanted-mullet@hpc-project.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_create_account_cmd() {
        assert_eq!(
            create_account_cmd("citc-admin-wanted-mullet").to_string(),
            "gcloud iam service-accounts create citc-admin-wanted-mullet --display-name citc-admin-wanted-mullet"
        );
    }

    #[test]
    fn test_add_binding_cmd() {
        let cmd = add_binding_cmd(
            "hpc-project",
            "citc-admin-x@hpc-project.iam.gserviceaccount.com",
            "roles/editor",
        );
        assert_eq!(
            cmd.to_string(),
            "gcloud projects add-iam-policy-binding hpc-project --member serviceAccount:citc-admin-x@hpc-project.iam.gserviceaccount.com --role roles/editor"
        );
    }

    #[test]
    fn test_create_key_cmd_targets_credentials_file() {
        let cmd = create_key_cmd("citc-admin-x@p.iam.gserviceaccount.com");
        assert_eq!(
            cmd.to_string(),
            "gcloud iam service-accounts keys create citc-terraform-credentials.json --iam-account citc-admin-x@p.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_delete_account_cmd_is_quiet() {
        let cmd = delete_account_cmd("citc-admin-x@p.iam.gserviceaccount.com");
        assert_eq!(
            cmd.to_string(),
            "gcloud iam service-accounts delete --quiet citc-admin-x@p.iam.gserviceaccount.com"
        );
    }
}
