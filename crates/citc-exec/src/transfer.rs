//! scp/ssh transfer helpers for reaching the management node.

use crate::command::{CmdLine, ExecError, Runner};
use camino::Utf8PathBuf;
use std::time::Duration;

/// Options applied to every `scp`/`ssh` invocation.
#[derive(Debug, Clone, Default)]
pub struct ScpOptions {
    /// Identity file passed as `-i`.
    pub identity: Option<Utf8PathBuf>,
    /// Pass `-o StrictHostKeyChecking=no` (first contact with a freshly
    /// provisioned node).
    pub no_strict_host_key_checking: bool,
    /// Pass `-o IdentitiesOnly=yes`.
    pub identities_only: bool,
}

impl ScpOptions {
    fn apply(&self, mut cmd: CmdLine) -> CmdLine {
        if self.no_strict_host_key_checking {
            cmd = cmd.args(["-o", "StrictHostKeyChecking=no"]);
        }
        if self.identities_only {
            cmd = cmd.args(["-o", "IdentitiesOnly=yes"]);
        }
        if let Some(identity) = &self.identity {
            cmd = cmd.arg("-i").arg(identity.as_str());
        }
        cmd
    }
}

/// Build the scp command for uploading a local file to `user@host:dest`.
pub fn scp_upload_cmd(options: &ScpOptions, local: &str, remote: &str) -> CmdLine {
    options.apply(CmdLine::new("scp")).arg(local).arg(remote)
}

/// Build the scp command for downloading a remote file.
pub fn scp_download_cmd(options: &ScpOptions, remote: &str, local: &str) -> CmdLine {
    options.apply(CmdLine::new("scp")).arg(remote).arg(local)
}

/// Build the ssh command for running `remote_command` on `user@host`.
pub fn ssh_cmd(options: &ScpOptions, host: &str, remote_command: &str) -> CmdLine {
    options
        .apply(CmdLine::new("ssh"))
        .arg(host)
        .arg(remote_command)
}

/// Upload a local file over scp.
pub async fn scp_upload(
    runner: &Runner,
    options: &ScpOptions,
    local: &str,
    remote: &str,
) -> Result<(), ExecError> {
    runner.run(&scp_upload_cmd(options, local, remote)).await
}

/// Download a remote file over scp.
pub async fn scp_download(
    runner: &Runner,
    options: &ScpOptions,
    remote: &str,
    local: &str,
) -> Result<(), ExecError> {
    runner.run(&scp_download_cmd(options, remote, local)).await
}

/// Run a command on the remote host over ssh.
pub async fn ssh_run(
    runner: &Runner,
    options: &ScpOptions,
    host: &str,
    remote_command: &str,
) -> Result<(), ExecError> {
    runner.run(&ssh_cmd(options, host, remote_command)).await
}

/// Interval between upload attempts while the management node finishes
/// booting its sshd.
pub const UPLOAD_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Upload a file over scp, retrying until it succeeds.
///
/// The management node may not accept connections for a while after
/// `terraform apply` returns, so the state upload polls every ten seconds
/// until scp exits zero. Spawn failures (scp itself missing) are still
/// fatal. Under dry-run the command is echoed once.
pub async fn scp_upload_with_retry(
    runner: &Runner,
    options: &ScpOptions,
    local: &str,
    remote: &str,
) -> Result<(), ExecError> {
    let cmd = scp_upload_cmd(options, local, remote);

    if runner.dry_run() {
        return runner.run(&cmd).await;
    }

    loop {
        match runner.run(&cmd).await {
            Ok(()) => return Ok(()),
            Err(err @ ExecError::Spawn { .. }) => return Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "upload attempt failed");
                println!("Trying to upload Terraform state...");
                tokio::time::sleep(UPLOAD_RETRY_INTERVAL).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn google_options() -> ScpOptions {
        ScpOptions {
            identity: Some("~/.ssh/citc-google".into()),
            no_strict_host_key_checking: true,
            identities_only: false,
        }
    }

    #[test]
    fn test_scp_upload_cmd() {
        let cmd = scp_upload_cmd(
            &google_options(),
            "citc-admin.pub",
            "provisioner@34.89.12.7:",
        );
        assert_eq!(
            cmd.to_string(),
            "scp -o StrictHostKeyChecking=no -i ~/.ssh/citc-google citc-admin.pub provisioner@34.89.12.7:"
        );
    }

    #[test]
    fn test_scp_download_cmd_identities_only() {
        let options = ScpOptions {
            identity: Some("citc-terraform-prawn/citc-key".into()),
            no_strict_host_key_checking: false,
            identities_only: true,
        };
        let cmd = scp_download_cmd(&options, "citc@1.2.3.4:citc-terraform.tar.gz", ".");
        assert_eq!(
            cmd.to_string(),
            "scp -o IdentitiesOnly=yes -i citc-terraform-prawn/citc-key citc@1.2.3.4:citc-terraform.tar.gz ."
        );
    }

    #[test]
    fn test_ssh_cmd_quotes_remote_command() {
        let options = ScpOptions {
            identity: Some("citc-key".into()),
            no_strict_host_key_checking: false,
            identities_only: true,
        };
        let cmd = ssh_cmd(&options, "citc@1.2.3.4", "/usr/local/bin/kill_all_nodes --force");
        assert_eq!(
            cmd.to_string(),
            "ssh -o IdentitiesOnly=yes -i citc-key citc@1.2.3.4 \"/usr/local/bin/kill_all_nodes --force\""
        );
    }

    #[tokio::test]
    async fn test_retry_upload_dry_run_is_single_echo() {
        let runner = Runner::new(true);
        scp_upload_with_retry(&runner, &google_options(), "terraform.tgz", "provisioner@ip:")
            .await
            .unwrap();
    }
}
