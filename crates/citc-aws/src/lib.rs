//! AWS CLI credential preflight.
//!
//! Before touching terraform, the aws install flow verifies that working
//! credentials are configured by asking EC2 for a dry-run operation. The
//! CLI reports the interesting outcome through stderr text rather than
//! its exit status: `DryRunOperation` means the credentials would have
//! been accepted.

use citc_exec::{CmdLine, ExecError, Runner};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("AWS credentials have expired")]
    CredentialsExpired,
    #[error("AWS credential check failed: {0}")]
    CredentialCheck(String),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Outcome of the credential check, classified from the CLI's combined
/// output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    Valid,
    Expired,
    Rejected(String),
}

fn describe_images_cmd(profile: Option<&str>, region: Option<&str>) -> CmdLine {
    let mut cmd = CmdLine::new("aws").args(["--dry-run", "ec2", "describe-images"]);
    if let Some(profile) = profile {
        cmd = cmd.arg("--profile").arg(profile);
    }
    if let Some(region) = region {
        cmd = cmd.arg("--region").arg(region);
    }
    cmd
}

/// Classify the combined stdout/stderr of the dry-run describe-images
/// call. `succeeded` covers the (unusual) case of the CLI exiting zero.
pub fn classify_output(succeeded: bool, output: &str) -> CredentialStatus {
    if succeeded || output.contains("DryRunOperation") {
        return CredentialStatus::Valid;
    }
    if output.contains("RequestExpired") {
        return CredentialStatus::Expired;
    }
    CredentialStatus::Rejected(output.trim().to_string())
}

/// Verify AWS credentials, failing with the CLI's own message when they
/// are missing, expired, or rejected.
pub async fn check_credentials(
    runner: &Runner,
    profile: Option<&str>,
    region: Option<&str>,
) -> Result<(), AwsError> {
    let cmd = describe_images_cmd(profile, region);
    let (succeeded, output) = runner.probe_combined(&cmd).await?;

    match classify_output(succeeded, &output) {
        CredentialStatus::Valid => {
            tracing::debug!("AWS credential preflight passed");
            Ok(())
        }
        CredentialStatus::Expired => Err(AwsError::CredentialsExpired),
        CredentialStatus::Rejected(message) => Err(AwsError::CredentialCheck(message)),
    }
}
