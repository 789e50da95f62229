//! Error type shared by the install and destroy flows.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Exec(#[from] citc_exec::ExecError),

    #[error(transparent)]
    Checkpoint(#[from] citc_checkpoint::CheckpointError),

    #[error(transparent)]
    Store(#[from] citc_checkpoint::StoreError),

    #[error(transparent)]
    Config(#[from] citc_core::ConfigError),

    #[error(transparent)]
    Pubkey(#[from] citc_core::PubkeyError),

    #[error(transparent)]
    Aws(#[from] citc_aws::AwsError),

    #[error(transparent)]
    Tfvars(#[from] citc_terraform::TfvarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HOME is not set; cannot place the provisioning SSH key")]
    MissingHome,

    #[error("recovered checkpoint_input.json is missing '{0}'")]
    MissingRecoveredField(&'static str),

    #[error("downloaded Terraform archive is empty")]
    EmptyArchive,
}
