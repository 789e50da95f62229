//! External command execution for citc.
//!
//! Everything citc does is done by driving external tools (`git`,
//! `terraform`, `gcloud`, `aws`, `scp`, `ssh`). This crate provides the
//! command-line builder, the dry-run-aware runner, and the scp/ssh
//! transfer helpers shared by the install and destroy flows.

pub mod command;
pub mod transfer;

pub use command::{CmdLine, ExecError, Runner};
pub use transfer::{ScpOptions, scp_download, scp_upload, scp_upload_with_retry, ssh_run};
