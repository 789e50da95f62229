//! `terraform.tfvars` generation.
//!
//! The google flow writes the file from scratch; the aws flow rewrites
//! the `terraform.tfvars.example` shipped in the citc-terraform repo.

use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TfvarsError {
    #[error("terraform.tfvars.example has no admin_public_keys heredoc")]
    MissingAdminKeysBlock,
}

/// Values rendered into the google `terraform.tfvars`.
#[derive(Debug, Clone)]
pub struct GoogleTfvars {
    pub region: String,
    pub zone: String,
    pub project: String,
    pub management_shape: String,
    pub cluster_id: String,
    pub ansible_branch: Option<String>,
}

impl GoogleTfvars {
    /// Render the full tfvars file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("# Google Cloud Platform Information\n");
        let _ = writeln!(out, "region           = \"{}\"", self.region);
        let _ = writeln!(out, "zone             = \"{}\"", self.zone);
        let _ = writeln!(out, "project          = \"{}\"", self.project);
        let _ = writeln!(out, "management_shape = \"{}\"", self.management_shape);
        out.push_str("credentials      = \"citc-terraform-credentials.json\"\n");
        out.push_str("private_key_path = \"~/.ssh/citc-google\"\n");
        out.push_str("public_key_path  = \"~/.ssh/citc-google.pub\"\n");
        if let Some(branch) = &self.ansible_branch {
            let _ = writeln!(out, "ansible_branch   = \"{branch}\"");
        }
        let _ = writeln!(out, "cluster_id       = \"{}\"", self.cluster_id);
        out
    }
}

/// Values spliced into the aws `terraform.tfvars.example`.
#[derive(Debug, Clone, Default)]
pub struct AwsTfvars {
    /// Contents of `citc-key.pub`.
    pub admin_public_key: String,
    pub region: Option<String>,
    pub availability_zone: Option<String>,
    pub profile: Option<String>,
    pub ansible_repo: Option<String>,
    pub ansible_branch: Option<String>,
}

impl AwsTfvars {
    /// Rewrite the example file: point the key path at the generated
    /// `citc-key`, splice the admin public key into the heredoc, and
    /// append the optional overrides.
    pub fn render(&self, example: &str) -> Result<String, TfvarsError> {
        if !example.contains("admin_public_keys = <<EOF") {
            return Err(TfvarsError::MissingAdminKeysBlock);
        }

        let mut config = example.replace("~/.ssh/aws-key", "citc-key");
        config = config.replace(
            "admin_public_keys = <<EOF",
            &format!("admin_public_keys = <<EOF\n{}", self.admin_public_key.trim()),
        );

        if let Some(region) = &self.region {
            config.push_str(&format!("\nregion = \"{region}\""));
        }
        if let Some(az) = &self.availability_zone {
            config.push_str(&format!("\navailability_zone = \"{az}\""));
        }
        if let Some(profile) = &self.profile {
            config.push_str(&format!("\nprofile = \"{profile}\""));
        }
        if let Some(repo) = &self.ansible_repo {
            config.push_str(&format!("\nansible_repo = \"{repo}\""));
        }
        if let Some(branch) = &self.ansible_branch {
            config.push_str(&format!("\nansible_branch = \"{branch}\""));
        }

        Ok(config)
    }
}
