//! CLI argument parsing for citc.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "citc")]
#[command(about = "Provision and tear down Cluster in the Cloud HPC clusters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new cluster
    Install(InstallArgs),
    /// Destroy an existing cluster
    Destroy(DestroyArgs),
}

/// Cloud service provider to operate against.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Csp {
    Google,
    Aws,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Which cloud provider to install into
    #[arg(value_enum, default_value = "google")]
    pub csp: Csp,

    /// Perform a dry run
    #[arg(long)]
    pub dry_run: bool,

    /// JSON file containing input parameters
    #[arg(long)]
    pub json: Option<Utf8PathBuf>,

    /// Zone in which the cluster will be created (default europe-west2-c)
    #[arg(long)]
    pub zone: Option<String>,

    /// Project in which the cluster will be created
    #[arg(long)]
    pub project: Option<String>,

    /// Your public SSH key (the key itself, a file containing it, or a
    /// URL serving it)
    #[arg(long)]
    pub key: Option<String>,

    /// Shape used for the management node (default n1-standard-1)
    #[arg(long)]
    pub shape: Option<String>,

    /// Branch of citc-terraform to use (default master)
    #[arg(long)]
    pub branch: Option<String>,

    /// Ansible branch to use
    #[arg(long)]
    pub ansible_branch: Option<String>,

    /// AWS region (aws only)
    #[arg(long)]
    pub region: Option<String>,

    /// AWS availability zone (aws only)
    #[arg(long)]
    pub availability_zone: Option<String>,

    /// AWS credentials profile (aws only)
    #[arg(long)]
    pub profile: Option<String>,

    /// CitC Terraform GitHub project repo to use (aws only)
    #[arg(long, default_value = "clusterinthecloud/terraform")]
    pub terraform_repo: String,

    /// CitC Terraform branch to use (aws only)
    #[arg(long, default_value = "tf_0_13_aws")]
    pub terraform_branch: String,

    /// CitC Ansible repo to use (aws only)
    #[arg(long)]
    pub ansible_repo: Option<String>,
}

#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Which cloud provider the cluster runs in
    #[arg(value_enum, default_value = "google")]
    pub csp: Csp,

    /// Perform a dry run
    #[arg(long)]
    pub dry_run: bool,

    /// JSON file containing input parameters
    #[arg(long)]
    pub json: Option<Utf8PathBuf>,

    /// Hostname or IP address of the cluster's login node
    #[arg(long)]
    pub host: Option<String>,

    /// Name of the cluster
    #[arg(long)]
    pub name: Option<String>,

    /// Project the cluster was created in
    #[arg(long)]
    pub project: Option<String>,

    /// Zone the cluster was created in
    #[arg(long)]
    pub zone: Option<String>,

    /// Path of the SSH key from cluster creation (aws only)
    #[arg(long)]
    pub key: Option<Utf8PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_defaults() {
        let cli = Cli::try_parse_from(["citc", "install"]).unwrap();
        let Command::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.csp, Csp::Google);
        assert!(!args.dry_run);
        assert_eq!(args.terraform_repo, "clusterinthecloud/terraform");
    }

    #[test]
    fn test_install_aws_flags() {
        let cli = Cli::try_parse_from([
            "citc",
            "install",
            "aws",
            "--dry-run",
            "--region",
            "eu-west-1",
            "--profile",
            "citc",
        ])
        .unwrap();
        let Command::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(args.csp, Csp::Aws);
        assert!(args.dry_run);
        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        assert_eq!(args.profile.as_deref(), Some("citc"));
    }

    #[test]
    fn test_destroy_flags() {
        let cli = Cli::try_parse_from([
            "citc",
            "destroy",
            "--host",
            "34.89.12.7",
            "--name",
            "wanted-mullet",
        ])
        .unwrap();
        let Command::Destroy(args) = cli.command else {
            panic!("expected destroy");
        };
        assert_eq!(args.host.as_deref(), Some("34.89.12.7"));
        assert_eq!(args.name.as_deref(), Some("wanted-mullet"));
    }
}
