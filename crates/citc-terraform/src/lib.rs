//! `terraform` invocations and `terraform.tfvars` generation.

pub mod tfvars;

pub use tfvars::{AwsTfvars, GoogleTfvars, TfvarsError};

use citc_exec::{CmdLine, ExecError, Runner};

/// State file queried for outputs after apply.
pub const STATE_FILE: &str = "terraform.tfstate";

pub fn init_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform").arg("init").arg(provider_dir)
}

pub fn validate_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform").arg("validate").arg(provider_dir)
}

pub fn plan_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform").arg("plan").arg(provider_dir)
}

pub fn apply_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform")
        .args(["apply", "-auto-approve"])
        .arg(provider_dir)
}

pub fn destroy_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform")
        .args(["destroy", "-auto-approve"])
        .arg(provider_dir)
}

/// `-chdir` form used when operating inside a recovered tree whose
/// provider directory is the terraform root.
pub fn init_chdir_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform")
        .arg(format!("-chdir={provider_dir}"))
        .arg("init")
}

pub fn apply_destroy_chdir_cmd(provider_dir: &str) -> CmdLine {
    CmdLine::new("terraform")
        .arg(format!("-chdir={provider_dir}"))
        .args(["apply", "-destroy", "-auto-approve"])
}

pub fn output_cmd(name: &str) -> CmdLine {
    CmdLine::new("terraform")
        .args(["output", "-no-color"])
        .arg(format!("-state={STATE_FILE}"))
        .arg(name)
}

/// Read a single terraform output value, stripping the quoting newer
/// terraform versions put around string outputs.
pub async fn output(runner: &Runner, name: &str) -> Result<String, ExecError> {
    let raw = runner.capture(&output_cmd(name)).await?;
    Ok(raw.trim_matches('"').to_string())
}

pub async fn init(runner: &Runner, provider_dir: &str) -> Result<(), ExecError> {
    runner.run(&init_cmd(provider_dir)).await
}

pub async fn validate(runner: &Runner, provider_dir: &str) -> Result<(), ExecError> {
    runner.run(&validate_cmd(provider_dir)).await
}

pub async fn plan(runner: &Runner, provider_dir: &str) -> Result<(), ExecError> {
    runner.run(&plan_cmd(provider_dir)).await
}

pub async fn apply(runner: &Runner, provider_dir: &str) -> Result<(), ExecError> {
    runner.run(&apply_cmd(provider_dir)).await
}

pub async fn destroy(runner: &Runner, provider_dir: &str) -> Result<(), ExecError> {
    runner.run(&destroy_cmd(provider_dir)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_commands() {
        assert_eq!(init_cmd("google").to_string(), "terraform init google");
        assert_eq!(validate_cmd("google").to_string(), "terraform validate google");
        assert_eq!(plan_cmd("google").to_string(), "terraform plan google");
        assert_eq!(
            apply_cmd("google").to_string(),
            "terraform apply -auto-approve google"
        );
        assert_eq!(
            destroy_cmd("google").to_string(),
            "terraform destroy -auto-approve google"
        );
    }

    #[test]
    fn test_chdir_commands() {
        assert_eq!(init_chdir_cmd("aws").to_string(), "terraform -chdir=aws init");
        assert_eq!(
            apply_destroy_chdir_cmd("aws").to_string(),
            "terraform -chdir=aws apply -destroy -auto-approve"
        );
    }

    #[test]
    fn test_output_cmd() {
        assert_eq!(
            output_cmd("ManagementPublicIP").to_string(),
            "terraform output -no-color -state=terraform.tfstate ManagementPublicIP"
        );
    }
}
