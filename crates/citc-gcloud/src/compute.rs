//! Compute-side gcloud helpers: scp to the management node and compute
//! image cleanup.

use citc_exec::{CmdLine, ExecError, Runner};

/// Management-node hostname for a cluster, as registered by terraform.
pub fn management_host(cluster_name: &str) -> String {
    format!("mgmt-{cluster_name}")
}

/// Image family holding the cluster's compute-node images.
pub fn image_family(cluster_name: &str) -> String {
    format!("citc-slurm-compute-{cluster_name}")
}

fn scp_download_cmd(zone: &str, remote: &str, local: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["compute", "scp"])
        .arg("--strict-host-key-checking=no")
        .arg("--quiet")
        .arg(format!("--zone={zone}"))
        .arg(remote)
        .arg(local)
}

/// Download a file from the management node with `gcloud compute scp`.
pub async fn scp_download(
    runner: &Runner,
    zone: &str,
    remote: &str,
    local: &str,
) -> Result<(), ExecError> {
    runner.run(&scp_download_cmd(zone, remote, local)).await
}

fn list_images_cmd(family: &str) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["compute", "images", "list"])
        .arg("--format")
        .arg("table[no-heading](name)")
        .arg("--filter")
        .arg(format!("family={family}"))
}

fn parse_image_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// List compute images belonging to a cluster's image family.
///
/// Listing is a read-only probe and runs even under dry-run so the
/// deletion command being echoed names the real images.
pub async fn list_images(runner: &Runner, family: &str) -> Result<Vec<String>, ExecError> {
    let output = runner.probe(&list_images_cmd(family)).await?;
    Ok(parse_image_list(&output))
}

fn delete_images_cmd(names: &[String]) -> CmdLine {
    CmdLine::new("gcloud")
        .args(["compute", "images", "delete", "-q"])
        .args(names.iter().cloned())
}

/// Delete the given compute images. A cluster that never booted a
/// compute node has none; nothing is run then.
pub async fn delete_images(runner: &Runner, names: &[String]) -> Result<(), ExecError> {
    if names.is_empty() {
        tracing::info!("no compute images to delete");
        return Ok(());
    }
    runner.run(&delete_images_cmd(names)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_host() {
        assert_eq!(management_host("wanted-mullet"), "mgmt-wanted-mullet");
    }

    #[test]
    fn test_scp_download_cmd() {
        let cmd = scp_download_cmd(
            "europe-west2-c",
            "provisioner@mgmt-wanted-mullet:terraform.tgz",
            "./terraform.tgz",
        );
        assert_eq!(
            cmd.to_string(),
            "gcloud compute scp --strict-host-key-checking=no --quiet --zone=europe-west2-c provisioner@mgmt-wanted-mullet:terraform.tgz ./terraform.tgz"
        );
    }

    #[test]
    fn test_list_images_cmd_filters_on_family() {
        let cmd = list_images_cmd("citc-slurm-compute-wanted-mullet");
        assert_eq!(
            cmd.to_string(),
            "gcloud compute images list --format table[no-heading](name) --filter family=citc-slurm-compute-wanted-mullet"
        );
    }

    #[test]
    fn test_parse_image_list() {
        let parsed = parse_image_list("image-1\n  image-2  \n\nimage-3\n");
        assert_eq!(parsed, vec!["image-1", "image-2", "image-3"]);
    }

    #[test]
    fn test_delete_images_cmd() {
        let names = vec!["img-a".to_string(), "img-b".to_string()];
        assert_eq!(
            delete_images_cmd(&names).to_string(),
            "gcloud compute images delete -q img-a img-b"
        );
    }
}
