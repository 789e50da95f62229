//! Cluster teardown flows.

use crate::error::FlowError;
use camino::{Utf8Path, Utf8PathBuf};
use citc_checkpoint::{InputStore, StageLog};
use citc_cli::{Csp, DestroyArgs};
use citc_core::{DEFAULT_ZONE, DestroyFlags, config, prompt};
use citc_exec::{CmdLine, ExecError, Runner, ScpOptions, transfer};
use citc_gcloud::{admin_account_name, image_family, management_host, service_account_email};

pub async fn run(args: DestroyArgs) -> Result<(), FlowError> {
    match args.csp {
        Csp::Google => google(args).await,
        Csp::Aws => aws(args).await,
    }
}

fn print_cwd() -> Result<(), FlowError> {
    println!("{}", std::env::current_dir()?.display());
    Ok(())
}

async fn google(args: DestroyArgs) -> Result<(), FlowError> {
    let runner = Runner::new(args.dry_run);

    let flags = DestroyFlags {
        host: args.host.clone(),
        name: args.name.clone(),
        project: args.project.clone(),
        zone: args.zone.clone(),
    };
    let input = config::gather_destroy(args.json.as_deref(), &flags)?;

    let host = match input.host {
        Some(host) => host,
        None => prompt::required("What is the hostname or IP address of the login node? ")?,
    };
    let mut name = match input.name {
        Some(name) => name,
        None => prompt::required("What is the name of the CitC cluster? ")?,
    };
    let mut project = match input.project {
        Some(project) => project,
        None => prompt::required("Which google project was the cluster created in? ")?,
    };
    let zone = match input.zone {
        Some(zone) => zone,
        None => prompt::with_default("What zone was the cluster created in", DEFAULT_ZONE)?,
    };

    println!("\nDestroying the CitC with login node {host}");

    if runner.dry_run() {
        println!("*** DRY RUN ***\n");
    }

    let mut stages = StageLog::new(Utf8PathBuf::from("."));

    if !stages.has_completed("gcloud_set_project")? {
        citc_gcloud::set_project(&runner, &project).await?;
    }

    if !stages.has_completed("gcloud_login")? {
        citc_gcloud::login(&runner).await?;
    }

    if !stages.has_completed("download_terraform")? {
        citc_gcloud::set_project(&runner, &project).await?;
        citc_gcloud::scp_download(
            &runner,
            &zone,
            &format!("provisioner@{}:terraform.tgz", management_host(&name)),
            "./terraform.tgz",
        )
        .await?;
    }

    if !stages.has_completed("untar_files")? {
        runner
            .run(&CmdLine::new("tar").args(["-zxvf", "terraform.tgz"]))
            .await?;
    }

    // The recovered archive carries the input the cluster was actually
    // created with, which trumps whatever was typed just now.
    if runner.dry_run() {
        name = "missing_lemur".to_string();
        project = "my_project".to_string();
    } else {
        let recovered = InputStore::new(Utf8Path::new(".")).load()?;
        name = recovered
            .name
            .ok_or(FlowError::MissingRecoveredField("name"))?;
        project = recovered
            .project
            .ok_or(FlowError::MissingRecoveredField("project"))?;
    }

    println!("Destroying the cluster called {name} in project {project}");

    if !stages.has_completed("gcloud_enable_services")? {
        citc_gcloud::enable_services(&runner).await?;
    }

    if !stages.has_completed("terraform_destroy")? {
        if !runner.dry_run() {
            std::env::set_current_dir("citc-terraform")?;
            print_cwd()?;
        }
        citc_terraform::init(&runner, "google").await?;
        citc_terraform::destroy(&runner, "google").await?;
    }

    if !stages.has_completed("remove_service_account")? {
        let email = service_account_email(&admin_account_name(&name), &project);
        citc_gcloud::delete_service_account(&runner, &email).await?;
    }

    if !stages.has_completed("remove_images")? {
        let images = citc_gcloud::list_images(&runner, &image_family(&name)).await?;
        citc_gcloud::delete_images(&runner, &images).await?;
    }

    stages.finish()?;

    println!("\n\nYour Cluster-in-the-Cloud has now been deleted :-(\n");

    println!("{}", serde_json::json!({"status": "0"}));

    Ok(())
}

/// Top-level directory of a `tar -tzf` listing.
fn archive_root(listing: &str) -> Option<&str> {
    listing
        .lines()
        .next()
        .and_then(|first| first.split('/').next())
        .filter(|name| !name.is_empty())
}

async fn aws(args: DestroyArgs) -> Result<(), FlowError> {
    let runner = Runner::new(false);

    let host = match args.host {
        Some(host) => host,
        None => prompt::required("What is the hostname or IP address of the login node? ")?,
    };
    let key = match args.key {
        Some(key) => key,
        None => prompt::required("Where is the SSH key from cluster creation? ")?.into(),
    };

    if !args.dry_run
        && !prompt::confirm(&format!(
            "Are you sure you want to destroy the cluster at {host}?"
        ))?
    {
        std::process::exit(1);
    }

    let options = ScpOptions {
        identity: Some(key),
        no_strict_host_key_checking: false,
        identities_only: true,
    };

    let archive = "citc-terraform.tar.gz";
    println!("Downloading the Terraform configuration from {host}");
    transfer::scp_download(&runner, &options, &format!("citc@{host}:{archive}"), ".").await?;

    // The archive's top-level directory carries the cluster id in its
    // name and is only knowable from the archive itself.
    let listing = runner
        .probe(&CmdLine::new("tar").args(["-tzf", archive]))
        .await?;
    let dir_name = archive_root(&listing)
        .ok_or(FlowError::EmptyArchive)?
        .to_string();

    runner
        .run(&CmdLine::new("tar").args(["-xzf", archive]))
        .await?;

    if !args.dry_run {
        println!("Connecting to the cluster to destroy lingering compute nodes...");
        let kill = transfer::ssh_run(
            &runner,
            &options,
            &format!("citc@{host}"),
            "/usr/local/bin/kill_all_nodes --force",
        )
        .await;
        match kill {
            Ok(()) => {}
            Err(ExecError::Failed { .. }) => {
                println!(
                    "/usr/local/bin/kill_all_nodes failed to run. You may have lingering \
                     compute nodes. You must kill these manually."
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    std::env::set_current_dir(&dir_name)?;

    runner.run(&citc_terraform::init_chdir_cmd("aws")).await?;

    if !args.dry_run {
        println!("Destroying cluster...");
        match runner
            .run(&citc_terraform::apply_destroy_chdir_cmd("aws"))
            .await
        {
            Ok(()) => {}
            Err(ExecError::Failed { .. }) => {
                println!("Terraform destroy failed. Try again with:");
                println!("  cd {dir_name}");
                println!("  terraform -chdir=aws apply -destroy");
                println!(
                    "You may need to manually clean up any remaining running instances or \
                     DNS entries"
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_root_takes_first_component() {
        let listing = "citc-terraform-easy-prawn/\n\
                       citc-terraform-easy-prawn/terraform.tfstate\n\
                       citc-terraform-easy-prawn/aws/main.tf\n";
        assert_eq!(archive_root(listing), Some("citc-terraform-easy-prawn"));
    }

    #[test]
    fn test_archive_root_of_empty_listing() {
        assert_eq!(archive_root(""), None);
        assert_eq!(archive_root("\n"), None);
    }
}
