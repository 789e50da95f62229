//! Cluster creation flows.

use crate::error::FlowError;
use camino::{Utf8Path, Utf8PathBuf};
use citc_checkpoint::{ClusterInput, InputStore, StageLog, store::INPUT_FILE_NAME};
use citc_cli::{Csp, InstallArgs};
use citc_core::{
    DEFAULT_BRANCH, DEFAULT_SHAPE, DEFAULT_ZONE, InstallFlags, config, generate_cluster_name,
    prompt, pubkey, region_from_zone,
};
use citc_exec::{CmdLine, Runner, ScpOptions, transfer};
use citc_terraform::{AwsTfvars, GoogleTfvars};

/// Upstream Terraform configuration used by the google flow.
const CITC_TERRAFORM_URL: &str = "https://github.com/ACRC/citc-terraform.git";

pub async fn run(args: InstallArgs) -> Result<(), FlowError> {
    match args.csp {
        Csp::Google => google(args).await,
        Csp::Aws => aws(args).await,
    }
}

fn print_cwd() -> Result<(), FlowError> {
    println!("{}", std::env::current_dir()?.display());
    Ok(())
}

fn home_dir() -> Result<String, FlowError> {
    std::env::var("HOME").map_err(|_| FlowError::MissingHome)
}

/// Resolved install parameters for the google flow.
struct GoogleParams {
    project: String,
    zone: String,
    shape: String,
    pubkey: String,
    branch: String,
    ansible_branch: Option<String>,
    name: String,
}

/// Fill every install parameter, in order: saved checkpoint input or
/// `--json` file or flags, then the gcloud environment, then prompts.
async fn resolve_google_params(
    runner: &Runner,
    args: &InstallArgs,
    working_dir: &Utf8Path,
) -> Result<GoogleParams, FlowError> {
    let flags = InstallFlags {
        zone: args.zone.clone(),
        project: args.project.clone(),
        key: args.key.clone(),
        shape: args.shape.clone(),
        branch: args.branch.clone(),
        ansible_branch: args.ansible_branch.clone(),
    };
    let gathered = config::gather_install(working_dir, args.json.as_deref(), &flags)?;
    let mut input = gathered.input;

    // An active Cloud Shell-style environment knows better than any of
    // the above which project and zone the user is working in.
    if std::env::var_os("CLOUDSDK_CONFIG").is_some() {
        input.project = citc_gcloud::config_get(runner, "core/project").await?;
        input.zone = citc_gcloud::config_get(runner, "compute/zone").await?;
    }

    let project = match input.project {
        Some(project) => project,
        None => prompt::required("Which google project should the cluster be created in? ")?,
    };
    let zone = match input.zone {
        Some(zone) => zone,
        None => prompt::with_default("Which zone should the cluster run in", DEFAULT_ZONE)?,
    };
    let shape = match input.shape {
        Some(shape) => shape,
        None => prompt::with_default("What shape should be used for the login node", DEFAULT_SHAPE)?,
    };
    let raw_key = match input.pubkey {
        Some(key) => key,
        None => prompt::required("Please copy here your public SSH key: ")?,
    };
    let branch = match input.branch {
        Some(branch) => branch,
        None => prompt::with_default("Which branch should be used of CitC", DEFAULT_BRANCH)?,
    };

    let resolved_key = pubkey::resolve(&raw_key).await?;
    let name = input.name.unwrap_or_else(generate_cluster_name);

    Ok(GoogleParams {
        project,
        zone,
        shape,
        pubkey: resolved_key,
        branch,
        ansible_branch: input.ansible_branch,
        name,
    })
}

async fn google(args: InstallArgs) -> Result<(), FlowError> {
    let runner = Runner::new(args.dry_run);
    let working_dir = Utf8PathBuf::from(".");

    let params = resolve_google_params(&runner, &args, &working_dir).await?;

    // Persist the resolved input so a resumed run replays identically.
    InputStore::new(&working_dir).save_if_absent(&ClusterInput {
        zone: Some(params.zone.clone()),
        project: Some(params.project.clone()),
        pubkey: Some(params.pubkey.clone()),
        shape: Some(params.shape.clone()),
        name: Some(params.name.clone()),
        branch: Some(params.branch.clone()),
        ansible_branch: params.ansible_branch.clone(),
        host: None,
    })?;

    let region = region_from_zone(&params.zone);

    println!();
    println!("Creating a Cluster-in-the-Cloud called {}", params.name);
    println!("This will be created in the project {}", params.project);
    println!("The cluster will be created in the region {region}");
    println!("The cluster will be created in the zone {}", params.zone);
    println!("The login node will be of shape {}", params.shape);
    println!();

    if runner.dry_run() {
        println!("*** DRY RUN ***\n");
    }

    let mut stages = StageLog::new(Utf8PathBuf::from("."));

    // Fetch or refresh the Terraform configuration.
    let repo_dir = Utf8Path::new("citc-terraform");
    if repo_dir.exists() {
        if !runner.dry_run() {
            std::env::set_current_dir(repo_dir)?;
            print_cwd()?;
        }
        runner.run(&CmdLine::new("git").arg("pull")).await?;
    } else {
        runner
            .run(
                &CmdLine::new("git")
                    .args(["clone", "--branch"])
                    .arg(&params.branch)
                    .arg(CITC_TERRAFORM_URL),
            )
            .await?;
        if !runner.dry_run() {
            std::env::set_current_dir(repo_dir)?;
            print_cwd()?;
        }
    }

    if !stages.has_completed("gcloud_set_project")? {
        citc_gcloud::set_project(&runner, &params.project).await?;
    }

    if citc_gcloud::active_account(&runner).await?.is_none()
        && !stages.has_completed("gcloud_login")?
    {
        citc_gcloud::login(&runner).await?;
    }

    if !stages.has_completed("gcloud_enable_services")? {
        citc_gcloud::enable_services(&runner).await?;
    }

    if !stages.has_completed("gcloud_add_account")? {
        citc_gcloud::create_admin_account(&runner, &params.project, &params.name).await?;
    }

    let key_path = format!("{}/.ssh/citc-google", home_dir()?);
    if !stages.has_completed("generate_keys")? {
        runner
            .run(
                &CmdLine::new("ssh-keygen")
                    .args(["-t", "rsa", "-f"])
                    .arg(&key_path)
                    .args(["-C", "provisioner", "-N", ""]),
            )
            .await?;
    }

    if !stages.has_completed("init_terraform")? {
        citc_terraform::init(&runner, "google").await?;
    }

    if !stages.has_completed("create_tfvars")? {
        let tfvars = GoogleTfvars {
            region: region.clone(),
            zone: params.zone.clone(),
            project: params.project.clone(),
            management_shape: params.shape.clone(),
            cluster_id: params.name.clone(),
            ansible_branch: params.ansible_branch.clone(),
        }
        .render();

        if runner.dry_run() {
            println!("\n===Creating the terraform.tfvars===");
            print!("{tfvars}");
            println!();
        } else {
            std::fs::write("terraform.tfvars", &tfvars)?;
        }
    }

    if !stages.has_completed("terraform_validate")? {
        citc_terraform::validate(&runner, "google").await?;
    }

    if !stages.has_completed("terraform_plan")? {
        citc_terraform::plan(&runner, "google").await?;
    }

    if !stages.has_completed("terraform_apply")? {
        citc_terraform::apply(&runner, "google").await?;
    }

    let cluster_ip = if runner.dry_run() {
        println!(
            "[DRY-RUN] {}",
            citc_terraform::output_cmd("ManagementPublicIP")
        );
        "192.168.0.1".to_string()
    } else {
        citc_terraform::output(&runner, "ManagementPublicIP").await?
    };

    if !stages.has_completed("save_pubkey")? {
        if runner.dry_run() {
            println!("\n===Creating citc-admin.pub===");
            println!("{}", params.pubkey);
            println!();
        } else {
            std::fs::write("citc-admin.pub", format!("{}\n", params.pubkey))?;
        }
    }

    let scp_options = ScpOptions {
        identity: Some(key_path.clone().into()),
        no_strict_host_key_checking: true,
        identities_only: false,
    };

    if !stages.has_completed("upload_pubkey")? {
        transfer::scp_upload(
            &runner,
            &scp_options,
            "citc-admin.pub",
            &format!("provisioner@{cluster_ip}:"),
        )
        .await?;
    }

    if !stages.has_completed("upload_terraform_files")? {
        if !runner.dry_run() {
            std::env::set_current_dir("..")?;
            print_cwd()?;
        }
        runner
            .run(
                &CmdLine::new("tar")
                    .args(["-zcvf", "terraform.tgz", ".ssh", "citc-terraform"])
                    .arg(INPUT_FILE_NAME),
            )
            .await?;
        transfer::scp_upload_with_retry(
            &runner,
            &scp_options,
            "terraform.tgz",
            &format!("provisioner@{cluster_ip}:"),
        )
        .await?;
    }

    println!("\n\nYour Cluster-in-the-Cloud has now been created :-)");
    println!("Proceed to the next stage. Connect to the cluster");
    println!("by running 'ssh citc@{cluster_ip}'\n");

    stages.finish()?;

    println!("{}", status_report(&cluster_ip));

    Ok(())
}

/// Machine-readable status line printed at the end of the google flow.
fn status_report(cluster_ip: &str) -> String {
    serde_json::json!({"status": "0", "cluster_ip": cluster_ip}).to_string()
}

async fn aws(args: InstallArgs) -> Result<(), FlowError> {
    // Only `terraform apply` and the state upload are gated on dry-run;
    // fetching the configuration and rendering tfvars always happen so a
    // dry run can be inspected.
    let real = Runner::new(false);
    let gated = Runner::new(args.dry_run);

    println!("Installing Cluster in the Cloud on AWS");

    citc_aws::check_credentials(&real, args.profile.as_deref(), args.region.as_deref()).await?;

    println!("Downloading CitC Terraform configuration");
    let repo_url = format!("https://github.com/{}.git", args.terraform_repo);
    real.run(
        &CmdLine::new("git")
            .args(["clone", "--branch"])
            .arg(&args.terraform_branch)
            .arg(&repo_url)
            .arg("citc-terraform"),
    )
    .await?;
    std::env::set_current_dir("citc-terraform")?;

    // Key for admin and provisioning
    if !Utf8Path::new("citc-key").exists() {
        real.run(
            &CmdLine::new("ssh-keygen")
                .args(["-t", "rsa", "-f", "citc-key", "-N", ""]),
        )
        .await?;
    }

    citc_terraform::init(&real, "aws").await?;
    citc_terraform::validate(&real, "aws").await?;

    let example = std::fs::read_to_string("aws/terraform.tfvars.example")?;
    let tfvars = AwsTfvars {
        admin_public_key: std::fs::read_to_string("citc-key.pub")?,
        region: args.region.clone(),
        availability_zone: args.availability_zone.clone(),
        profile: args.profile.clone(),
        ansible_repo: args.ansible_repo.clone(),
        ansible_branch: args.ansible_branch.clone(),
    }
    .render(&example)?;
    std::fs::write("terraform.tfvars", &tfvars)?;

    citc_terraform::apply(&gated, "aws").await?;

    let (cluster_ip, cluster_id) = if args.dry_run {
        ("192.168.0.1".to_string(), "dry-run".to_string())
    } else {
        (
            citc_terraform::output(&real, "ManagementPublicIP").await?,
            citc_terraform::output(&real, "cluster_id").await?,
        )
    };

    std::env::set_current_dir("..")?;
    let dir_name = format!("citc-terraform-{cluster_id}");
    let key_path = format!("{dir_name}/citc-key");

    if !args.dry_run {
        std::fs::rename("citc-terraform", &dir_name)?;
        // The plugin cache is large and useless on the management node.
        std::fs::remove_dir_all(Utf8Path::new(&dir_name).join(".terraform"))?;
    }

    let archive = "citc-terraform.tgz";
    gated
        .run(
            &CmdLine::new("tar")
                .args(["-zcf", archive])
                .arg(&dir_name),
        )
        .await?;

    let scp_options = ScpOptions {
        identity: Some(key_path.clone().into()),
        no_strict_host_key_checking: true,
        identities_only: true,
    };
    transfer::scp_upload_with_retry(
        &gated,
        &scp_options,
        archive,
        &format!("citc@{cluster_ip}:"),
    )
    .await?;

    if !args.dry_run {
        std::fs::remove_file(archive)?;
    }

    println!();
    println!("{}", "#".repeat(80));
    println!();
    println!("The file '{key_path}' will allow you to log into the new cluster");
    println!("Make sure you save this key as it is needed to destroy the cluster later.");
    println!("The IP address of the cluster is {cluster_ip}");
    println!("Connect with:");
    println!("  ssh -i {key_path} citc@{cluster_ip}");

    Ok(())
}
