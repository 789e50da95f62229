//! `gcloud` invocations used by the google install and destroy flows.
//!
//! Each wrapper exposes its command construction separately from its
//! execution so the exact argv can be asserted in tests without a
//! gcloud binary present.

pub mod auth;
pub mod compute;
pub mod iam;

pub use auth::{active_account, config_get, enable_services, login, set_project};
pub use compute::{delete_images, image_family, list_images, management_host, scp_download};
pub use iam::{admin_account_name, create_admin_account, delete_service_account, service_account_email};

/// File the service-account key is written to; referenced from the
/// generated `terraform.tfvars`.
pub const CREDENTIALS_FILE: &str = "citc-terraform-credentials.json";

/// Services that must be enabled on the project before terraform can
/// create the cluster.
pub const REQUIRED_SERVICES: [&str; 4] = [
    "compute.googleapis.com",
    "iam.googleapis.com",
    "cloudresourcemanager.googleapis.com",
    "file.googleapis.com",
];
