//! Merging of input sources into a single [`ClusterInput`].

use crate::{DEFAULT_BRANCH, DEFAULT_SHAPE, DEFAULT_ZONE};
use camino::{Utf8Path, Utf8PathBuf};
use citc_checkpoint::{ClusterInput, InputStore, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "error reading checkpoint file {path}: {source}. Remove {path} to start a fresh run"
    )]
    Checkpoint {
        path: Utf8PathBuf,
        source: StoreError,
    },
    #[error(
        "error reading checkpoint file {path}: missing '{field}'. Remove {path} to start a fresh run"
    )]
    MissingCheckpointField {
        path: Utf8PathBuf,
        field: &'static str,
    },
    #[error("failed to read parameters from json file '{path}': {source}")]
    JsonFile {
        path: Utf8PathBuf,
        source: StoreError,
    },
}

/// Where the gathered input came from; a resumed run's checkpoint input
/// is authoritative and must not be re-prompted or re-saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Checkpoint,
    JsonFile,
    Flags,
}

#[derive(Debug, Clone)]
pub struct GatheredInput {
    pub input: ClusterInput,
    pub source: InputSource,
}

/// Install parameters supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct InstallFlags {
    pub zone: Option<String>,
    pub project: Option<String>,
    pub key: Option<String>,
    pub shape: Option<String>,
    pub branch: Option<String>,
    pub ansible_branch: Option<String>,
}

/// Destroy parameters supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct DestroyFlags {
    pub host: Option<String>,
    pub name: Option<String>,
    pub project: Option<String>,
    pub zone: Option<String>,
}

fn load_json_file(path: &Utf8Path) -> Result<ClusterInput, ConfigError> {
    InputStore::at(path)
        .load()
        .map_err(|source| ConfigError::JsonFile {
            path: path.to_owned(),
            source,
        })
}

/// Gather install input, in priority order: a saved
/// `checkpoint_input.json` in the working directory, then a `--json`
/// file (with defaults filled for zone/shape/branch), then the flags.
///
/// Fields left as `None` are resolved later by environment lookup and
/// interactive prompting.
pub fn gather_install(
    working_dir: &Utf8Path,
    json_file: Option<&Utf8Path>,
    flags: &InstallFlags,
) -> Result<GatheredInput, ConfigError> {
    let store = InputStore::new(working_dir);
    if store.exists() {
        let input = store.load().map_err(|source| ConfigError::Checkpoint {
            path: store.path().to_owned(),
            source,
        })?;

        // A resumed run's input is authoritative; a file that lost a
        // required field cannot be patched up by prompting.
        let required = [
            ("zone", &input.zone),
            ("project", &input.project),
            ("pubkey", &input.pubkey),
            ("shape", &input.shape),
            ("name", &input.name),
        ];
        for (field, value) in required {
            if value.is_none() {
                return Err(ConfigError::MissingCheckpointField {
                    path: store.path().to_owned(),
                    field,
                });
            }
        }

        tracing::info!(path = %store.path(), "resuming from saved checkpoint input");
        return Ok(GatheredInput {
            input,
            source: InputSource::Checkpoint,
        });
    }

    if let Some(path) = json_file {
        let mut input = load_json_file(path)?;
        input.zone.get_or_insert_with(|| DEFAULT_ZONE.to_string());
        input.shape.get_or_insert_with(|| DEFAULT_SHAPE.to_string());
        input
            .branch
            .get_or_insert_with(|| DEFAULT_BRANCH.to_string());
        return Ok(GatheredInput {
            input,
            source: InputSource::JsonFile,
        });
    }

    Ok(GatheredInput {
        input: ClusterInput {
            zone: flags.zone.clone(),
            project: flags.project.clone(),
            pubkey: flags.key.clone(),
            shape: flags.shape.clone(),
            branch: flags.branch.clone(),
            ansible_branch: flags.ansible_branch.clone(),
            ..Default::default()
        },
        source: InputSource::Flags,
    })
}

/// Gather destroy input: flags first, with a `--json` file overriding
/// any field it carries.
pub fn gather_destroy(
    json_file: Option<&Utf8Path>,
    flags: &DestroyFlags,
) -> Result<ClusterInput, ConfigError> {
    let mut input = ClusterInput {
        host: flags.host.clone(),
        name: flags.name.clone(),
        project: flags.project.clone(),
        zone: flags.zone.clone(),
        ..Default::default()
    };

    if let Some(path) = json_file {
        let from_file = load_json_file(path)?;
        if from_file.host.is_some() {
            input.host = from_file.host;
        }
        if from_file.name.is_some() {
            input.name = from_file.name;
        }
        if from_file.project.is_some() {
            input.project = from_file.project;
        }
        if from_file.zone.is_some() {
            input.zone = from_file.zone;
        }
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_json(dir: &Utf8Path, name: &str, body: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_checkpoint_input_wins_over_everything() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_json(
            dir,
            "checkpoint_input.json",
            r#"{"zone":"us-east1-b","project":"saved","pubkey":"ssh-rsa A","shape":"n1-standard-2","name":"liked-skink","branch":"dev"}"#,
        );
        let json = write_json(dir, "params.json", r#"{"project":"from-file"}"#);

        let flags = InstallFlags {
            project: Some("from-flag".to_string()),
            ..Default::default()
        };
        let gathered = gather_install(dir, Some(&json), &flags).unwrap();

        assert_eq!(gathered.source, InputSource::Checkpoint);
        assert_eq!(gathered.input.project.as_deref(), Some("saved"));
        assert_eq!(gathered.input.name.as_deref(), Some("liked-skink"));
    }

    #[test]
    fn test_malformed_checkpoint_tells_user_to_remove_it() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_json(dir, "checkpoint_input.json", "{broken");

        let err = gather_install(dir, None, &InstallFlags::default()).unwrap_err();
        assert!(err.to_string().contains("Remove"));
        assert!(err.to_string().contains("checkpoint_input.json"));
    }

    #[test]
    fn test_checkpoint_missing_required_field_is_fatal() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        write_json(dir, "checkpoint_input.json", r#"{"zone":"europe-west2-c"}"#);

        let err = gather_install(dir, None, &InstallFlags::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCheckpointField {
                field: "project",
                ..
            }
        ));
        assert!(err.to_string().contains("Remove"));
    }

    #[test]
    fn test_json_file_gets_defaults_for_missing_fields() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let json = write_json(dir, "params.json", r#"{"project":"hpc-project"}"#);

        let gathered = gather_install(dir, Some(&json), &InstallFlags::default()).unwrap();

        assert_eq!(gathered.source, InputSource::JsonFile);
        assert_eq!(gathered.input.zone.as_deref(), Some(DEFAULT_ZONE));
        assert_eq!(gathered.input.shape.as_deref(), Some(DEFAULT_SHAPE));
        assert_eq!(gathered.input.branch.as_deref(), Some(DEFAULT_BRANCH));
        assert!(gathered.input.pubkey.is_none());
    }

    #[test]
    fn test_flags_carry_no_defaults() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();

        let flags = InstallFlags {
            key: Some("ssh-rsa AAAA".to_string()),
            ..Default::default()
        };
        let gathered = gather_install(dir, None, &flags).unwrap();

        assert_eq!(gathered.source, InputSource::Flags);
        assert_eq!(gathered.input.pubkey.as_deref(), Some("ssh-rsa AAAA"));
        // left for the prompt to fill with its bracketed default
        assert!(gathered.input.zone.is_none());
    }

    #[test]
    fn test_destroy_json_overrides_flags() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp.path()).unwrap();
        let json = write_json(dir, "destroy.json", r#"{"host":"10.0.0.2"}"#);

        let flags = DestroyFlags {
            host: Some("10.0.0.1".to_string()),
            name: Some("wanted-mullet".to_string()),
            ..Default::default()
        };
        let input = gather_destroy(Some(&json), &flags).unwrap();

        assert_eq!(input.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(input.name.as_deref(), Some("wanted-mullet"));
    }
}
