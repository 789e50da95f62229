//! Resolution of the user-supplied public SSH key.
//!
//! The `--key`/`pubkey` value may be the key itself, a URL to fetch it
//! from, or a path to a local key file.

use camino::Utf8PathBuf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PubkeyError {
    #[error("unable to open keyfile {0}")]
    UnreadableKeyfile(Utf8PathBuf),
    #[error("failed to read keyfile {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fetch public key from {url}: {source}")]
    Fetch {
        url: String,
        source: reqwest::Error,
    },
}

/// How a key value will be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A literal public key (`ssh-rsa ...`, `ssh-ed25519 ...`).
    Literal,
    /// A URL to fetch the key from.
    Url,
    /// A path to a file whose first line is the key.
    File(Utf8PathBuf),
}

fn expand_tilde(value: &str) -> String {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    value.to_string()
}

/// Classify a raw key value. URLs are checked before the literal-key
/// prefix since both start matching on plain text; anything that is
/// neither a URL nor starts with `ssh` is treated as a file path with
/// `~` expanded.
pub fn classify(raw: &str) -> KeySource {
    if raw.starts_with("http") {
        KeySource::Url
    } else if raw.starts_with("ssh") {
        KeySource::Literal
    } else {
        KeySource::File(Utf8PathBuf::from(expand_tilde(raw)))
    }
}

fn read_first_line(path: &Utf8PathBuf) -> Result<String, PubkeyError> {
    let file = File::open(path).map_err(|source| PubkeyError::Read {
        path: path.clone(),
        source,
    })?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|source| PubkeyError::Read {
            path: path.clone(),
            source,
        })?;
    Ok(line.trim().to_string())
}

/// Resolve a raw key value to the literal public key text.
pub async fn resolve(raw: &str) -> Result<String, PubkeyError> {
    match classify(raw) {
        KeySource::Literal => Ok(raw.trim().to_string()),
        KeySource::Url => {
            let fetch = async {
                reqwest::get(raw).await?.error_for_status()?.text().await
            };
            let text = fetch.await.map_err(|source| PubkeyError::Fetch {
                url: raw.to_string(),
                source,
            })?;
            Ok(text.trim().to_string())
        }
        KeySource::File(path) => {
            if !path.exists() {
                return Err(PubkeyError::UnreadableKeyfile(path));
            }
            read_first_line(&path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify_literal_keys() {
        assert_eq!(classify("ssh-rsa AAAAB3NzaC1 user@host"), KeySource::Literal);
        assert_eq!(classify("ssh-ed25519 AAAAC3 user@host"), KeySource::Literal);
    }

    #[test]
    fn test_classify_urls() {
        assert_eq!(classify("https://github.com/user.keys"), KeySource::Url);
        assert_eq!(classify("http://example.com/key.pub"), KeySource::Url);
    }

    #[test]
    fn test_classify_expands_tilde() {
        let home = std::env::var("HOME").unwrap();
        assert_eq!(
            classify("~/.ssh/id_rsa.pub"),
            KeySource::File(format!("{home}/.ssh/id_rsa.pub").into())
        );
    }

    #[test]
    fn test_classify_paths() {
        assert_eq!(
            classify("/home/user/.ssh/id_rsa.pub"),
            KeySource::File("/home/user/.ssh/id_rsa.pub".into())
        );
    }

    #[tokio::test]
    async fn test_resolve_file_reads_first_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("id_rsa.pub");
        std::fs::write(&path, "ssh-rsa AAAA first\nsecond line\n").unwrap();

        let key = resolve(path.to_str().unwrap()).await.unwrap();
        assert_eq!(key, "ssh-rsa AAAA first");
    }

    #[tokio::test]
    async fn test_resolve_missing_file_is_unreadable() {
        let err = resolve("/no/such/key.pub").await.unwrap_err();
        assert!(matches!(err, PubkeyError::UnreadableKeyfile(_)));
        assert!(err.to_string().contains("/no/such/key.pub"));
    }

    #[tokio::test]
    async fn test_resolve_literal_trims() {
        let key = resolve("ssh-ed25519 AAAAC3 user@host  ").await.unwrap();
        assert_eq!(key, "ssh-ed25519 AAAAC3 user@host");
    }
}
