use serde::{Deserialize, Serialize};

/// Flat input-parameter schema shared by `checkpoint_input.json` and
/// user-supplied `--json` files.
///
/// Install runs use `zone`/`project`/`pubkey`/`shape`/`name`/`branch`
/// (plus `ansible_branch`); destroy runs additionally accept `host`.
/// Everything is optional here — which fields must end up populated is
/// decided by the flow after prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// User's public SSH key (already resolved to the literal key text
    /// when written back to `checkpoint_input.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,

    /// Machine shape for the management/login node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,

    /// Cluster name (generated as a petname when absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// citc-terraform branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_branch: Option<String>,

    /// Hostname or IP of the management node (destroy runs).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_skips_absent_fields() {
        let input = ClusterInput {
            zone: Some("europe-west2-c".to_string()),
            project: Some("my-project".to_string()),
            pubkey: Some("ssh-rsa AAAA user@example".to_string()),
            shape: Some("n1-standard-1".to_string()),
            name: Some("wanted-mullet".to_string()),
            branch: Some("master".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&input).unwrap();
        assert!(!json.contains("ansible_branch"));
        assert!(!json.contains("host"));

        let back: ClusterInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_partial_destroy_input_parses() {
        let json = r#"{"host": "34.89.12.7", "name": "wanted-mullet"}"#;
        let input: ClusterInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.host.as_deref(), Some("34.89.12.7"));
        assert_eq!(input.name.as_deref(), Some("wanted-mullet"));
        assert!(input.project.is_none());
    }
}
