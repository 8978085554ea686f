//! core::app::schema
//!
//! App configuration document types.
//!
//! # Document Format
//!
//! ```yaml
//! AppInfo:
//!   Name: api
//!   RepoUrl: https://github.com/org/api-deploy
//! EnvGraph:
//!   - Name: dev
//!     SrcPath: envs/dev.yaml
//!   - Name: prod
//!     SrcPath: envs/prod.yaml
//! ```
//!
//! camelCase keys (`appInfo`, `repoUrl`, `envGraph`, `srcPath`) are accepted
//! as aliases.

use serde::{Deserialize, Serialize};

use crate::core::types::EnvName;

/// Identity of an application and the repository backing its environments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppInfo {
    /// Application name
    #[serde(alias = "name")]
    pub name: String,

    /// URL of the version-controlled repository holding environment records
    #[serde(alias = "repoUrl", alias = "repo_url")]
    pub repo_url: String,
}

/// One environment in an app's environment graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvironmentRecord {
    /// Human-facing environment identifier (e.g. "staging")
    #[serde(alias = "name")]
    pub name: EnvName,

    /// Path, inside the backing repository, of the document holding the tag
    #[serde(alias = "srcPath", alias = "src_path")]
    pub src_path: String,
}

/// A loaded application configuration.
///
/// Constructed fresh for every command invocation and never written back;
/// mutations go to the backing repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LodestarAppConfig {
    /// Application identity
    #[serde(alias = "appInfo", alias = "app_info")]
    pub app_info: AppInfo,

    /// Ordered environment graph
    #[serde(default, alias = "envGraph", alias = "env_graph")]
    pub env_graph: Vec<EnvironmentRecord>,
}

impl LodestarAppConfig {
    /// Names of all environments, in graph order.
    pub fn env_names(&self) -> Vec<&str> {
        self.env_graph.iter().map(|e| e.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pascal_case() {
        let config: LodestarAppConfig = serde_yaml_ng::from_str(
            r#"
AppInfo:
  Name: api
  RepoUrl: https://example/api
EnvGraph:
  - Name: dev
    SrcPath: envs/dev.yaml
  - Name: prod
    SrcPath: envs/prod.yaml
"#,
        )
        .unwrap();

        assert_eq!(config.app_info.name, "api");
        assert_eq!(config.app_info.repo_url, "https://example/api");
        assert_eq!(config.env_names(), vec!["dev", "prod"]);
        assert_eq!(config.env_graph[1].src_path, "envs/prod.yaml");
    }

    #[test]
    fn parse_camel_case_aliases() {
        let config: LodestarAppConfig = serde_yaml_ng::from_str(
            r#"
appInfo:
  name: api
  repoUrl: https://example/api
envGraph:
  - name: dev
    srcPath: envs/dev.yaml
"#,
        )
        .unwrap();

        assert_eq!(config.env_graph.len(), 1);
        assert_eq!(config.env_graph[0].name, "dev");
    }

    #[test]
    fn missing_env_graph_is_empty() {
        let config: LodestarAppConfig =
            serde_yaml_ng::from_str("AppInfo: {Name: api, RepoUrl: https://example/api}\n")
                .unwrap();
        assert!(config.env_graph.is_empty());
    }

    #[test]
    fn json_is_accepted() {
        let config: LodestarAppConfig = serde_yaml_ng::from_str(
            r#"{"AppInfo":{"Name":"api","RepoUrl":"https://example/api"},"EnvGraph":[{"Name":"dev","SrcPath":"envs/dev.yaml"}]}"#,
        )
        .unwrap();
        assert_eq!(config.env_names(), vec!["dev"]);
    }

    #[test]
    fn blank_env_name_rejected() {
        let result: Result<LodestarAppConfig, _> = serde_yaml_ng::from_str(
            r#"
AppInfo: {Name: api, RepoUrl: https://example/api}
EnvGraph:
  - Name: ""
    SrcPath: envs/dev.yaml
"#,
        );
        assert!(result.is_err());
    }
}
