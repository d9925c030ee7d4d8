//! Push event payloads and the capability surface the dispatcher needs

use serde::Deserialize;

use crate::error::{HookError, Result};

/// What the rule table needs to know about an inbound event, independent
/// of any particular provider's JSON shape.
pub trait Payload: Send + Sync {
    /// Repository identifier in canonical `owner/name` form.
    fn repo_name(&self) -> String;

    /// Branch name with any `refs/heads/` prefix stripped.
    fn branch_name(&self) -> String;

    /// `KEY=VALUE` pairs exposed to the triggered command, in a fixed order.
    fn env_data(&self) -> Vec<String>;

    /// The composed path rules are matched against.
    fn path(&self) -> String {
        format!("{}:{}", self.repo_name(), self.branch_name())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubUser {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub owner: Option<GithubUser>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub author: GithubUser,
}

/// A GitHub-style push event. Commit data is optional: a push with an
/// empty commit list still carries enough to match rules against.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubPayload {
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    pub repository: GithubRepo,
    #[serde(default)]
    pub commits: Vec<GithubCommit>,
}

impl GithubPayload {
    /// Decode a payload from raw JSON text.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| HookError::PayloadDecode(e.to_string()))
    }
}

impl Payload for GithubPayload {
    fn repo_name(&self) -> String {
        // Newer push payloads carry a pre-combined full_name; older ones
        // only have the owner/name pair.
        match &self.repository.full_name {
            Some(full_name) if !full_name.is_empty() => full_name.clone(),
            _ => match &self.repository.owner {
                Some(owner) if !owner.name.is_empty() => {
                    format!("{}/{}", owner.name, self.repository.name)
                }
                _ => self.repository.name.clone(),
            },
        }
    }

    fn branch_name(&self) -> String {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
            .to_string()
    }

    fn env_data(&self) -> Vec<String> {
        let mut vars = vec![
            env_pair("REPO", &self.repo_name()),
            env_pair("REPO_URL", &self.repository.url),
            env_pair("PRIVATE", if self.repository.private { "true" } else { "false" }),
            env_pair("BRANCH", &self.branch_name()),
        ];

        if let Some(commit) = self.commits.first() {
            vars.push(env_pair("COMMIT", &commit.id));
            vars.push(env_pair("COMMIT_MESSAGE", &commit.message));
            vars.push(env_pair("COMMIT_TIME", &commit.timestamp));
            vars.push(env_pair("COMMIT_AUTHOR", &commit.author.name));
            vars.push(env_pair("COMMIT_URL", &commit.url));
        }

        vars
    }
}

fn env_pair(key: &str, value: &str) -> String {
    format!("{}={}", key, value)
}
