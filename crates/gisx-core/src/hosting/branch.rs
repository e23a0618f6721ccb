//! Default-branch resolution via hosting service APIs.
//!
//! GitHub, GitLab and Bitbucket expose the default branch through their
//! REST APIs. Lookups degrade to a literal `"main"` on any failure (rate
//! limits, unknown hosts, malformed responses); this is the only place
//! in the system where an error is deliberately swallowed.

use serde_json::Value;
use tracing::debug;
use url::Url;

/// Resolves the default branch for a repository URL.
pub trait DefaultBranch {
    /// Return the default branch name, falling back to `"main"`.
    fn default_branch(&self, repo_url: &str) -> String;
}

/// API-backed lookup using blocking HTTP.
#[derive(Debug)]
pub struct HttpBranchLookup {
    client: reqwest::blocking::Client,
}

impl HttpBranchLookup {
    /// Create a lookup with the given user agent.
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn try_default_branch(&self, repo_url: &str) -> Option<String> {
        // Inputs may arrive without a scheme ("github.com/org/repo").
        let with_scheme = if repo_url.contains("://") {
            repo_url.to_string()
        } else {
            format!("https://{}", repo_url)
        };
        let parsed = Url::parse(&with_scheme).ok()?;
        let host = parsed.host_str()?;
        let mut segments = parsed.path_segments()?;
        let organization = segments.next()?;
        let repository = segments.next()?;

        let api_url = match host {
            "github.com" => format!(
                "https://api.github.com/repos/{}/{}",
                organization, repository
            ),
            "gitlab.com" => format!(
                "https://gitlab.com/api/v4/projects/{}%2F{}",
                organization, repository
            ),
            "bitbucket.org" => format!(
                "https://api.bitbucket.org/2.0/repositories/{}/{}/branching-model?",
                organization, repository
            ),
            _ => return None,
        };

        let content: Value = self
            .client
            .get(&api_url)
            .send()
            .ok()?
            .error_for_status()
            .ok()?
            .json()
            .ok()?;

        // GitHub and GitLab answer with default_branch, Bitbucket nests
        // the name under the branching model.
        content
            .get("default_branch")
            .and_then(Value::as_str)
            .or_else(|| {
                content
                    .get("development")
                    .and_then(|d| d.get("name"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
    }
}

impl DefaultBranch for HttpBranchLookup {
    fn default_branch(&self, repo_url: &str) -> String {
        match self.try_default_branch(repo_url) {
            Some(branch) => branch,
            None => {
                debug!(repo_url, "default branch lookup failed, assuming 'main'");
                "main".to_string()
            }
        }
    }
}

/// Pick the version branch for an official-layout repository.
///
/// Prefers `gisx{major}`; falls back to the previous major version's
/// branch when only that exists. Returns `None` when the repository
/// carries neither, leaving the choice to its default branch.
pub fn version_branch(
    major_version: u32,
    has_branch: impl Fn(&str) -> bool,
) -> Option<String> {
    let current = format!("gisx{}", major_version);
    if has_branch(&current) {
        return Some(current);
    }
    let previous = format!("gisx{}", major_version.saturating_sub(1));
    has_branch(&previous).then_some(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_branch_prefers_current_major() {
        let branch = version_branch(3, |name| name == "gisx3" || name == "gisx2");
        assert_eq!(branch.as_deref(), Some("gisx3"));
    }

    #[test]
    fn version_branch_falls_back_to_previous_major() {
        let branch = version_branch(3, |name| name == "gisx2");
        assert_eq!(branch.as_deref(), Some("gisx2"));
    }

    #[test]
    fn version_branch_is_absent_without_version_branches() {
        assert_eq!(version_branch(3, |_| false), None);
    }

    #[test]
    fn unknown_host_is_not_queried() {
        let lookup = HttpBranchLookup::new("test-agent");
        // example.invalid is not a known host, so no network call happens.
        assert!(lookup.try_default_branch("example.invalid/org/repo").is_none());
    }

    #[test]
    fn unparseable_input_falls_through() {
        let lookup = HttpBranchLookup::new("test-agent");
        assert!(lookup.try_default_branch("github.com").is_none());
    }
}
