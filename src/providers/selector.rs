use log::debug;

use crate::auth::Token;
use crate::error::{PipescopeError, Result};

use super::{GitHubProvider, GitLabProvider, Provider, ProviderKind};

pub const DEFAULT_GITHUB_URL: &str = "https://api.github.com";
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

/// API endpoints used when constructing provider clients.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub github_url: String,
    pub gitlab_url: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            github_url: DEFAULT_GITHUB_URL.to_string(),
            gitlab_url: DEFAULT_GITLAB_URL.to_string(),
        }
    }
}

fn build(
    kind: ProviderKind,
    token: Option<Token>,
    options: &ProviderOptions,
) -> Result<Box<dyn Provider>> {
    debug!("Building {kind} client");
    match kind {
        ProviderKind::GitHub => Ok(Box::new(GitHubProvider::new(&options.github_url, token)?)),
        ProviderKind::GitLab => Ok(Box::new(GitLabProvider::new(&options.gitlab_url, token)?)),
    }
}

/// Builds the client for an explicitly named provider (`github` or `gitlab`).
pub fn from_name(
    name: &str,
    token: Option<Token>,
    options: &ProviderOptions,
) -> Result<Box<dyn Provider>> {
    let kind: ProviderKind = name.parse()?;
    build(kind, token, options)
}

/// Builds the client for whichever provider issues tokens with this prefix.
pub fn from_token(token: Token, options: &ProviderOptions) -> Result<Box<dyn Provider>> {
    let kind = token.provider().ok_or(PipescopeError::UnknownTokenFormat)?;
    build(kind, Some(token), options)
}

/// Host of a configured API URL, without the `api.` subdomain GitHub uses.
fn configured_host(base_url: &str) -> Option<String> {
    let url = url::Url::parse(base_url).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("api.").unwrap_or(host).to_string())
}

/// Builds the client for the host named in a git remote URL, either
/// github.com, gitlab.com or the host of a configured base URL.
pub fn from_remote_url(
    token: Option<Token>,
    remote_url: &str,
    options: &ProviderOptions,
) -> Result<Box<dyn Provider>> {
    let on_host = |default: &str, base_url: &str| {
        remote_url.contains(default)
            || configured_host(base_url).is_some_and(|host| remote_url.contains(&host))
    };

    let kind = if on_host("github.com", &options.github_url) {
        ProviderKind::GitHub
    } else if on_host("gitlab.com", &options.gitlab_url) {
        ProviderKind::GitLab
    } else {
        return Err(PipescopeError::UnknownRemoteHost(remote_url.to_string()));
    };
    build(kind, token, options)
}

/// Picks a provider: an explicit name wins, then the token's prefix, then the remote URL.
pub fn select(
    token: Option<Token>,
    provider_name: Option<&str>,
    remote_url: Option<&str>,
    options: &ProviderOptions,
) -> Result<Box<dyn Provider>> {
    match (provider_name.filter(|n| !n.is_empty()), token) {
        (Some(name), token) => from_name(name, token, options),
        (None, Some(token)) => from_token(token, options),
        (None, None) => from_remote_url(None, remote_url.unwrap_or_default(), options),
    }
}
