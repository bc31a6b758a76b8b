use crate::providers::ProviderKind;

// GitHub token prefixes used with the REST API
// see https://github.blog/2021-04-05-behind-githubs-new-authentication-token-formats/
const GITHUB_PREFIXES: [&str; 3] = [
    "ghp_", // personal access token
    "gho_", // OAuth access token
    "ghu_", // user-to-server token
];

// GitLab token prefixes
// see https://docs.gitlab.com/ee/security/token_overview.html#token-prefixes
const GITLAB_PREFIXES: [&str; 10] = [
    "glpat-",   // personal access token
    "gloas-",   // OAuth application secret
    "gldt-",    // deploy token
    "glrt-",    // runner authentication token
    "glcbt-",   // CI/CD job token
    "glptt-",   // trigger token
    "glft-",    // feed token
    "glimt-",   // incoming mail token
    "glagent-", // agent for Kubernetes token
    "glsoat-",  // SCIM token
];

#[derive(Clone)]
pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds a token from an optional CLI/config value, treating blank input as absent.
    pub fn non_empty(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(Self::from)
    }

    /// The provider that issues tokens with this token's prefix, if recognised.
    pub fn provider(&self) -> Option<ProviderKind> {
        if GITHUB_PREFIXES.iter().any(|p| self.0.starts_with(p)) {
            Some(ProviderKind::GitHub)
        } else if GITLAB_PREFIXES.iter().any(|p| self.0.starts_with(p)) {
            Some(ProviderKind::GitLab)
        } else {
            None
        }
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
