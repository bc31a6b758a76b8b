use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipescopeError {
    #[error("git lookup failed: {0}")]
    GitLookup(String),

    #[error("unsupported provider '{0}' (expected 'github' or 'gitlab')")]
    UnsupportedProvider(String),

    #[error("could not determine provider from access token")]
    UnknownTokenFormat,

    #[error("could not determine provider from remote url '{0}'")]
    UnknownRemoteHost(String),

    #[error("malformed repository path: 'owner' and 'repo' could not be extracted from {0}")]
    InvalidRepositoryPath(String),

    #[error("no pipelines found for project {project}@{sha}")]
    PipelineNotFound { project: String, sha: String },

    #[error("{context}: {source}")]
    PipelineFetch {
        context: String,
        #[source]
        source: Box<PipescopeError>,
    },

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("polling cancelled")]
    Cancelled,

    #[error("pipeline still pending after {0:?}")]
    PollTimeout(std::time::Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PipescopeError {
    /// Wraps a provider error with the operation that produced it.
    pub fn fetch(context: impl Into<String>, source: PipescopeError) -> Self {
        Self::PipelineFetch {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns the innermost error, looking through `PipelineFetch` wrappers.
    pub fn root(&self) -> &PipescopeError {
        match self {
            Self::PipelineFetch { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipescopeError>;
