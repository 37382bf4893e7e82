use std::path::PathBuf;

use thiserror::Error;

use crate::{
    extractor::ExtractionError, fetcher::FetchError, parser::ParseError, pipeline::Stage,
};

/// Problems that make a whole run meaningless.  These abort the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read the configuration at {path:?}: {source:#}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("No URL template is configured for {0}")]
    MissingUrlTemplate(&'static str),
    #[error("The URL template {template:?} lacks the {placeholder} placeholder")]
    MissingPlaceholder {
        template: String,
        placeholder: &'static str,
    },
    #[error("The existing store {path:?} could not be loaded: {source:#}")]
    UnreadableStore {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("The store {path:?} could not be written: {source:#}")]
    UnwritableStore {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("No target could be determined for {0}")]
    NoTargets(&'static str),
    #[error("Failed to build the HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single target was skipped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{url:?} is not a valid URL: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ScrapeError {
    /// The pipeline stage the target was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            ScrapeError::InvalidUrl { .. } | ScrapeError::Fetch(_) => Stage::Fetching,
            ScrapeError::Extract(_) => Stage::Extracting,
            ScrapeError::Parse(_) => Stage::Parsing,
        }
    }
}
