use reqwest::StatusCode;
use thiserror::Error;

/// Why a single source contributed nothing. Never fatal to a batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("malformed feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// A failure of the whole aggregation run, as opposed to a single source.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("aggregation task failed: {0}")]
    Aggregation(#[from] tokio::task::JoinError),
}
