use thiserror::Error;

/// Failures talking to an outside collaborator. Never surfaced to riders.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty response")]
    Empty,
}
