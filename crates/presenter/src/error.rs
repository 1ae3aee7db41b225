use client_core::TransportError;
use shared::domain::SlideId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("failed to load slide '{id}'")]
    SlideLoad {
        id: SlideId,
        #[source]
        source: std::io::Error,
    },
    #[error("presentation has no slides")]
    EmptyDeck,
    #[error("invalid zoom settings: {0}")]
    InvalidZoom(String),
    #[error("slide index {index} out of range for {len} slides")]
    OutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Channel(#[from] TransportError),
}
