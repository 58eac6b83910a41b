use thiserror::Error;

use crate::metric::Distance;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("tree is empty")]
    EmptyTree,

    #[error("child slot at distance {0} is already occupied")]
    OccupiedSlot(Distance),

    #[error("failed to build search worker pool: {0}")]
    WorkerPool(String),

    #[error("failed to encode tree: {0}")]
    Export(#[from] serde_json::Error),

    #[error("config error: {message}")]
    Config { message: String },
}

pub type TreeResult<T> = Result<T, TreeError>;
