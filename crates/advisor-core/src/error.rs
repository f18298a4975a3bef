use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    #[error("Retrieval index corrupted: {0}")]
    IndexCorruption(String),

    #[error("Embedding backend unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Data provider error: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
