use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobTrackError {
    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Store loop is not running")]
    StoreClosed,

    #[error("Invalid job entry {key}: {source}")]
    InvalidEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, JobTrackError>;
