use crate::data_structures::Room;
use thiserror::Error;

pub type SweeperResult<T> = std::result::Result<T, SweeperError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures talking to the record store. Any of these aborts the operation
/// that issued the call; nothing is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url:    String,
        status: u16,
    },
    #[error("{method} {url} failed")]
    Transport {
        method: &'static str,
        url:    String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SweeperError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("device {0} is not in the local cache")]
    NotFoundLocal(String),
    #[error("device {0} is not a robot")]
    NotARobot(String),
    #[error("a robot already exists in {0}")]
    RoomOccupied(Room),
    #[error("robot {0} has no dock to charge at")]
    NoDock(String),
    #[error("robot name must not be empty")]
    InvalidName,
    #[error("malformed record: {0}")]
    Malformed(String),
}
