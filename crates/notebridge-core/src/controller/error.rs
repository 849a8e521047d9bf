use thiserror::Error;

use crate::bridge::BridgeError;
use crate::images::ImageError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Cannot {0} here")]
    InvalidState(&'static str),
}

pub type ControllerResult<T> = Result<T, ControllerError>;
