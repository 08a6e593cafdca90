//! Map weather-crate errors onto the application error hierarchy.

use skycast_core::error::ReqwestErrorExt;
use skycast_core::{AppError, NetworkError, StorageError};
use skycast_weather::{NetworkError as ClientError, StoreError};

/// Conversion into [`AppError`] for errors raised by `skycast-weather`.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for ClientError {
    fn into_app_error(self) -> AppError {
        let network = match self {
            ClientError::Transport(e) => e.into_network_error(),
            ClientError::Status { status, body } => NetworkError::ServerError {
                status,
                message: body,
            },
            ClientError::Decode(msg) => NetworkError::InvalidResponse(msg),
        };
        AppError::Network(network)
    }
}

impl IntoAppError for StoreError {
    fn into_app_error(self) -> AppError {
        let storage = match self {
            StoreError::Read { .. } => StorageError::ReadFailed(self.to_string()),
            StoreError::Write { .. } | StoreError::Serialize(_) => {
                StorageError::WriteFailed(self.to_string())
            }
            StoreError::Corrupt(_) => StorageError::Corruption(self.to_string()),
        };
        AppError::Storage(storage)
    }
}
