use hv_chain::ChainError;
use hv_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Files(#[from] FilesError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl VaultError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        VaultError::InvalidInput(message.into())
    }
}

pub type VaultResult<T> = std::result::Result<T, VaultError>;
