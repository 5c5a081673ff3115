use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("row does not exist")]
    NotExist,
    #[error("nothing to update")]
    EmptyUpdate,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<super::StoreError> for AccountError {
    fn from(err: super::StoreError) -> Self {
        match err {
            super::StoreError::NotFound => AccountError::NotExist,
            other => AccountError::Internal(other.into()),
        }
    }
}
