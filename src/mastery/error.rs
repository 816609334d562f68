use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid attempt: {0}")]
    Validation(String),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
