pub type ThiepResult<T> = Result<T, ThiepError>;

#[derive(thiserror::Error, Debug)]
pub enum ThiepError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown template '{0}'")]
    TemplateNotFound(String),

    #[error("asset load error: {0}")]
    AssetLoad(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ThiepError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn template_not_found(id: impl Into<String>) -> Self {
        Self::TemplateNotFound(id.into())
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
