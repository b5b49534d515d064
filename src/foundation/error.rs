/// Convenience result type used across gridweave.
pub type GridweaveResult<T> = Result<T, GridweaveError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum GridweaveError {
    /// Invalid job, descriptor, or parameter data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Grid or extent inconsistencies detected while assembling images.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors while decoding source rasters at the codec boundary.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors while encoding or writing output rows.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing job descriptors.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GridweaveError {
    /// Build a [`GridweaveError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GridweaveError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`GridweaveError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`GridweaveError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`GridweaveError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
