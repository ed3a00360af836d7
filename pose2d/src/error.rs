use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown bone index: {index}")]
    UnknownBone { index: usize },

    #[error("bone hierarchy revisits bone {bone}")]
    CyclicHierarchy { bone: usize },

    #[error("bone {bone} is nested deeper than the limit of {limit}")]
    DepthLimitExceeded { bone: usize, limit: usize },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse skeleton JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("unknown parent bone '{parent}' for bone '{bone}'")]
    JsonUnknownBoneParent { bone: String, parent: String },
}
