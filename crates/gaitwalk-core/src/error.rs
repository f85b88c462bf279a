use crate::shape::Shape;

/// All errors that can occur within the gaitwalk pipeline.
///
/// A single error type across the workspace simplifies propagation: tensor
/// shape failures, configuration failures, and label-lookup failures all
/// travel through the same `Result`.  Configuration errors
/// ([`Error::UnsupportedClassCount`], [`Error::UnsupportedCombination`])
/// are raised at construction time, never deferred to the first batch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Shape mismatch between two tensors (e.g. concatenating clips with
    /// different spatial sizes).
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Element count mismatch when creating a tensor from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Frame index out of range when slicing the temporal dimension.
    #[error("index out of bounds: index {index}, dim {dim} has size {dim_size}")]
    IndexOutOfBounds {
        index: usize,
        dim: usize,
        dim_size: usize,
    },

    /// The configured disease class count is not one of the supported
    /// mapping tables.
    #[error("unsupported class count: {got} (supported: 2, 3 or 4)")]
    UnsupportedClassCount { got: usize },

    /// A disease string has no entry in the configured mapping table and
    /// no fallback applies.
    #[error("unknown disease {disease:?} for the {class_count}-class mapping")]
    UnknownDisease { disease: String, class_count: usize },

    /// No dataset-selection branch matches the configured backbone and
    /// experiment tags.
    #[error("unsupported configuration: backbone {backbone:?}, experiment {experiment:?}")]
    UnsupportedCombination { backbone: String, experiment: String },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("cycle {} out of range for patient {}", g, id)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
