use std::path::PathBuf;

/// Errors raised by the tool around the transforms.
///
/// The transforms themselves never fail: a block that cannot be found is
/// skipped. These cover configuration and site I/O.
#[derive(Debug, thiserror::Error)]
pub enum DecorateError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid exclude pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page {} is not valid UTF-8", .0.display())]
    Encoding(PathBuf),

    #[error("background task failed: {0}")]
    Task(String),
}

impl DecorateError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| DecorateError::Io { path, source }
    }
}
