pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Ordinal access past the end of an [`crate::OrderedIntSet`].
    #[error("index {index} out of range for set of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub(crate) fn index_out_of_range(index: usize, size: usize) -> Self {
        Error::IndexOutOfRange { index, size }
    }
}
