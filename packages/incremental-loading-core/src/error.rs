use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

/// A cloneable error returned by a page loader.
#[derive(Clone)]
pub struct Error(Arc<dyn StdError + Send + Sync + 'static>);

impl Error {
    /// Constructs an error.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error(Arc::new(error))
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<E> From<E> for Error
where
    E: StdError + Send + Sync + 'static,
{
    #[cold]
    fn from(error: E) -> Self {
        Error::new(error)
    }
}

/// The reason a page load did not complete.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// The load was aborted before the page arrived.
    ///
    /// Happens when the collection is cancelled or refreshed mid-load, or when
    /// the pending future is dropped. No items of the page are appended.
    Cancelled,

    /// The loader returned an error.
    Failed(Error),
}

impl LoadError {
    /// Returns `true` if the load was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }

    /// Returns the loader error, if the load failed.
    pub fn as_failure(&self) -> Option<&Error> {
        match self {
            LoadError::Failed(err) => Some(err),
            LoadError::Cancelled => None,
        }
    }
}

impl StdError for LoadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LoadError::Failed(err) => Some(err.inner()),
            LoadError::Cancelled => None,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Cancelled => write!(f, "page load was cancelled"),
            LoadError::Failed(err) => write!(f, "page load failed: {err}"),
        }
    }
}

/// An error building a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// No page loader was given to the builder.
    MissingLoader,
}

impl StdError for CollectionError {}

impl Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::MissingLoader => write!(f, "a page loader is required"),
        }
    }
}
