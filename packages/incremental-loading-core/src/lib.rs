mod collection;
mod future;
mod id;
mod observer;
mod signal;
mod state;

pub use {collection::*, future::*, observer::*, signal::*, state::*};

//
pub mod loader;
pub mod retry;

pub use loader::PageLoader;
pub use retry::Retryer;

//
pub mod error;
pub use error::{CollectionError, Error, LoadError};
