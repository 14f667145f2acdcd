use crate::{retry::Retryer, signal::AbortSignal, Error};
use futures::Future;
use std::{fmt::Debug, pin::Pin, rc::Rc};

pub type TryBoxFuture<T, E = Error> = Pin<Box<dyn Future<Output = Result<T, E>>>>;

/// What a loader yields for one page: `None` when there is no more data.
pub type Page<T> = Option<Vec<T>>;

/// Loads the page at an index, observing an [`AbortSignal`].
pub struct PageLoader<T>(Rc<dyn Fn(usize, AbortSignal) -> TryBoxFuture<Page<T>>>);

impl<T: 'static> PageLoader<T> {
    /// Constructs a loader from a function of the page index and abort signal.
    ///
    /// The function returns `Ok(None)` once the source is exhausted. Any
    /// iterable is accepted as a page and collected before it reaches the
    /// collection.
    pub fn new<F, Fut, I, E>(loader: F) -> Self
    where
        F: Fn(usize, AbortSignal) -> Fut + 'static,
        Fut: Future<Output = Result<Option<I>, E>> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<Error> + 'static,
    {
        let f = Rc::new(move |page_index, signal| {
            let fut = loader(page_index, signal);
            Box::pin(async move {
                match fut.await {
                    Ok(page) => Ok(page.map(|items| items.into_iter().collect())),
                    Err(e) => Err(e.into()),
                }
            }) as TryBoxFuture<Page<T>>
        });

        PageLoader(f)
    }

    /// Returns a loader that retries this one when it fails.
    ///
    /// Each failure waits for the next delay of the retryer and loads the same
    /// page again. Retrying stops when a load succeeds, when the delays run out
    /// or when the signal is aborted; the last error is returned then.
    pub fn with_retry(self, retryer: Retryer) -> Self {
        let inner = self.0;
        let f = Rc::new(move |page_index, signal: AbortSignal| {
            let inner = inner.clone();
            let retryer = retryer.clone();

            Box::pin(async move {
                let mut ret = inner(page_index, signal.clone()).await;

                for delay in retryer.get() {
                    if ret.is_ok() || signal.is_aborted() {
                        break;
                    }

                    log::trace!("retrying page {page_index} in {delay:?}");
                    prokio::time::sleep(delay).await;
                    ret = inner(page_index, signal.clone()).await;
                }

                ret
            }) as TryBoxFuture<Page<T>>
        });

        PageLoader(f)
    }
}

impl<T> PageLoader<T> {
    /// Starts loading the page at the given index.
    pub fn get(&self, page_index: usize, signal: AbortSignal) -> TryBoxFuture<Page<T>> {
        (self.0)(page_index, signal)
    }
}

impl<T> Clone for PageLoader<T> {
    fn clone(&self) -> Self {
        PageLoader(self.0.clone())
    }
}

impl<T> Debug for PageLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PageLoader<{}>", std::any::type_name::<T>())
    }
}
