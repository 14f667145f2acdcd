use crate::{
    collection::LoadGuard,
    error::LoadError,
    loader::{Page, TryBoxFuture},
    state::LoadMoreItemsResult,
};
use futures::future::{Abortable, Aborted};
use pin_project_lite::pin_project;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

pin_project! {
    /// Future returned by [`IncrementalCollection::request_more_items`].
    ///
    /// Dropping it before it resolves aborts the load.
    ///
    /// [`IncrementalCollection::request_more_items`]: crate::IncrementalCollection::request_more_items
    #[must_use = "the page is not appended unless the future is polled"]
    pub struct LoadMoreItems<T> {
        #[pin]
        fut: Option<Abortable<TryBoxFuture<Page<T>>>>,
        guard: Option<LoadGuard<T>>,
    }
}

impl<T> LoadMoreItems<T> {
    pub(crate) fn new(fut: Abortable<TryBoxFuture<Page<T>>>, guard: LoadGuard<T>) -> Self {
        LoadMoreItems {
            fut: Some(fut),
            guard: Some(guard),
        }
    }

    pub(crate) fn rejected() -> Self {
        LoadMoreItems {
            fut: None,
            guard: None,
        }
    }

    /// Returns `true` if the request was rejected because a page was loading.
    pub fn is_rejected(&self) -> bool {
        self.fut.is_none()
    }
}

impl<T> Future for LoadMoreItems<T> {
    type Output = Result<LoadMoreItemsResult, LoadError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let Some(fut) = this.fut.as_pin_mut() else {
            return Poll::Ready(Ok(LoadMoreItemsResult::default()));
        };

        if this.guard.is_none() {
            // Polled after it resolved
            return Poll::Ready(Err(LoadError::Cancelled));
        }

        let ret = match fut.poll(cx) {
            Poll::Ready(ret) => ret,
            Poll::Pending => return Poll::Pending,
        };

        let Some(mut guard) = this.guard.take() else {
            return Poll::Ready(Err(LoadError::Cancelled));
        };

        let ret = match ret {
            Ok(Ok(page)) => guard.complete(page),
            Ok(Err(err)) => Err(LoadError::Failed(err)),
            Err(Aborted) => Err(LoadError::Cancelled),
        };

        // Stops loading before the result is handed out
        drop(guard);
        Poll::Ready(ret)
    }
}
