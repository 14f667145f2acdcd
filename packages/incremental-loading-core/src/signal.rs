use futures::future::{AbortHandle, AbortRegistration};
use std::fmt::Debug;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// A signal observed by a page loader to stop early.
#[derive(Clone, Default)]
pub struct AbortSignal {
    token: CancellationToken,
}

impl AbortSignal {
    /// Returns `true` once the load this signal belongs to was aborted.
    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a future that resolves when the signal is aborted.
    pub fn aborted(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}

impl Debug for AbortSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortSignal")
            .field("aborted", &self.is_aborted())
            .finish()
    }
}

/// Aborts a single page load.
///
/// Aborting raises the [`AbortSignal`] handed to the loader and stops the
/// future registered with the controller, so a page that was already on its
/// way is dropped instead of appended.
pub struct AbortController {
    signal: AbortSignal,
    handle: AbortHandle,
}

impl AbortController {
    /// Constructs a controller that is not aborted.
    pub fn new() -> Self {
        Self::new_pair().0
    }

    /// Constructs a controller and the registration used to make a future
    /// abortable with [`futures::future::Abortable`].
    pub fn new_pair() -> (Self, AbortRegistration) {
        let (handle, registration) = AbortHandle::new_pair();
        let controller = AbortController {
            signal: AbortSignal::default(),
            handle,
        };

        (controller, registration)
    }

    /// Returns the signal of this controller.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Aborts the load, does nothing if already aborted.
    pub fn abort(&self) {
        if !self.signal.is_aborted() {
            log::trace!("abort");
            self.signal.token.cancel();
        }

        self.handle.abort();
    }

    /// Returns `true` if the controller was aborted.
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for AbortController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbortController")
            .field("signal", &self.signal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::AbortController;
    use futures::{
        future::{Abortable, Aborted},
        FutureExt,
    };
    use std::time::Duration;

    #[test]
    fn abort_is_idempotent() {
        let controller = AbortController::new();
        let signal = controller.signal();
        assert!(!signal.is_aborted());

        controller.abort();
        controller.abort();

        assert!(signal.is_aborted());
        assert!(controller.is_aborted());
        assert!(signal.aborted().now_or_never().is_some());
    }

    #[test]
    fn clones_share_the_signal() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let copy = signal.clone();

        controller.abort();
        assert!(copy.is_aborted());
        assert!(signal.is_aborted());
    }

    #[tokio::test]
    async fn aborted_wakes_waiting_task() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let waiter = async move {
            signal.aborted().await;
            "woken"
        };

        let trigger = async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            controller.abort();
        };

        let (ret, ()) = futures::join!(waiter, trigger);
        assert_eq!("woken", ret);
    }

    #[tokio::test]
    async fn abort_stops_wrapped_future() {
        let (controller, registration) = AbortController::new_pair();
        let fut = Abortable::new(tokio::time::sleep(Duration::from_secs(60)), registration);

        controller.abort();
        assert_eq!(Err(Aborted), fut.await);
    }
}
