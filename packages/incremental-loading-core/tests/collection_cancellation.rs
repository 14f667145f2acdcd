mod common;

use common::*;
use incremental_loading_core::{AbortSignal, IncrementalCollection, LoadError, Property};
use std::{cell::RefCell, convert::Infallible, rc::Rc, time::Duration};

/// A collection whose loader keeps the signal of each load.
fn observed_collection(
    delay: Duration,
) -> (IncrementalCollection<usize>, Rc<RefCell<Vec<AbortSignal>>>) {
    let signals = Rc::new(RefCell::new(Vec::new()));
    let collection = IncrementalCollection::new({
        let signals = signals.clone();
        move |page: usize, signal: AbortSignal| {
            signals.borrow_mut().push(signal);
            async move {
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(Some(vec![page]))
            }
        }
    });

    (collection, signals)
}

#[tokio::test]
async fn cancel_resolves_pending_request() {
    let (collection, signals) = observed_collection(Duration::from_secs(60));

    let pending = collection.request_more_items(1);
    assert!(collection.is_loading());

    assert!(collection.cancel());
    assert!(!collection.is_loading());
    assert!(signals.borrow()[0].is_aborted());

    let err = pending.await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(collection.is_empty());
    assert_eq!(0, collection.current_page_index());
    assert!(collection.has_more_items());
}

#[tokio::test]
async fn cancel_without_load_does_nothing() {
    let (collection, _) = observed_collection(Duration::ZERO);
    let recorder = Recorder::new(&collection);

    assert!(!collection.cancel());
    assert!(recorder.take().is_empty());
}

#[tokio::test]
async fn dropping_request_aborts_load() {
    let (collection, signals) = observed_collection(Duration::from_secs(60));
    let recorder = Recorder::new(&collection);

    let pending = collection.request_more_items(1);
    assert!(collection.is_loading());

    drop(pending);

    assert!(!collection.is_loading());
    assert!(signals.borrow()[0].is_aborted());
    assert_eq!(
        vec![
            Change::Property(Property::IsLoading),
            Change::Property(Property::IsLoading),
        ],
        recorder.take()
    );
}

#[tokio::test]
async fn abandoned_request_after_timeout() {
    let (collection, signals) = observed_collection(Duration::from_secs(60));

    let ret = tokio::time::timeout(
        Duration::from_millis(10),
        collection.request_more_items(1),
    )
    .await;

    assert!(ret.is_err());
    assert!(!collection.is_loading());
    assert!(signals.borrow()[0].is_aborted());
    assert!(collection.is_empty());
}

#[tokio::test]
async fn cancelled_loader_is_dropped_before_it_resumes() {
    let finished_early = Counter::default();
    let collection = IncrementalCollection::new({
        let finished_early = finished_early.clone();
        move |_, signal: AbortSignal| {
            let finished_early = finished_early.clone();
            async move {
                tokio::select! {
                    _ = signal.aborted() => {
                        finished_early.increment();
                        Ok::<_, Infallible>(None::<Vec<u8>>)
                    }
                    _ = tokio::time::sleep(Duration::from_secs(60)) => Ok(Some(vec![1])),
                }
            }
        }
    });

    let pending = collection.request_more_items(1);
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        collection.cancel();
    };

    let (ret, ()) = futures::join!(pending, cancel);

    // The page is dropped even though the loader returned
    assert!(matches!(ret, Err(LoadError::Cancelled)));
    assert!(collection.has_more_items());
    assert_eq!(0, finished_early.get());
}

#[tokio::test]
async fn loads_same_page_after_cancel() {
    let (collection, signals) = observed_collection(Duration::from_millis(1));

    let pending = collection.request_more_items(1);
    collection.cancel();
    assert!(pending.await.is_err());

    let ret = collection.request_more_items(1).await.unwrap();
    assert_eq!(1, ret.count);
    assert_eq!(vec![0], values(&collection));
    assert_eq!(2, signals.borrow().len());
    assert!(!signals.borrow()[1].is_aborted());
}
