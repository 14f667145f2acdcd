mod common;

use common::*;
use incremental_loading_core::{CollectionState, LoadMoreItemsResult};

#[tokio::test]
async fn three_pages_of_ten() {
    let calls = Counter::default();
    let collection = numbers(10, calls.clone());

    for _ in 0..3 {
        let ret = collection.request_more_items(10).await.unwrap();
        assert_eq!(LoadMoreItemsResult { count: 10 }, ret);
    }

    assert_eq!(30, collection.len());
    assert_eq!(3, collection.current_page_index());
    assert!(collection.has_more_items());
    assert!(!collection.is_loading());
    assert_eq!(3, calls.get());
    assert_eq!((0..30).collect::<Vec<_>>(), values(&collection));
}

#[tokio::test]
async fn page_index_counts_non_empty_pages() {
    let calls = Counter::default();
    let collection = numbers(4, calls.clone());

    for expected in 1..=5 {
        collection.request_more_items(1).await.unwrap();
        assert_eq!(expected, collection.current_page_index());
    }

    assert_eq!(
        CollectionState {
            current_page_index: 5,
            has_more_items: true,
            is_loading: false,
        },
        collection.state()
    );
}

#[tokio::test]
async fn requested_count_is_only_a_hint() {
    let collection = numbers(3, Counter::default());

    let ret = collection.request_more_items(100).await.unwrap();
    assert_eq!(3, ret.count);

    let ret = collection.request_more_items(1).await.unwrap();
    assert_eq!(3, ret.count);
    assert_eq!(6, collection.len());
}

#[tokio::test]
async fn is_loading_while_page_is_pending() {
    let collection = slow_numbers(2, std::time::Duration::from_millis(5), Counter::default());

    let pending = collection.request_more_items(2);
    assert!(collection.is_loading());
    assert!(!collection.state().can_load_more());

    pending.await.unwrap();
    assert!(!collection.is_loading());
    assert_eq!(Some(1), collection.get(1).map(|x| *x));
    assert_eq!(None, collection.get(2));
}
