#![allow(dead_code)]

use incremental_loading_core::{
    AbortSignal, CollectionChanged, IncrementalCollection, Property, Subscription,
};
use std::{
    cell::{Cell, RefCell},
    convert::Infallible,
    fmt::{self, Display},
    rc::Rc,
    time::Duration,
};

#[derive(Debug)]
pub struct NoValueError;
impl std::error::Error for NoValueError {}
impl Display for NoValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no value found")
    }
}

#[derive(Default, Clone)]
pub struct Counter(Rc<Cell<u32>>);
impl Counter {
    pub fn increment(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

/// A change of a collection, with the item cloned out of its `Rc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Property(Property),
    Added(usize, T),
    Reset,
}

/// Records the changes of a collection while it is alive.
pub struct Recorder<T> {
    changes: Rc<RefCell<Vec<Change<T>>>>,
    _subscription: Subscription,
}

impl<T: Clone + 'static> Recorder<T> {
    pub fn new(collection: &IncrementalCollection<T>) -> Self {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let subscription = collection.subscribe({
            let changes = changes.clone();
            move |event| {
                let change = match event {
                    CollectionChanged::PropertyChanged(p) => Change::Property(*p),
                    CollectionChanged::ItemAdded { index, item } => {
                        Change::Added(*index, T::clone(item))
                    }
                    CollectionChanged::Reset => Change::Reset,
                };

                changes.borrow_mut().push(change);
            }
        });

        Recorder {
            changes,
            _subscription: subscription,
        }
    }

    /// Returns the changes recorded since the last call.
    pub fn take(&self) -> Vec<Change<T>> {
        std::mem::take(&mut *self.changes.borrow_mut())
    }
}

/// Returns the items of the collection cloned out of their `Rc`.
pub fn values<T: Clone>(collection: &IncrementalCollection<T>) -> Vec<T> {
    collection.with_items(|items| items.iter().map(|x| T::clone(x)).collect())
}

/// A collection whose page `n` holds `n * page_size .. (n + 1) * page_size`.
pub fn numbers(page_size: usize, calls: Counter) -> IncrementalCollection<usize> {
    IncrementalCollection::new(move |page: usize, _: AbortSignal| {
        calls.increment();
        async move {
            let start = page * page_size;
            Ok::<_, Infallible>(Some(start..start + page_size))
        }
    })
}

/// Like `numbers` but each page takes `delay` to arrive.
pub fn slow_numbers(
    page_size: usize,
    delay: Duration,
    calls: Counter,
) -> IncrementalCollection<usize> {
    IncrementalCollection::new(move |page: usize, _: AbortSignal| {
        calls.increment();
        async move {
            tokio::time::sleep(delay).await;
            let start = page * page_size;
            Ok::<_, Infallible>(Some(start..start + page_size))
        }
    })
}
