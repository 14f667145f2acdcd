use crate::id::Id;
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver},
    Stream,
};
use pin_project_lite::pin_project;
use std::{
    cell::RefCell,
    fmt::{self, Debug, Display},
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
};

/// An observable property of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    CurrentPageIndex,
    HasMoreItems,
    IsLoading,
}

impl Property {
    /// Returns the name of the property.
    pub fn name(&self) -> &'static str {
        match self {
            Property::CurrentPageIndex => "CurrentPageIndex",
            Property::HasMoreItems => "HasMoreItems",
            Property::IsLoading => "IsLoading",
        }
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event emitted when a collection changes.
pub enum CollectionChanged<T> {
    /// The value of a property changed.
    PropertyChanged(Property),

    /// An item was appended at `index`.
    ItemAdded { index: usize, item: Rc<T> },

    /// All the items were removed.
    Reset,
}

impl<T> CollectionChanged<T> {
    /// Returns the property that changed, if this is a property event.
    pub fn property(&self) -> Option<Property> {
        match self {
            CollectionChanged::PropertyChanged(property) => Some(*property),
            _ => None,
        }
    }
}

impl<T> Clone for CollectionChanged<T> {
    fn clone(&self) -> Self {
        match self {
            CollectionChanged::PropertyChanged(p) => CollectionChanged::PropertyChanged(*p),
            CollectionChanged::ItemAdded { index, item } => CollectionChanged::ItemAdded {
                index: *index,
                item: item.clone(),
            },
            CollectionChanged::Reset => CollectionChanged::Reset,
        }
    }
}

impl<T: Debug> Debug for CollectionChanged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionChanged::PropertyChanged(p) => {
                f.debug_tuple("PropertyChanged").field(p).finish()
            }
            CollectionChanged::ItemAdded { index, item } => f
                .debug_struct("ItemAdded")
                .field("index", index)
                .field("item", item)
                .finish(),
            CollectionChanged::Reset => write!(f, "Reset"),
        }
    }
}

type Callback<T> = Rc<dyn Fn(&CollectionChanged<T>)>;

trait Unsubscribe {
    fn remove(&self, id: Id);
}

/// The callbacks listening to a collection.
pub(crate) struct Observers<T> {
    callbacks: RefCell<Vec<(Id, Callback<T>)>>,
}

impl<T: 'static> Observers<T> {
    pub fn new() -> Rc<Self> {
        Rc::new(Observers {
            callbacks: RefCell::new(Vec::new()),
        })
    }

    pub fn subscribe<F>(self: &Rc<Self>, f: F) -> Subscription
    where
        F: Fn(&CollectionChanged<T>) + 'static,
    {
        let id = Id::next();
        self.callbacks.borrow_mut().push((id, Rc::new(f)));

        let observers: Weak<Self> = Rc::downgrade(self);
        let observers: Weak<dyn Unsubscribe> = observers;
        Subscription {
            id,
            observers: Some(observers),
        }
    }

    pub fn channel(self: &Rc<Self>) -> CollectionEvents<T> {
        let (sx, rx) = unbounded();
        let subscription = self.subscribe(move |event| {
            // The receiver may be gone, the subscription goes with it
            let _ = sx.unbounded_send(event.clone());
        });

        CollectionEvents { rx, subscription }
    }
}

impl<T> Observers<T> {
    /// Calls every callback with each event, in order.
    ///
    /// Callbacks are collected up front so they can subscribe or unsubscribe
    /// while being notified.
    pub fn notify(&self, events: Vec<CollectionChanged<T>>) {
        self.notify_while(events, || true);
    }

    /// Like [`Observers::notify`] but stops delivering as soon as
    /// `is_current` returns `false`.
    ///
    /// A callback may reset the collection, the events left after that
    /// describe items that are gone.
    pub fn notify_while<F>(&self, events: Vec<CollectionChanged<T>>, is_current: F)
    where
        F: Fn() -> bool,
    {
        if events.is_empty() {
            return;
        }

        let callbacks = self
            .callbacks
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect::<Vec<_>>();

        for event in &events {
            for callback in &callbacks {
                if !is_current() {
                    log::trace!("dropping events superseded by a reset");
                    return;
                }

                callback(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }
}

impl<T> Unsubscribe for Observers<T> {
    fn remove(&self, id: Id) {
        self.callbacks.borrow_mut().retain(|(x, _)| *x != id);
    }
}

/// A callback registered in a collection.
///
/// The callback is removed when this is dropped.
#[must_use = "the callback is removed when the subscription is dropped"]
pub struct Subscription {
    id: Id,
    observers: Option<Weak<dyn Unsubscribe>>,
}

impl Subscription {
    /// Removes the callback.
    pub fn unsubscribe(mut self) {
        self.remove_callback();
    }

    fn remove_callback(&mut self) {
        if let Some(observers) = self.observers.take().and_then(|w| w.upgrade()) {
            log::trace!("removing observer {:?}", self.id);
            observers.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove_callback();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.observers.is_some())
            .finish()
    }
}

pin_project! {
    /// A stream of the changes of a collection.
    ///
    /// Returned by [`IncrementalCollection::events`], it stops receiving
    /// events when dropped.
    ///
    /// [`IncrementalCollection::events`]: crate::IncrementalCollection::events
    pub struct CollectionEvents<T> {
        #[pin]
        rx: UnboundedReceiver<CollectionChanged<T>>,
        subscription: Subscription,
    }
}

impl<T> Stream for CollectionEvents<T> {
    type Item = CollectionChanged<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().rx.poll_next(cx)
    }
}
