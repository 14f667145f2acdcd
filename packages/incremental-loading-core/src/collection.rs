use crate::{
    error::{CollectionError, LoadError},
    future::LoadMoreItems,
    loader::{Page, PageLoader},
    observer::{CollectionChanged, CollectionEvents, Observers, Property, Subscription},
    signal::AbortController,
    state::{CollectionState, LoadMoreItemsResult},
    Error,
};
use futures::{future::Abortable, Future};
use instant::Instant;
use std::{cell::RefCell, fmt::Debug, rc::Rc};

/// Decides whether two items are the same item.
pub struct Comparer<T>(Rc<dyn Fn(&T, &T) -> bool>);

impl<T: 'static> Comparer<T> {
    /// Constructs a comparer from an equality function.
    pub fn new<F>(eq: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        Comparer(Rc::new(eq))
    }

    /// Constructs a comparer that compares the keys of the items.
    pub fn by_key<F, K>(key: F) -> Self
    where
        F: Fn(&T) -> K + 'static,
        K: PartialEq,
    {
        Self::new(move |a, b| key(a) == key(b))
    }

    /// Constructs a comparer using the `PartialEq` of the items.
    pub fn partial_eq() -> Self
    where
        T: PartialEq,
    {
        Self::new(|a, b| a == b)
    }
}

impl<T> Comparer<T> {
    /// Returns `true` if both items are the same item.
    pub fn eq(&self, a: &T, b: &T) -> bool {
        (self.0)(a, b)
    }
}

impl<T> Clone for Comparer<T> {
    fn clone(&self) -> Self {
        Comparer(self.0.clone())
    }
}

struct State<T> {
    items: Vec<Rc<T>>,
    current_page_index: usize,
    has_more_items: bool,
    is_loading: bool,

    // Bumped by every load, cancel and reset. A load only touches the state
    // while the generation is the one it started with.
    generation: u64,
    in_flight: Option<AbortController>,
}

type Events<T> = Vec<CollectionChanged<T>>;

impl<T> State<T> {
    fn set_current_page_index(&mut self, value: usize, events: &mut Events<T>) {
        if self.current_page_index != value {
            self.current_page_index = value;
            events.push(CollectionChanged::PropertyChanged(Property::CurrentPageIndex));
        }
    }

    fn set_has_more_items(&mut self, value: bool, events: &mut Events<T>) {
        if self.has_more_items != value {
            self.has_more_items = value;
            events.push(CollectionChanged::PropertyChanged(Property::HasMoreItems));
        }
    }

    fn set_is_loading(&mut self, value: bool, events: &mut Events<T>) {
        if self.is_loading != value {
            self.is_loading = value;
            events.push(CollectionChanged::PropertyChanged(Property::IsLoading));
        }
    }

    /// Aborts the load in flight and makes it unable to change the state.
    fn supersede(&mut self, events: &mut Events<T>) -> bool {
        self.generation += 1;
        let in_flight = self.in_flight.take();
        let aborted = in_flight.is_some();

        if let Some(controller) = in_flight {
            controller.abort();
        }

        self.set_is_loading(false, events);
        aborted
    }

    fn snapshot(&self) -> CollectionState {
        CollectionState {
            current_page_index: self.current_page_index,
            has_more_items: self.has_more_items,
            is_loading: self.is_loading,
        }
    }
}

struct Inner<T> {
    loader: PageLoader<T>,
    comparer: Option<Comparer<T>>,
    state: RefCell<State<T>>,
    observers: Rc<Observers<T>>,
}

/// A list of items loaded page by page when more are requested.
///
/// The collection is bound to one [`PageLoader`] for its whole life. Each
/// call to [`request_more_items`](Self::request_more_items) loads the page at
/// [`current_page_index`](Self::current_page_index) and appends its items; at
/// most one page is loaded at a time, a request made while loading is
/// rejected and yields no items.
///
/// When a [`Comparer`] is given, items already in the collection are skipped.
/// The comparer runs while the collection is being updated and must not call
/// back into it.
///
/// Clones share the same items and state.
pub struct IncrementalCollection<T> {
    inner: Rc<Inner<T>>,
}

impl<T: 'static> IncrementalCollection<T> {
    /// Returns a builder for an `IncrementalCollection`.
    pub fn builder() -> CollectionBuilder<T> {
        CollectionBuilder::new()
    }

    /// Constructs a collection that loads its pages with the given function.
    pub fn new<F, Fut, I, E>(loader: F) -> Self
    where
        F: Fn(usize, crate::AbortSignal) -> Fut + 'static,
        Fut: Future<Output = Result<Option<I>, E>> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<Error> + 'static,
    {
        Self::from_loader(PageLoader::new(loader), None)
    }

    /// Constructs a collection that skips items equal to one it already has.
    pub fn with_comparer<F, Fut, I, E, C>(loader: F, comparer: C) -> Self
    where
        F: Fn(usize, crate::AbortSignal) -> Fut + 'static,
        Fut: Future<Output = Result<Option<I>, E>> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<Error> + 'static,
        C: Fn(&T, &T) -> bool + 'static,
    {
        Self::from_loader(PageLoader::new(loader), Some(Comparer::new(comparer)))
    }

    /// Constructs a collection from a page loader and an optional comparer.
    pub fn from_loader(loader: PageLoader<T>, comparer: Option<Comparer<T>>) -> Self {
        let state = State {
            items: Vec::new(),
            current_page_index: 0,
            has_more_items: true,
            is_loading: false,
            generation: 0,
            in_flight: None,
        };

        IncrementalCollection {
            inner: Rc::new(Inner {
                loader,
                comparer,
                state: RefCell::new(state),
                observers: Observers::new(),
            }),
        }
    }

    /// Requests the next page.
    ///
    /// `count` is only a hint, the loader decides the size of a page. If a
    /// page is already loading this returns a future that resolves at once
    /// with a count of 0. Otherwise the collection is marked as loading and the
    /// loader is called before this returns.
    ///
    /// The future resolves with the number of items appended, which can be
    /// less than the size of the page when duplicates are skipped. Loader
    /// errors are returned as they are, the collection does not retry.
    /// Dropping the future aborts the load.
    pub fn request_more_items(&self, count: u32) -> LoadMoreItems<T> {
        let mut events = Vec::new();
        let (page_index, generation, controller, registration) = {
            let mut state = self.inner.state.borrow_mut();
            if state.is_loading {
                log::trace!(
                    "rejected request of {count} items, page {} is loading",
                    state.current_page_index
                );
                return LoadMoreItems::rejected();
            }

            state.set_is_loading(true, &mut events);
            state.generation += 1;

            let (controller, registration) = AbortController::new_pair();
            (state.current_page_index, state.generation, controller, registration)
        };

        log::trace!("loading page {page_index} ({count} items requested)");
        self.inner.observers.notify(events);

        let signal = controller.signal();
        {
            // An observer may have cancelled or refreshed the collection already
            let mut state = self.inner.state.borrow_mut();
            if state.generation == generation {
                state.in_flight = Some(controller);
            } else {
                controller.abort();
            }
        }

        let fut = self.inner.loader.get(page_index, signal);
        let guard = LoadGuard {
            collection: self.clone(),
            page_index,
            generation,
            started: Instant::now(),
            completed: false,
        };

        LoadMoreItems::new(Abortable::new(fut, registration), guard)
    }

    /// Aborts the page being loaded.
    ///
    /// The collection stops loading at once and the pending request resolves
    /// with [`LoadError::Cancelled`]. Returns `false` if nothing was loading.
    pub fn cancel(&self) -> bool {
        let mut events = Vec::new();
        let aborted = self.inner.state.borrow_mut().supersede(&mut events);

        if aborted {
            log::trace!("cancelled page load");
        }

        self.inner.observers.notify(events);
        aborted
    }

    /// Clears the collection and loads the first page again, in the background.
    ///
    /// The load is spawned with [`prokio::spawn_local`] so this must be called
    /// from a local task set. A failure of the load is logged.
    pub fn refresh(&self) {
        let fut = self.reload();

        prokio::spawn_local(async move {
            match fut.await {
                Ok(LoadMoreItemsResult { count }) => log::debug!("refreshed with {count} items"),
                Err(LoadError::Cancelled) => log::trace!("refresh was cancelled"),
                Err(err) => log::warn!("refresh failed: {err}"),
            }
        });
    }

    /// Clears the collection and returns the request of the first page.
    ///
    /// A page loading when this is called is aborted, none of its items are
    /// appended after the reset.
    pub fn reload(&self) -> LoadMoreItems<T> {
        let mut events = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            state.supersede(&mut events);
            state.set_current_page_index(0, &mut events);
            state.items.clear();
            events.push(CollectionChanged::Reset);
            state.set_has_more_items(true, &mut events);
        }

        log::trace!("reset collection");
        self.inner.observers.notify(events);
        self.request_more_items(1)
    }

    /// Adds a callback called on each change of the collection.
    ///
    /// The callback can read the collection. It is removed when the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&CollectionChanged<T>) + 'static,
    {
        self.inner.observers.subscribe(f)
    }

    /// Returns a stream of the changes of the collection.
    pub fn events(&self) -> CollectionEvents<T> {
        self.inner.observers.channel()
    }
}

impl<T> IncrementalCollection<T> {
    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    /// Returns `true` if there are no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the item at the given index.
    pub fn get(&self, index: usize) -> Option<Rc<T>> {
        self.inner.state.borrow().items.get(index).cloned()
    }

    /// Returns a copy of the items.
    pub fn items(&self) -> Vec<Rc<T>> {
        self.inner.state.borrow().items.clone()
    }

    /// Calls `f` with the items, without copying them.
    ///
    /// `f` must not modify the collection.
    pub fn with_items<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Rc<T>]) -> R,
    {
        f(&self.inner.state.borrow().items)
    }

    /// Returns the index of the next page to load.
    pub fn current_page_index(&self) -> usize {
        self.inner.state.borrow().current_page_index
    }

    /// Returns `false` once the loader reported there is no more data.
    pub fn has_more_items(&self) -> bool {
        self.inner.state.borrow().has_more_items
    }

    /// Returns `true` while a page is loading.
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    /// Returns the state of the collection.
    pub fn state(&self) -> CollectionState {
        self.inner.state.borrow().snapshot()
    }
}

impl<T> Clone for IncrementalCollection<T> {
    fn clone(&self) -> Self {
        IncrementalCollection {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for IncrementalCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Debug for IncrementalCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalCollection")
            .field("len", &self.len())
            .field("state", &self.state())
            .field("loader", &self.inner.loader)
            .field("comparer", &self.inner.comparer.is_some())
            .field("observers", &self.inner.observers.len())
            .finish()
    }
}

/// Owns the loading state of one request.
///
/// Dropping the guard ends the load: the collection stops loading, and if
/// the page never arrived the abort signal is raised. A guard whose load was
/// superseded by a cancel or a reset leaves the collection alone.
pub(crate) struct LoadGuard<T> {
    collection: IncrementalCollection<T>,
    page_index: usize,
    generation: u64,
    started: Instant,
    completed: bool,
}

impl<T> LoadGuard<T> {
    /// Appends the loaded page to the collection.
    pub fn complete(&mut self, page: Page<T>) -> Result<LoadMoreItemsResult, LoadError> {
        self.completed = true;

        let inner = &self.collection.inner;
        let mut events = Vec::new();
        let appended = {
            let mut state = inner.state.borrow_mut();
            if state.generation != self.generation {
                return Err(LoadError::Cancelled);
            }

            let before = state.items.len();

            match page {
                None => {
                    log::trace!("page {} reported no more data", self.page_index);
                    state.set_has_more_items(false, &mut events);
                }
                Some(items) => {
                    // The page index follows what was fetched, duplicates included
                    if !items.is_empty() {
                        let next = state.current_page_index + 1;
                        state.set_current_page_index(next, &mut events);
                    }

                    for item in items {
                        if let Some(comparer) = &inner.comparer {
                            if state.items.iter().any(|x| comparer.eq(x, &item)) {
                                continue;
                            }
                        }

                        let index = state.items.len();
                        let item = Rc::new(item);
                        state.items.push(item.clone());
                        events.push(CollectionChanged::ItemAdded { index, item });
                    }
                }
            }

            state.items.len() - before
        };

        log::debug!(
            "page {} appended {appended} items in {:?}",
            self.page_index,
            self.started.elapsed()
        );

        let generation = self.generation;
        let is_current = || inner.state.borrow().generation == generation;
        inner.observers.notify_while(events, &is_current);

        // An observer reset the collection, the page is gone
        if !is_current() {
            return Err(LoadError::Cancelled);
        }

        let count = u32::try_from(appended).unwrap_or(u32::MAX);
        Ok(LoadMoreItemsResult { count })
    }
}

impl<T> Drop for LoadGuard<T> {
    fn drop(&mut self) {
        let inner = &self.collection.inner;
        let mut events = Vec::new();
        {
            let mut state = inner.state.borrow_mut();
            if state.generation != self.generation {
                return;
            }

            if let Some(controller) = state.in_flight.take() {
                if !self.completed {
                    log::trace!("page {} was abandoned", self.page_index);
                    controller.abort();
                }
            }

            state.set_is_loading(false, &mut events);
        }

        inner.observers.notify(events);
    }
}

/// A builder for creating an `IncrementalCollection`.
pub struct CollectionBuilder<T> {
    loader: Option<PageLoader<T>>,
    comparer: Option<Comparer<T>>,
}

impl<T: 'static> CollectionBuilder<T> {
    /// Constructs an empty `CollectionBuilder`.
    pub fn new() -> Self {
        CollectionBuilder {
            loader: None,
            comparer: None,
        }
    }

    /// Sets the function used to load the pages.
    pub fn loader<F, Fut, I, E>(self, loader: F) -> Self
    where
        F: Fn(usize, crate::AbortSignal) -> Fut + 'static,
        Fut: Future<Output = Result<Option<I>, E>> + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<Error> + 'static,
    {
        self.page_loader(PageLoader::new(loader))
    }

    /// Sets the page loader.
    pub fn page_loader(mut self, loader: PageLoader<T>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Sets the function used to skip items already in the collection.
    pub fn comparer<F>(mut self, eq: F) -> Self
    where
        F: Fn(&T, &T) -> bool + 'static,
    {
        self.comparer = Some(Comparer::new(eq));
        self
    }

    /// Skips items with the same key as one already in the collection.
    pub fn comparer_by_key<F, K>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> K + 'static,
        K: PartialEq,
    {
        self.comparer = Some(Comparer::by_key(key));
        self
    }

    /// Returns the `IncrementalCollection` using this builder options.
    pub fn build(self) -> Result<IncrementalCollection<T>, CollectionError> {
        let Self { loader, comparer } = self;
        let loader = loader.ok_or(CollectionError::MissingLoader)?;
        Ok(IncrementalCollection::from_loader(loader, comparer))
    }
}

impl<T: 'static> Default for CollectionBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
