use crate::person::Person;
use incremental_loading_core::{AbortSignal, IncrementalCollection};
use instant::Instant;
use std::{cell::Cell, convert::Infallible, rc::Rc, time::Duration};

/// Options of the simulated person source.
#[derive(Debug, Clone)]
pub struct ViewModelOptions {
    pub(crate) delay: Duration,
    pub(crate) page_size: usize,
    pub(crate) max_pages: Option<usize>,
}

impl ViewModelOptions {
    /// Constructs the default `ViewModelOptions`.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets how long a page takes to load.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the number of persons in a page.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the number of pages after which the source has no more data.
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }
}

impl Default for ViewModelOptions {
    fn default() -> Self {
        ViewModelOptions {
            delay: Duration::from_secs(3),
            page_size: 10,
            max_pages: None,
        }
    }
}

/// The state behind the list of persons.
#[derive(Clone)]
pub struct MainViewModel {
    is_busy: Rc<Cell<bool>>,
    persons: IncrementalCollection<Person>,
}

impl MainViewModel {
    pub fn with_options(options: ViewModelOptions) -> Self {
        let is_busy = Rc::new(Cell::new(false));
        let persons = IncrementalCollection::new({
            let is_busy = is_busy.clone();
            move |page_index, signal| {
                load_persons(is_busy.clone(), options.clone(), page_index, signal)
            }
        });

        MainViewModel { is_busy, persons }
    }

    /// Returns `true` while the source is producing a page.
    pub fn is_busy(&self) -> bool {
        self.is_busy.get()
    }

    pub fn persons(&self) -> &IncrementalCollection<Person> {
        &self.persons
    }
}

/// Sets the busy flag until dropped.
struct Busy(Rc<Cell<bool>>);

impl Busy {
    fn start(flag: Rc<Cell<bool>>) -> Self {
        flag.set(true);
        Busy(flag)
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// Page `n` holds the persons `n .. n + page_size`, so pages overlap.
async fn load_persons(
    is_busy: Rc<Cell<bool>>,
    options: ViewModelOptions,
    page_index: usize,
    signal: AbortSignal,
) -> Result<Option<Vec<Person>>, Infallible> {
    if is_busy.get() {
        return Ok(Some(Vec::new()));
    }

    if options.max_pages.map_or(false, |max| page_index >= max) {
        log::debug!("no more persons after page {page_index}");
        return Ok(None);
    }

    let _busy = Busy::start(is_busy);
    let started = Instant::now();

    tokio::select! {
        _ = signal.aborted() => {
            log::debug!("loading page {page_index} was aborted after {:?}", started.elapsed());
            return Ok(Some(Vec::new()));
        }
        _ = prokio::time::sleep(options.delay) => {}
    }

    let persons = (page_index..page_index + options.page_size)
        .map(|i| Person::new(format!("Name{i}"), u32::try_from(i).unwrap_or(u32::MAX)))
        .collect();

    Ok(Some(persons))
}
