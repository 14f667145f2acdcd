mod person;
mod view_model;

use futures::StreamExt;
use incremental_loading_core::{CollectionChanged, IncrementalCollection, Property};
use std::time::Duration;
use tokio::task::LocalSet;
use view_model::{MainViewModel, ViewModelOptions};

use crate::person::Person;

// Items a list control asks for when it reaches the end of the list
const ITEMS_PER_VIEWPORT: u32 = 20;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = ViewModelOptions::new()
        .delay(Duration::from_millis(300))
        .page_size(10)
        .max_pages(4);

    let local_set = LocalSet::new();
    local_set.run_until(run(options)).await;
}

async fn run(options: ViewModelOptions) {
    let view_model = MainViewModel::with_options(options);
    let persons = view_model.persons().clone();

    let _subscription = persons.subscribe(|event| match event {
        CollectionChanged::PropertyChanged(property) => log::debug!("{property} changed"),
        CollectionChanged::ItemAdded { index, item } => {
            log::info!("[{index}] {} ({})", item.name, item.age)
        }
        CollectionChanged::Reset => log::info!("list cleared"),
    });

    scroll_to_end(&persons).await;
    log::info!(
        "scrolled through {} persons in {} pages, busy: {}",
        persons.len(),
        persons.current_page_index(),
        view_model.is_busy()
    );

    // Pull to refresh
    let mut events = persons.events();
    persons.refresh();
    while let Some(event) = events.next().await {
        if event.property() == Some(Property::IsLoading) && !persons.is_loading() {
            break;
        }
    }
    drop(events);

    // Leaving the page while it loads
    let pending = persons.request_more_items(ITEMS_PER_VIEWPORT);
    prokio::time::sleep(Duration::from_millis(50)).await;
    if persons.cancel() {
        log::info!("left while loading page {}", persons.current_page_index());
    }

    if let Err(err) = pending.await {
        log::info!("{err}");
    }

    let items = persons.items();
    match serde_json::to_string_pretty(&items) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("failed to serialize persons: {err}"),
    }
}

/// Asks for more persons until the source runs out, like a list scrolled to
/// its end over and over.
async fn scroll_to_end(persons: &IncrementalCollection<Person>) {
    while persons.has_more_items() {
        let pending = persons.request_more_items(ITEMS_PER_VIEWPORT);

        // The list keeps asking while the page is on its way
        let again = persons.request_more_items(ITEMS_PER_VIEWPORT);
        if again.is_rejected() {
            log::debug!("page {} is already loading", persons.current_page_index());
        }

        match pending.await {
            Ok(ret) => log::info!("loaded {} persons", ret.count),
            Err(err) => {
                log::error!("{err}");
                break;
            }
        }
    }
}
