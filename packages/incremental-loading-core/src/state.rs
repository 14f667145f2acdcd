/// A snapshot of the loading state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionState {
    /// Index of the next page to load.
    pub current_page_index: usize,

    /// `false` once the loader reported there is no more data.
    pub has_more_items: bool,

    /// `true` while a page is being loaded.
    pub is_loading: bool,
}

impl CollectionState {
    /// Returns `true` if the collection is not loading and not exhausted.
    pub fn can_load_more(&self) -> bool {
        self.has_more_items && !self.is_loading
    }

    /// Returns `true` if the loader reported there is no more data.
    pub fn is_exhausted(&self) -> bool {
        !self.has_more_items
    }
}

impl Default for CollectionState {
    fn default() -> Self {
        CollectionState {
            current_page_index: 0,
            has_more_items: true,
            is_loading: false,
        }
    }
}

/// The result of a page request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadMoreItemsResult {
    /// Number of items appended by the request.
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::CollectionState;

    #[test]
    fn can_load_more_when_idle_and_not_exhausted() {
        let state = CollectionState::default();
        assert!(state.can_load_more());

        let loading = CollectionState {
            is_loading: true,
            ..state
        };
        assert!(!loading.can_load_more());

        let exhausted = CollectionState {
            has_more_items: false,
            ..state
        };
        assert!(!exhausted.can_load_more());
        assert!(exhausted.is_exhausted());
    }
}
