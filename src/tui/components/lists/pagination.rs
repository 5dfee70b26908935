//! Offset/limit pagination state for server-backed lists.
//!
//! The state only changes through [`reduce`]. Navigation actions move the
//! offset in whole pages; the search result action replaces the page contents
//! and the server's match count. Everything shown to the user about the
//! current position ([`DisplayInfo`], the first/last page flags) is derived
//! from the state on demand.

/// Page size used when the caller does not choose one
pub const DEFAULT_LIMIT: usize = 10;

/// One page of search results in the generic list shape
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<T> {
    /// Items on the requested page, in display order
    pub entities: Vec<T>,

    /// Number of items matching the search across all pages
    pub matched_count: usize,
}

impl<T> SearchResult<T> {
    pub fn new(entities: Vec<T>, matched_count: usize) -> Self {
        Self {
            entities,
            matched_count,
        }
    }
}

/// Pagination state owned by one entity list
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState<T> {
    pub entities: Vec<T>,

    /// Zero-based index of the first item on the current page
    pub offset: usize,

    /// Page size, fixed for the lifetime of the list
    pub limit: usize,

    /// Items matching the search, as last reported by the server
    pub total_count: usize,
}

impl<T> SearchState<T> {
    /// Empty first page with the given page size (clamped to at least 1)
    pub fn new(limit: usize) -> Self {
        Self {
            entities: Vec::new(),
            offset: 0,
            limit: limit.max(1),
            total_count: 0,
        }
    }

    pub fn is_first_page(&self) -> bool {
        is_first_page(self)
    }

    pub fn is_last_page(&self) -> bool {
        is_last_page(self)
    }

    pub fn display_info(&self) -> DisplayInfo {
        DisplayInfo::from_state(self)
    }

    /// 1-based page number, for titles and logs
    pub fn page_number(&self) -> usize {
        self.offset / self.limit + 1
    }
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

/// Actions accepted by [`reduce`]
#[derive(Debug, Clone, PartialEq)]
pub enum PaginationAction<T> {
    /// A search completed; replace the page contents and total count
    SearchResult(SearchResult<T>),
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
}

impl<T> PaginationAction<T> {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            PaginationAction::SearchResult(_) => "search_result",
            PaginationAction::NextPage => "next_page",
            PaginationAction::PrevPage => "prev_page",
            PaginationAction::FirstPage => "first_page",
            PaginationAction::LastPage => "last_page",
        }
    }
}

/// Offset of the first item on the last page.
///
/// An empty result has a single empty page at offset 0.
pub fn last_page_offset(total_count: usize, limit: usize) -> usize {
    let limit = limit.max(1);
    let page_count = total_count / limit;
    if total_count % limit == 0 {
        page_count.saturating_sub(1) * limit
    } else {
        page_count * limit
    }
}

pub fn is_first_page<T>(state: &SearchState<T>) -> bool {
    state.offset == 0
}

pub fn is_last_page<T>(state: &SearchState<T>) -> bool {
    state.total_count.saturating_sub(state.offset) <= state.limit
}

/// Apply an action and return the next state.
///
/// Page moves are clamped to `[0, last_page_offset]`, so a stray next/previous
/// at a boundary leaves the offset where it is.
pub fn reduce<T>(state: SearchState<T>, action: PaginationAction<T>) -> SearchState<T> {
    let last_offset = last_page_offset(state.total_count, state.limit);

    match action {
        PaginationAction::SearchResult(result) => {
            let mut entities = result.entities;
            entities.truncate(state.limit);
            SearchState {
                entities,
                total_count: result.matched_count,
                ..state
            }
        }
        PaginationAction::NextPage => SearchState {
            offset: (state.offset + state.limit).min(last_offset.max(state.offset)),
            ..state
        },
        PaginationAction::PrevPage => SearchState {
            offset: state.offset.saturating_sub(state.limit),
            ..state
        },
        PaginationAction::FirstPage => SearchState { offset: 0, ..state },
        PaginationAction::LastPage => SearchState {
            offset: last_offset,
            ..state
        },
    }
}

/// Which items of how many are on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub first_item_idx: usize,
    pub last_item_idx: usize,
    pub total_count: usize,
}

impl DisplayInfo {
    pub fn from_state<T>(state: &SearchState<T>) -> Self {
        let last_item_idx = if is_last_page(state) {
            state.total_count
        } else {
            state.offset + state.limit
        };

        Self {
            first_item_idx: state.offset + 1,
            last_item_idx,
            total_count: state.total_count,
        }
    }

    /// Range text shown by the pagination bar
    pub fn range_text(&self) -> String {
        format!(
            "Displaying {}-{} of {}",
            self.first_item_idx, self.last_item_idx, self.total_count
        )
    }
}
