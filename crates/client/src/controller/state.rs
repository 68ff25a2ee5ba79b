//! Pure browse state machine.
//!
//! [`transition`] maps `(state, event)` to `(state, effects)` and performs no
//! I/O. Effects describe the requests to make; their completions come back
//! as events carrying the tag of the request that issued them.
//!
//! Two counters produce those tags. The *session* covers the one-time loads
//! (categories and total count) and only moves on mount or reset. The
//! *generation* covers the product list and moves whenever the selection
//! changes. A late completion whose tag no longer matches its counter is
//! dropped, so a filter change never discards the categories or the total.

use dharma_core::api::ProductFilterRequest;
use dharma_core::{Category, CategoryId, FilterSelection, PriceRange, ProductSummary};

/// What the controller is waiting for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    Filtering,
}

/// Where the displayed product list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pages `1..=cursor` of the listing have been accumulated.
    Browsing { cursor: u32 },
    /// The list is a single filter result.
    Filtered,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Browsing { cursor: 0 }
    }
}

/// Which request a completion or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Categories,
    TotalCount,
    Page(u32),
    Filter,
}

/// The most recent failed request, kept for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: RequestKind,
    pub message: String,
}

/// Progress of a one-time load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Fetch {
    #[default]
    NotStarted,
    Pending,
    Done,
    Failed(String),
}

impl Fetch {
    /// Whether the load has to be issued again.
    const fn needs_retry(&self) -> bool {
        matches!(self, Self::NotStarted | Self::Failed(_))
    }
}

/// A request the driver must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCategories { session: u64 },
    FetchTotal { session: u64 },
    FetchPage { generation: u64, page: u32 },
    FetchFilter {
        generation: u64,
        request: ProductFilterRequest,
    },
}

impl Effect {
    /// The tag its completion must carry.
    #[must_use]
    pub const fn tag(&self) -> u64 {
        match self {
            Self::FetchCategories { session } | Self::FetchTotal { session } => *session,
            Self::FetchPage { generation, .. } | Self::FetchFilter { generation, .. } => {
                *generation
            }
        }
    }
}

/// Result payload of a completed request. Errors are carried as messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Categories(Result<Vec<Category>, String>),
    Total(Result<u64, String>),
    Page {
        page: u32,
        result: Result<Vec<ProductSummary>, String>,
    },
    Filter(Result<Vec<ProductSummary>, String>),
}

/// Inputs to the state machine: user actions and request completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Mounted,
    LoadMoreRequested,
    CategoryToggled { id: CategoryId, checked: bool },
    PriceSelected(Option<PriceRange>),
    ResetRequested,
    Completed { tag: u64, outcome: Outcome },
}

/// Everything the browse screen shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    phase: Phase,
    mode: Mode,
    session: u64,
    generation: u64,
    categories: Vec<Category>,
    categories_fetch: Fetch,
    products: Vec<ProductSummary>,
    total: Option<u64>,
    total_fetch: Fetch,
    selection: FilterSelection,
    last_error: Option<FetchError>,
}

impl CatalogState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Tag of the current categories and total requests.
    #[must_use]
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Tag of the current product-list request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Why the categories could not be loaded, if their last fetch failed.
    #[must_use]
    pub fn categories_error(&self) -> Option<&str> {
        match &self.categories_fetch {
            Fetch::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn products(&self) -> &[ProductSummary] {
        &self.products
    }

    /// Total product count, once known.
    #[must_use]
    pub const fn total(&self) -> Option<u64> {
        self.total
    }

    #[must_use]
    pub const fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Whether the "Load more" control should be shown.
    #[must_use]
    pub fn load_more_visible(&self) -> bool {
        matches!(self.mode, Mode::Browsing { .. })
            && self
                .total
                .is_some_and(|total| (self.products.len() as u64) < total)
    }

    /// Whether a completion tagged `tag` still belongs to the current
    /// session (categories, total) or generation (product list).
    #[must_use]
    pub const fn is_current(&self, tag: u64, outcome: &Outcome) -> bool {
        match outcome {
            Outcome::Categories(_) | Outcome::Total(_) => tag == self.session,
            Outcome::Page { .. } | Outcome::Filter(_) => tag == self.generation,
        }
    }

    /// Discard everything and fetch categories, total and page 1.
    fn reload_all(&mut self) -> Vec<Effect> {
        let session = self.session + 1;
        let generation = self.generation + 1;
        *self = Self {
            session,
            generation,
            phase: Phase::LoadingInitial,
            categories_fetch: Fetch::Pending,
            total_fetch: Fetch::Pending,
            ..Self::default()
        };
        vec![
            Effect::FetchCategories { session },
            Effect::FetchTotal { session },
            Effect::FetchPage {
                generation,
                page: 1,
            },
        ]
    }

    /// Re-issue categories and total if they were never loaded or failed.
    fn retry_one_time_loads(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.categories_fetch.needs_retry() {
            self.categories_fetch = Fetch::Pending;
            effects.push(Effect::FetchCategories {
                session: self.session,
            });
        }
        if self.total_fetch.needs_retry() {
            self.total_fetch = Fetch::Pending;
            effects.push(Effect::FetchTotal {
                session: self.session,
            });
        }
        effects
    }

    /// Re-query after the selection changed.
    fn refetch_for_selection(&mut self) -> Vec<Effect> {
        self.generation += 1;
        let generation = self.generation;
        self.last_error = None;

        let mut effects = self.retry_one_time_loads();
        if self.selection.is_empty() {
            self.phase = Phase::LoadingInitial;
            self.mode = Mode::Browsing { cursor: 0 };
            effects.push(Effect::FetchPage {
                generation,
                page: 1,
            });
        } else {
            self.phase = Phase::Filtering;
            self.mode = Mode::Filtered;
            effects.push(Effect::FetchFilter {
                generation,
                request: self.selection.to_request(),
            });
        }
        effects
    }

    fn load_more(&mut self) -> Vec<Effect> {
        let Mode::Browsing { cursor } = self.mode else {
            return Vec::new();
        };
        if self.phase != Phase::Idle || !self.load_more_visible() {
            return Vec::new();
        }
        self.phase = Phase::LoadingMore;
        self.last_error = None;
        vec![Effect::FetchPage {
            generation: self.generation,
            page: cursor + 1,
        }]
    }

    fn record_failure(&mut self, kind: RequestKind, message: String) {
        self.last_error = Some(FetchError { kind, message });
    }

    fn complete(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Categories(Ok(categories)) => {
                self.categories = categories;
                self.categories_fetch = Fetch::Done;
            }
            Outcome::Categories(Err(message)) => {
                self.categories_fetch = Fetch::Failed(message.clone());
                self.record_failure(RequestKind::Categories, message);
            }
            Outcome::Total(Ok(total)) => {
                self.total = Some(total);
                self.total_fetch = Fetch::Done;
            }
            Outcome::Total(Err(message)) => {
                self.total_fetch = Fetch::Failed(message.clone());
                self.record_failure(RequestKind::TotalCount, message);
            }
            Outcome::Page { page, result } => {
                self.phase = Phase::Idle;
                match result {
                    Ok(products) => {
                        if page == 1 {
                            self.products = products;
                        } else {
                            self.products.extend(products);
                        }
                        self.mode = Mode::Browsing { cursor: page };
                    }
                    // Cursor stays put so the next request retries this page
                    Err(message) => self.record_failure(RequestKind::Page(page), message),
                }
            }
            Outcome::Filter(result) => {
                self.phase = Phase::Idle;
                match result {
                    Ok(products) => self.products = products,
                    Err(message) => self.record_failure(RequestKind::Filter, message),
                }
            }
        }
    }
}

/// Apply one event.
#[must_use]
pub fn transition(mut state: CatalogState, event: Event) -> (CatalogState, Vec<Effect>) {
    let effects = match event {
        Event::Mounted | Event::ResetRequested => state.reload_all(),
        Event::LoadMoreRequested => state.load_more(),
        Event::CategoryToggled { id, checked } => {
            state.selection.toggle_category(id, checked);
            state.refetch_for_selection()
        }
        Event::PriceSelected(range) => {
            state.selection.select_price(range);
            state.refetch_for_selection()
        }
        Event::Completed { tag, outcome } => {
            if state.is_current(tag, &outcome) {
                state.complete(outcome);
            }
            Vec::new()
        }
    };
    (state, effects)
}
