//! List view state: one reducer over [`QueryEvent`]s per screen, plus the per-screen
//! profile that decides defaults and how an overflowing page index is corrected.

use crate::pipeline::{page_count, paginate, Listable, QueryState, ResultPage, SortKey};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when the current page index points past the filtered population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Leave the empty page as is.
    Keep,
    /// Move to the last page that has items.
    LastPage,
    /// Restart at the first page.
    FirstPage,
}

const PAGE_SIZE_OPTIONS: [usize; 3] = [12, 24, 36];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListProfile {
    pub default_sort: SortKey,
    pub page_size: usize,
    /// Sizes a page event may select; always contains `page_size`. Ascending.
    pub page_size_options: Vec<usize>,
    /// Whether a sort event moves back to page 0.
    pub reset_on_sort: bool,
    pub overflow: OverflowPolicy,
}

impl ListProfile {
    pub fn new(default_sort: SortKey, page_size: usize, overflow: OverflowPolicy) -> Self {
        let page_size = page_size.max(1);
        let mut page_size_options = PAGE_SIZE_OPTIONS.to_vec();
        if !page_size_options.contains(&page_size) {
            page_size_options.push(page_size);
            page_size_options.sort_unstable();
        }
        Self {
            default_sort,
            page_size,
            page_size_options,
            reset_on_sort: true,
            overflow,
        }
    }

    /// The allowed size closest to `requested`; ties go to the smaller size.
    pub fn snap_page_size(&self, requested: usize) -> usize {
        self.page_size_options
            .iter()
            .copied()
            .min_by_key(|size| size.abs_diff(requested))
            .unwrap_or(self.page_size)
    }

    pub fn initial_state(&self) -> QueryState {
        QueryState::new(self.default_sort, self.page_size)
    }

    /// Parse a sort spelling, falling back to this profile's default.
    pub fn sort_or_default(&self, raw: Option<&str>) -> SortKey {
        raw.and_then(|s| s.parse().ok()).unwrap_or(self.default_sort)
    }
}

/// The list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    /// Public API characters.
    Characters,
    /// First-party backend characters.
    Personajes,
    Sagas,
    Transformations,
}

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Characters,
        Screen::Personajes,
        Screen::Sagas,
        Screen::Transformations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Characters => "characters",
            Screen::Personajes => "personajes",
            Screen::Sagas => "sagas",
            Screen::Transformations => "transformations",
        }
    }

    pub fn profile(&self, page_size: usize) -> ListProfile {
        match self {
            Screen::Characters => ListProfile::new(SortKey::NameAsc, page_size, OverflowPolicy::Keep),
            Screen::Personajes => ListProfile::new(SortKey::NameAsc, page_size, OverflowPolicy::Keep),
            Screen::Sagas => ListProfile::new(SortKey::Natural, page_size, OverflowPolicy::LastPage),
            Screen::Transformations => {
                ListProfile::new(SortKey::Natural, page_size, OverflowPolicy::FirstPage)
            }
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown screen: {}", s))
    }
}

/// Case-insensitive, like [`FromStr`].
impl<'de> Deserialize<'de> for Screen {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A user interaction carrying the field it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryEvent {
    Search { text: String },
    Group { group: Option<String> },
    Sort { key: SortKey },
    Page { index: usize, size: usize },
    Reset,
}

/// Query state of one screen plus its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    profile: ListProfile,
    state: QueryState,
}

impl ListView {
    pub fn new(profile: ListProfile) -> Self {
        let state = profile.initial_state();
        Self { profile, state }
    }

    pub fn with_state(profile: ListProfile, mut state: QueryState) -> Self {
        state.page_size = state.page_size.max(1);
        Self { profile, state }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Reduce one event into the query state. Returns whether anything changed.
    ///
    /// Search, group and sort changes restart at page 0; page events leave the
    /// filter and sort untouched.
    pub fn apply(&mut self, event: QueryEvent) -> bool {
        let before = self.state.clone();
        match event {
            QueryEvent::Search { text } => {
                let text = text.trim().to_string();
                if text != self.state.query {
                    self.state.query = text;
                    self.state.page_index = 0;
                }
            }
            QueryEvent::Group { group } => {
                let group = group.map(|g| g.trim().to_string()).filter(|g| !g.is_empty());
                if group != self.state.group {
                    self.state.group = group;
                    self.state.page_index = 0;
                }
            }
            QueryEvent::Sort { key } => {
                self.state.sort = key;
                if self.profile.reset_on_sort {
                    self.state.page_index = 0;
                }
            }
            QueryEvent::Page { index, size } => {
                self.state.page_index = index;
                self.state.page_size = self.profile.snap_page_size(size);
            }
            QueryEvent::Reset => self.state = self.profile.initial_state(),
        }
        let changed = before != self.state;
        if changed {
            tracing::debug!(
                query = %self.state.query,
                sort = self.state.sort.as_str(),
                page = self.state.page_index,
                size = self.state.page_size,
                "list view updated"
            );
        }
        changed
    }

    /// Run the pipeline; when the page overflowed, correct the index per profile
    /// and run it again.
    pub fn render<'a, T: Listable>(&mut self, records: &'a [T]) -> ResultPage<&'a T> {
        let page = paginate(records, &self.state);
        if !page.overflowed() {
            return page;
        }
        let corrected = match self.profile.overflow {
            OverflowPolicy::Keep => return page,
            OverflowPolicy::LastPage => page_count(page.total_count, self.state.page_size).saturating_sub(1),
            OverflowPolicy::FirstPage => 0,
        };
        self.state.page_index = corrected;
        paginate(records, &self.state)
    }
}
