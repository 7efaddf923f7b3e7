//! List pipeline: search → filter → sort → paginate over an in-memory collection.
//!
//! Pure and synchronous. Malformed sortable fields never abort a sort; they fall to a
//! fixed end of the ordering instead.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::str::FromStr;

/// Normalized numeric sort value. `None` is the lowest possible value.
pub type Metric = Option<u128>;

/// An item of a list view.
pub trait Listable {
    /// Display name; used by the text filter and name sorts.
    fn display_name(&self) -> &str;

    /// Secondary grouping field (race, series). Searched by the text filter and
    /// matched exactly by the group filter.
    fn group_label(&self) -> Option<&str> {
        None
    }

    /// Value used by the numeric sorts.
    fn metric(&self) -> Metric {
        None
    }
}

impl<T: Listable + ?Sized> Listable for &T {
    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn group_label(&self) -> Option<&str> {
        (**self).group_label()
    }

    fn metric(&self) -> Metric {
        (**self).metric()
    }
}

/// Sort selector. Accepts the spellings used by every screen's selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[serde(alias = "nombre_asc", alias = "az")]
    NameAsc,
    #[serde(alias = "nombre_desc", alias = "za")]
    NameDesc,
    #[serde(alias = "ki_asc")]
    PowerAsc,
    #[serde(alias = "ki_desc")]
    PowerDesc,
    /// Input order, no reordering.
    #[default]
    #[serde(alias = "chrono")]
    Natural,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::PowerAsc => "power_asc",
            SortKey::PowerDesc => "power_desc",
            SortKey::Natural => "natural",
        }
    }

    /// `ordering` parameter understood by the first-party backend.
    pub fn backend_ordering(&self) -> Option<&'static str> {
        match self {
            SortKey::NameAsc => Some("nombre"),
            SortKey::NameDesc => Some("-nombre"),
            SortKey::PowerAsc => Some("base_ki"),
            SortKey::PowerDesc => Some("-base_ki"),
            SortKey::Natural => None,
        }
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name_asc" | "nombre_asc" | "az" => Ok(SortKey::NameAsc),
            "name_desc" | "nombre_desc" | "za" => Ok(SortKey::NameDesc),
            "power_asc" | "ki_asc" => Ok(SortKey::PowerAsc),
            "power_desc" | "ki_desc" => Ok(SortKey::PowerDesc),
            "natural" | "chrono" => Ok(SortKey::Natural),
            _ => Err(()),
        }
    }
}

/// User-controlled filter/sort/page parameters for one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    #[serde(default)]
    pub query: String,
    /// Exact match on [`Listable::group_label`].
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub page_index: usize,
    pub page_size: usize,
}

impl QueryState {
    pub fn new(sort: SortKey, page_size: usize) -> Self {
        Self {
            query: String::new(),
            group: None,
            sort,
            page_index: 0,
            page_size: page_size.max(1),
        }
    }
}

/// Materialized slice plus the metadata a pager needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    /// Size of the filtered population, before slicing.
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub page_count: usize,
}

impl<T> ResultPage<T> {
    pub fn empty(page_index: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_index,
            page_size: page_size.max(1),
            page_count: 0,
        }
    }

    /// True when `page_index` points past the filtered population.
    pub fn overflowed(&self) -> bool {
        self.items.is_empty() && self.total_count > 0
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ResultPage<U> {
        ResultPage {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_index: self.page_index,
            page_size: self.page_size,
            page_count: self.page_count,
        }
    }
}

impl<T: Clone> ResultPage<&T> {
    pub fn cloned(self) -> ResultPage<T> {
        self.map(Clone::clone)
    }
}

/// Number of pages needed for `total` items.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Strip every non-digit and parse the rest. No digits → `None`; overflow saturates.
///
/// `"3,000,000,000"` → `Some(3_000_000_000)`, `"unknown"` → `None`.
pub fn normalize_metric(raw: &str) -> Metric {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse::<u128>().unwrap_or(u128::MAX))
}

/// Collation key for name sorts: case and accent insensitive, `ñ` sorts after `n`.
pub fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'ā' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' | 'ē' => key.push('e'),
            'í' | 'ì' | 'î' | 'ï' | 'ī' => key.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ō' => key.push('o'),
            'ú' | 'ù' | 'û' | 'ü' | 'ū' => key.push('u'),
            'ç' => key.push('c'),
            'ñ' => {
                key.push('n');
                key.push(char::MAX);
            }
            other => key.push(other),
        }
    }
    key
}

/// Locale-aware name comparison built on [`collation_key`].
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

fn matches<T: Listable>(record: &T, needle: &str, group: Option<&str>) -> bool {
    if let Some(group) = group {
        if record.group_label() != Some(group) {
            return false;
        }
    }
    if needle.is_empty() {
        return true;
    }
    record.display_name().to_lowercase().contains(needle)
        || record
            .group_label()
            .map(|g| g.to_lowercase().contains(needle))
            .unwrap_or(false)
}

/// Stable sort of `rows` by `key`; `Natural` leaves the slice untouched.
pub fn sort_records<T: Listable>(rows: &mut [T], key: SortKey) {
    match key {
        SortKey::NameAsc => rows.sort_by_cached_key(|r| collation_key(r.display_name())),
        SortKey::NameDesc => rows.sort_by_cached_key(|r| Reverse(collation_key(r.display_name()))),
        SortKey::PowerAsc => rows.sort_by_cached_key(|r| r.metric()),
        SortKey::PowerDesc => rows.sort_by_cached_key(|r| Reverse(r.metric())),
        SortKey::Natural => {}
    }
}

/// Filter, sort and slice `records` for `query`.
///
/// An out-of-range `page_index` yields an empty slice with the real `total_count`;
/// clamping is the caller's job (see `view::ListView`).
pub fn paginate<'a, T: Listable>(records: &'a [T], query: &QueryState) -> ResultPage<&'a T> {
    let needle = query.query.trim().to_lowercase();
    let group = query.group.as_deref().map(str::trim).filter(|g| !g.is_empty());

    let mut rows: Vec<&'a T> = records
        .iter()
        .filter(|r| matches(*r, &needle, group))
        .collect();
    sort_records(&mut rows, query.sort);

    let page_size = query.page_size.max(1);
    let total_count = rows.len();
    let start = query.page_index.saturating_mul(page_size);
    let items: Vec<&'a T> = rows.into_iter().skip(start).take(page_size).collect();

    ResultPage {
        items,
        total_count,
        page_index: query.page_index,
        page_size,
        page_count: page_count(total_count, page_size),
    }
}
