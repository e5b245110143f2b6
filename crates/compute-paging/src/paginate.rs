use core::{fmt::Display, num::NonZeroUsize, ops::Deref};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::PagingSettings;

/// Options forwarded verbatim to the listing service (tenant scoping, visibility flags...)
pub type FilterOptions = BTreeMap<String, serde_json::Value>;

/// Opaque identifier of the last item of a previously returned page
///
/// The listing service resumes right after the item carrying this identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(pub String);
impl Display for Marker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}
impl From<&str> for Marker {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
impl From<String> for Marker {
    fn from(value: String) -> Self {
        Self(value)
    }
}
impl Deref for Marker {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Items that can be used as a pagination [Marker]
pub trait Marked {
    fn marker(&self) -> Marker;
}

/// Direction of a listing, ascending unless reversed to page backward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}
impl SortDir {
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}
impl Display for SortDir {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordering asked to a [ListingService]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub key: String,
    pub dir: SortDir,
}

/// The paging part of a request sent to a [ListingService]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Resume after the item with this identifier, start from the beginning if None
    pub marker: Option<Marker>,
    /// Maximum number of items the service may return
    pub limit: usize,
    /// None keeps the service's own ordering
    pub sort: Option<SortOrder>,
}

/// Contract required from the external service that actually stores the items
///
/// Implementations must return the items in the order requested by the [PageQuery].
/// When no [PageQuery] is given, the full unpaginated result set is expected.
pub trait ListingService {
    type Item;
    type Error;

    fn list(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Self::Item>, Self::Error>;
}

impl<S: ListingService + ?Sized> ListingService for &S {
    type Item = S::Item;
    type Error = S::Error;

    fn list(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Self::Item>, Self::Error> {
        (**self).list(filter_options, page_query)
    }
}

/// A caller request for one page of items
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub filter_options: FilterOptions,
    /// Page size, the [Paginator] default is used if None
    pub limit: Option<NonZeroUsize>,
    pub marker: Option<Marker>,
    /// Fetch in the opposite of `sort_dir`, used to page backward
    pub reversed_order: bool,
    /// When false, marker and limit are ignored and every item is returned
    pub paginate: bool,
    /// When false, no ordering is asked and the service's own one applies
    pub sorted: bool,
    /// Sort key, the [Paginator] default is used if None
    pub sort_key: Option<String>,
    /// Direction of a non-reversed request
    pub sort_dir: SortDir,
}
impl Default for PageRequest {
    fn default() -> Self {
        Self {
            filter_options: FilterOptions::new(),
            limit: None,
            marker: None,
            reversed_order: false,
            paginate: true,
            sorted: true,
            sort_key: None,
            sort_dir: SortDir::Asc,
        }
    }
}
impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_filter<K: Into<String>, V: Into<serde_json::Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.filter_options.insert(key.into(), value.into());
        self
    }
    pub fn with_filter_options(mut self, filter_options: FilterOptions) -> Self {
        self.filter_options = filter_options;
        self
    }
    pub fn with_limit(mut self, limit: NonZeroUsize) -> Self {
        self.limit = Some(limit);
        self
    }
    pub fn with_marker(mut self, marker: Option<Marker>) -> Self {
        self.marker = marker;
        self
    }
    pub fn with_sort(mut self, sort_key: &str, sort_dir: SortDir) -> Self {
        self.sorted = true;
        self.sort_key = Some(sort_key.to_owned());
        self.sort_dir = sort_dir;
        self
    }
    /// Leave the ordering to the service, `reversed_order` then has no effect
    pub fn unsorted(mut self) -> Self {
        self.sorted = false;
        self
    }
    pub fn reversed(mut self, reversed_order: bool) -> Self {
        self.reversed_order = reversed_order;
        self
    }
    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }
}

/// A page of results along with the flags needed to render pagination controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// The items in this page, never more than the requested limit
    pub page: Vec<T>,
    /// More items exist after this page
    pub has_more: bool,
    /// A previous page exists
    pub has_prev: bool,
}
impl<T> Paginated<T> {
    /// Build a page out of a "peek ahead" result set fetched with `limit + 1`
    pub fn from_lookahead(mut items: Vec<T>, limit: NonZeroUsize, has_marker: bool) -> Self {
        let has_more = items.len() > limit.get();
        items.truncate(limit.get());
        Self {
            page: items,
            has_more,
            has_prev: has_marker,
        }
    }

    /// A page holding everything, no neighbour pages
    pub fn unpaginated(items: Vec<T>) -> Self {
        Self {
            page: items,
            has_more: false,
            has_prev: false,
        }
    }

    /// Returns true if no more items are available after this page
    pub fn is_last_page(&self) -> bool {
        !self.has_more
    }

    pub fn into_parts(self) -> (Vec<T>, bool, bool) {
        (self.page, self.has_more, self.has_prev)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            page: self.page.into_iter().map(f).collect(),
            has_more: self.has_more,
            has_prev: self.has_prev,
        }
    }
}
impl<T: Marked> Paginated<T> {
    /// Marker to request the page following this one, in the direction it was fetched
    pub fn next_marker(&self) -> Option<Marker> {
        if self.has_more {
            self.page.last().map(Marked::marker)
        } else {
            None
        }
    }

    /// Marker to request the page preceding this one
    ///
    /// To be used with the opposite `reversed_order` of the request that returned
    /// this page: the page before a forward (ascending) page is fetched descending.
    pub fn prev_marker(&self) -> Option<Marker> {
        if self.has_prev {
            self.page.first().map(Marked::marker)
        } else {
            None
        }
    }
}
impl<T> Deref for Paginated<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}

/// Turns page requests into "limit + 1" queries against a [ListingService]
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    settings: PagingSettings,
}

impl Paginator {
    pub fn new(settings: PagingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PagingSettings {
        &self.settings
    }

    /// Fetch one page of items
    ///
    /// The service is asked for one more item than the page size: receiving it
    /// tells that a next page exists without any count query. Items are returned
    /// in the order they were fetched, a reversed request is NOT put back in the
    /// non-reversed order.
    ///
    /// When `request.paginate` is false, the service is asked for everything and
    /// the whole result set is returned with both flags unset.
    ///
    /// # Errors
    ///
    /// Errors of the service are returned untouched.
    pub fn list_page<S: ListingService>(
        &self,
        service: &S,
        request: PageRequest,
    ) -> Result<Paginated<S::Item>, S::Error> {
        let PageRequest {
            filter_options,
            limit,
            marker,
            reversed_order,
            paginate,
            sorted,
            sort_key,
            sort_dir,
        } = request;

        if !paginate {
            log::debug!("Paginator::list_page - unpaginated listing");
            return Ok(Paginated::unpaginated(service.list(&filter_options, None)?));
        }
        if reversed_order && !sorted {
            log::warn!("Paginator::list_page - reversed_order ignored for an unsorted listing");
        }

        let limit = limit.unwrap_or(self.settings.page_size);
        let has_marker = marker.is_some();
        let page_query = PageQuery {
            marker,
            limit: limit.get() + 1,
            sort: sorted.then(|| SortOrder {
                key: sort_key.unwrap_or_else(|| self.settings.sort_key.clone()),
                dir: if reversed_order {
                    sort_dir.reverse()
                } else {
                    sort_dir
                },
            }),
        };
        log::debug!("Paginator::list_page - page_query={page_query:?}");

        let items = service.list(&filter_options, Some(&page_query))?;
        log::debug!(
            "Paginator::list_page - received {} items for a page size of {limit}",
            items.len()
        );
        Ok(Paginated::from_lookahead(items, limit, has_marker))
    }
}
