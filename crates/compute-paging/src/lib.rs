//! Marker based pagination and microversion negotiation on top of a compute service API
//!
//! The [Paginator] asks a [ListingService] for one more item than the page size
//! so it can tell whether a next page exists without any count query. The
//! [ComputeApi] wraps a [ComputeService] client for a user session: it
//! negotiates the microversion once, scopes server listings to the session
//! tenant, pages servers and flavors through the [Paginator], merges
//! paginated usage reports and normalizes absolute limits.

pub mod compute;
pub mod errors;
pub mod paginate;
pub mod settings;
pub mod version;

pub use compute::{ComputeApi, ComputeService};
pub use errors::Error;
pub use paginate::{
    FilterOptions, ListingService, Marked, Marker, PageQuery, PageRequest, Paginated, Paginator,
    SortDir, SortOrder,
};
pub use settings::PagingSettings;
pub use version::{ApiVersion, Feature, VersionInfo};
