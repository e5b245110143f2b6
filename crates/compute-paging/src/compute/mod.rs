pub mod api;
pub mod limits;
pub mod memory;
pub mod types;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_data;

use chrono::NaiveDateTime;

use crate::{
    errors::Error,
    paginate::{FilterOptions, ListingService, Marker, PageQuery},
    version::{ApiVersion, VersionInfo},
};

pub use api::ComputeApi;
pub use limits::{AbsoluteLimit, AbsoluteLimits, LimitValue};
pub use types::{ExtraSpecs, Flavor, FlavorRef, ImageRef, Server};
pub use usage::{ServerUsage, TenantUsage, UsageSummary};

/// Contract required from the compute service client
///
/// Calls whose behaviour depends on the microversion receive the version
/// negotiated for the session. Implementations return the items in the order
/// requested by the [PageQuery] and the full result set when none is given.
pub trait ComputeService {
    type Error: From<Error>;

    /// Retrieves the microversions supported by the server
    fn current_version(&self) -> Result<VersionInfo, Self::Error>;

    fn list_servers(
        &self,
        version: ApiVersion,
        detailed: bool,
        search_opts: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Server>, Self::Error>;

    fn get_server(&self, version: ApiVersion, server_id: &str) -> Result<Server, Self::Error>;

    fn list_flavors(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Flavor>, Self::Error>;

    fn get_flavor(&self, flavor_id: &str) -> Result<Flavor, Self::Error>;

    fn get_flavor_extra_specs(&self, flavor_id: &str) -> Result<ExtraSpecs, Self::Error>;

    /// Retrieves one page of the usage of a tenant
    ///
    /// The `marker` is only honoured by servers supporting
    /// [Feature::UsagePagination](crate::version::Feature::UsagePagination).
    fn get_usage(
        &self,
        version: ApiVersion,
        tenant_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        marker: Option<&Marker>,
    ) -> Result<TenantUsage, Self::Error>;

    /// Retrieves one page of the usage of every tenant
    fn list_usage(
        &self,
        version: ApiVersion,
        start: NaiveDateTime,
        end: NaiveDateTime,
        detailed: bool,
        marker: Option<&Marker>,
    ) -> Result<Vec<TenantUsage>, Self::Error>;

    fn get_limits(
        &self,
        reserved: bool,
        tenant_id: Option<&str>,
    ) -> Result<Vec<AbsoluteLimit>, Self::Error>;
}

/// [ListingService] view of the server listing at a given microversion
#[derive(Debug)]
pub struct ServerListing<'a, C> {
    service: &'a C,
    version: ApiVersion,
    detailed: bool,
}
impl<'a, C: ComputeService> ServerListing<'a, C> {
    pub fn new(service: &'a C, version: ApiVersion, detailed: bool) -> Self {
        Self {
            service,
            version,
            detailed,
        }
    }
}
impl<C: ComputeService> ListingService for ServerListing<'_, C> {
    type Item = Server;
    type Error = C::Error;

    fn list(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Server>, Self::Error> {
        self.service
            .list_servers(self.version, self.detailed, filter_options, page_query)
    }
}

/// [ListingService] view of the flavor listing
#[derive(Debug)]
pub struct FlavorListing<'a, C> {
    service: &'a C,
}
impl<'a, C: ComputeService> FlavorListing<'a, C> {
    pub fn new(service: &'a C) -> Self {
        Self { service }
    }
}
impl<C: ComputeService> ListingService for FlavorListing<'_, C> {
    type Item = Flavor;
    type Error = C::Error;

    fn list(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Flavor>, Self::Error> {
        self.service.list_flavors(filter_options, page_query)
    }
}
