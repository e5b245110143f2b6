use std::sync::OnceLock;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::{
    paginate::{FilterOptions, Marker, PageRequest, Paginated, Paginator},
    settings::PagingSettings,
    version::{ApiVersion, Feature},
};

use super::{
    usage::{merge_usage_list, usage_list_marker},
    AbsoluteLimits, ComputeService, Flavor, FlavorListing, Server, ServerListing, TenantUsage,
};

/// Dashboard-facing wrappers of a [ComputeService] for one user session
///
/// The microversion is negotiated with the server on first use and kept for
/// the lifetime of the session.
#[derive(Debug)]
pub struct ComputeApi<C> {
    service: C,
    paginator: Paginator,
    tenant_id: String,
    api_version: OnceLock<ApiVersion>,
}

impl<C: ComputeService> ComputeApi<C> {
    pub fn new(service: C, settings: PagingSettings, tenant_id: &str) -> Self {
        Self {
            service,
            paginator: Paginator::new(settings),
            tenant_id: tenant_id.to_owned(),
            api_version: OnceLock::new(),
        }
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    /// The tenant the session is scoped to
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The microversion negotiated for this session
    ///
    /// # Errors
    ///
    /// Returns the service error if the version could not be retrieved, or
    /// [crate::errors::Error::UnsupportedApiVersion] if no common version exists.
    pub fn api_version(&self) -> Result<ApiVersion, C::Error> {
        if let Some(version) = self.api_version.get() {
            return Ok(*version);
        }
        let version = self.service.current_version()?.negotiate()?;
        log::info!("Negotiated compute API version {version}");
        Ok(*self.api_version.get_or_init(|| version))
    }

    pub fn supports(&self, feature: Feature) -> Result<bool, C::Error> {
        Ok(self.api_version()?.supports(feature))
    }

    ////////////////////////
    //      Servers       //
    ////////////////////////

    /// List the servers of the session tenant, or of every tenant if
    /// `search_opts` holds `"all_tenants": true`
    ///
    /// Pages follow the compute service's own server ordering, only the
    /// marker and the limit are sent.
    pub fn server_list(
        &self,
        mut search_opts: FilterOptions,
        marker: Option<Marker>,
        paginate: bool,
    ) -> Result<Paginated<Server>, C::Error> {
        let version = self.api_version()?;
        let all_tenants = search_opts
            .remove("all_tenants")
            .map_or(false, |v| is_truthy(&v));
        if all_tenants {
            search_opts.insert("all_tenants".to_owned(), Value::Bool(true));
        } else {
            search_opts.insert("project_id".to_owned(), Value::from(self.tenant_id.as_str()));
        }
        log::debug!("ComputeApi::server_list - search_opts={search_opts:?}");

        let request = PageRequest::new()
            .with_filter_options(search_opts)
            .with_marker(marker)
            .unsorted()
            .paginate(paginate);
        self.paginator
            .list_page(&ServerListing::new(&self.service, version, true), request)
    }

    pub fn server_get(&self, server_id: &str) -> Result<Server, C::Error> {
        let version = self.api_version()?;
        self.service.get_server(version, server_id)
    }

    ////////////////////////
    //      Flavors       //
    ////////////////////////

    /// List every flavor, `is_public` None meaning both public and private ones
    pub fn flavor_list(&self, is_public: Option<bool>) -> Result<Vec<Flavor>, C::Error> {
        self.service
            .list_flavors(&flavor_filter(is_public), None)
    }

    pub fn flavor_list_paged(
        &self,
        is_public: Option<bool>,
        get_extras: bool,
        marker: Option<Marker>,
        paginate: bool,
        reversed_order: bool,
    ) -> Result<Paginated<Flavor>, C::Error> {
        let request = PageRequest::new()
            .with_filter_options(flavor_filter(is_public))
            .with_marker(marker)
            .reversed(reversed_order)
            .paginate(paginate);
        let mut flavors = self
            .paginator
            .list_page(&FlavorListing::new(&self.service), request)?;
        if get_extras {
            for flavor in flavors.page.iter_mut() {
                self.fill_extra_specs(flavor)?;
            }
        }
        Ok(flavors)
    }

    pub fn flavor_get(&self, flavor_id: &str, get_extras: bool) -> Result<Flavor, C::Error> {
        let mut flavor = self.service.get_flavor(flavor_id)?;
        if get_extras {
            self.fill_extra_specs(&mut flavor)?;
        }
        Ok(flavor)
    }

    fn fill_extra_specs(&self, flavor: &mut Flavor) -> Result<(), C::Error> {
        flavor.extra_specs = Some(self.service.get_flavor_extra_specs(&flavor.id)?);
        Ok(())
    }

    ////////////////////////
    //       Usage        //
    ////////////////////////

    /// Usage of a tenant over a period
    ///
    /// When the server paginates usage reports, every page is fetched and merged.
    pub fn usage_get(
        &self,
        tenant_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TenantUsage, C::Error> {
        let version = self.api_version()?;
        let mut usage = self.service.get_usage(version, tenant_id, start, end, None)?;
        if version.supports(Feature::UsagePagination) {
            let mut marker = usage.marker();
            while let Some(m) = marker {
                let next = self
                    .service
                    .get_usage(version, tenant_id, start, end, Some(&m))?;
                marker = next.marker();
                if marker.is_some() {
                    usage.merge(next);
                }
            }
        }
        Ok(usage)
    }

    /// Usage of every tenant over a period
    ///
    /// When the server paginates usage reports, every page is fetched and the
    /// usages of a same tenant are merged.
    pub fn usage_list(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TenantUsage>, C::Error> {
        let version = self.api_version()?;
        let mut usages = self.service.list_usage(version, start, end, true, None)?;
        if version.supports(Feature::UsagePagination) {
            let mut marker = usage_list_marker(&usages);
            while let Some(m) = marker {
                let next = self
                    .service
                    .list_usage(version, start, end, true, Some(&m))?;
                marker = usage_list_marker(&next);
                merge_usage_list(&mut usages, next);
            }
        }
        Ok(usages)
    }

    ////////////////////////
    //       Limits       //
    ////////////////////////

    pub fn tenant_absolute_limits(
        &self,
        reserved: bool,
        tenant_id: Option<&str>,
    ) -> Result<AbsoluteLimits, C::Error> {
        Ok(self
            .service
            .get_limits(reserved, tenant_id)?
            .into_iter()
            .collect())
    }
}

fn flavor_filter(is_public: Option<bool>) -> FilterOptions {
    let mut filter_options = FilterOptions::new();
    filter_options.insert(
        "is_public".to_owned(),
        match is_public {
            Some(is_public) => Value::Bool(is_public),
            None => Value::from("none"),
        },
    );
    filter_options
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"),
        Value::Number(n) => n.as_i64().map_or(false, |n| n != 0),
        _ => false,
    }
}
