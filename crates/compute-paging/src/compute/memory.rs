use core::cmp::Ordering;
use std::{cell::RefCell, collections::HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

use crate::{
    errors::{Error, Result},
    paginate::{FilterOptions, Marked, Marker, PageQuery, SortDir},
    version::{ApiVersion, Feature, VersionInfo},
};

use super::{
    AbsoluteLimit, ComputeService, ExtraSpecs, Flavor, Server, ServerUsage, TenantUsage,
};

/// A call received by a [MemoryComputeService]
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    CurrentVersion,
    ListServers {
        version: ApiVersion,
        detailed: bool,
        search_opts: FilterOptions,
        page_query: Option<PageQuery>,
    },
    GetServer {
        version: ApiVersion,
        server_id: String,
    },
    ListFlavors {
        filter_options: FilterOptions,
        page_query: Option<PageQuery>,
    },
    GetFlavor {
        flavor_id: String,
    },
    GetFlavorExtraSpecs {
        flavor_id: String,
    },
    GetUsage {
        version: ApiVersion,
        tenant_id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        marker: Option<Marker>,
    },
    ListUsage {
        version: ApiVersion,
        start: NaiveDateTime,
        end: NaiveDateTime,
        detailed: bool,
        marker: Option<Marker>,
    },
    GetLimits {
        reserved: bool,
        tenant_id: Option<String>,
    },
}

/// A [ComputeService] keeping everything in memory
///
/// It sorts, filters and pages the way the compute API does, and records every
/// call it receives.
#[derive(Debug)]
pub struct MemoryComputeService {
    version_info: VersionInfo,
    servers: Vec<Server>,
    flavors: Vec<Flavor>,
    extra_specs: HashMap<String, ExtraSpecs>,
    server_usages: Vec<ServerUsage>,
    usage_page_size: usize,
    limits: Vec<AbsoluteLimit>,
    calls: RefCell<Vec<ServiceCall>>,
}

impl MemoryComputeService {
    /// Create an empty service reporting `max_version` as its current microversion
    pub fn new(max_version: ApiVersion) -> Self {
        Self {
            version_info: VersionInfo {
                id: "v2.1".to_owned(),
                status: "CURRENT".to_owned(),
                version: Some(max_version),
                min_version: Some(ApiVersion::new(2, 1)),
            },
            servers: Vec::new(),
            flavors: Vec::new(),
            extra_specs: HashMap::new(),
            server_usages: Vec::new(),
            usage_page_size: 1000,
            limits: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_servers(mut self, servers: Vec<Server>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_flavors(mut self, flavors: Vec<Flavor>) -> Self {
        self.flavors = flavors;
        self
    }

    pub fn with_extra_specs(mut self, flavor_id: &str, extra_specs: ExtraSpecs) -> Self {
        self.extra_specs.insert(flavor_id.to_owned(), extra_specs);
        self
    }

    /// Usage reports are split in pages of `page_size` servers when the
    /// microversion supports it
    pub fn with_server_usages(
        mut self,
        server_usages: Vec<ServerUsage>,
        page_size: usize,
    ) -> Self {
        self.server_usages = server_usages;
        self.usage_page_size = page_size;
        self
    }

    pub fn with_limits(mut self, limits: Vec<AbsoluteLimit>) -> Self {
        self.limits = limits;
        self
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: ServiceCall) {
        log::debug!("MemoryComputeService - {call:?}");
        self.calls.borrow_mut().push(call);
    }

    fn server_at_version(&self, server: &Server, version: ApiVersion) -> Server {
        let mut server = server.clone();
        if !version.supports(Feature::LockedAttribute) {
            server.locked = None;
        }
        if !version.supports(Feature::InstanceDescription) {
            server.description = None;
        }
        server
    }

    fn usage_page(
        &self,
        version: ApiVersion,
        tenant_id: Option<&str>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        marker: Option<&Marker>,
    ) -> Result<Vec<ServerUsage>> {
        let candidates = self
            .server_usages
            .iter()
            .filter(|su| tenant_id.map_or(true, |t| su.tenant_id == t))
            .filter(|su| {
                su.started_at.map_or(true, |s| s < end) && su.ended_at.map_or(true, |e| e > start)
            })
            .collect::<Vec<_>>();
        if !version.supports(Feature::UsagePagination) {
            return Ok(candidates.into_iter().cloned().collect());
        }
        let skip = match marker {
            Some(marker) => candidates
                .iter()
                .position(|su| su.instance_id == marker.0)
                .map(|p| p + 1)
                .ok_or_else(|| Error::UnknownMarker(marker.clone()))?,
            None => 0,
        };
        Ok(candidates
            .into_iter()
            .skip(skip)
            .take(self.usage_page_size)
            .cloned()
            .collect())
    }
}

fn tenant_usage(
    start: NaiveDateTime,
    end: NaiveDateTime,
    server_usages: Vec<ServerUsage>,
) -> TenantUsage {
    let Some(tenant_id) = server_usages.first().map(|su| su.tenant_id.clone()) else {
        // The API answers an empty object when there is nothing to report
        return TenantUsage::default();
    };
    let mut usage = TenantUsage {
        tenant_id,
        start: Some(start),
        stop: Some(end),
        ..Default::default()
    };
    for su in &server_usages {
        usage.total_hours += su.hours;
        usage.total_local_gb_usage += su.local_gb as f64 * su.hours;
        usage.total_memory_mb_usage += su.memory_mb as f64 * su.hours;
        usage.total_vcpus_usage += su.vcpus as f64 * su.hours;
    }
    usage.server_usages = server_usages;
    usage
}

fn sort_value<T: Serialize>(item: &T, sort_key: &str) -> Value {
    serde_json::to_value(item)
        .ok()
        .and_then(|mut v| v.get_mut(sort_key).map(Value::take))
        .unwrap_or(Value::Null)
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (a, b) => a.to_string().cmp(&b.to_string()),
    }
}

/// Sort by the requested key (ties broken by marker), skip up to the marker, truncate to the limit
///
/// Without a requested ordering, items keep the order they were stored in.
fn apply_page_query<T: Serialize + Marked>(
    items: Vec<T>,
    page_query: Option<&PageQuery>,
) -> Result<Vec<T>> {
    let Some(page_query) = page_query else {
        return Ok(items);
    };
    let mut keyed = items
        .into_iter()
        .map(|item| {
            let value = match &page_query.sort {
                Some(sort) => sort_value(&item, &sort.key),
                None => Value::Null,
            };
            (value, item.marker(), item)
        })
        .collect::<Vec<_>>();
    if let Some(sort) = &page_query.sort {
        keyed.sort_by(|(va, ma, _), (vb, mb, _)| cmp_values(va, vb).then_with(|| ma.cmp(mb)));
        if sort.dir == SortDir::Desc {
            keyed.reverse();
        }
    }
    let skip = match &page_query.marker {
        Some(marker) => keyed
            .iter()
            .position(|(_, m, _)| m == marker)
            .map(|p| p + 1)
            .ok_or_else(|| Error::UnknownMarker(marker.clone()))?,
        None => 0,
    };
    Ok(keyed
        .into_iter()
        .skip(skip)
        .take(page_query.limit)
        .map(|(_, _, item)| item)
        .collect())
}

fn server_matches(server: &Server, search_opts: &FilterOptions) -> bool {
    search_opts.iter().all(|(key, expected)| match key.as_str() {
        "project_id" | "tenant_id" => expected.as_str() == Some(server.tenant_id.as_str()),
        "name" => expected
            .as_str()
            .map_or(false, |name| server.name.contains(name)),
        "status" => expected
            .as_str()
            .map_or(false, |status| status.eq_ignore_ascii_case(&server.status)),
        _ => true,
    })
}

fn flavor_matches(flavor: &Flavor, filter_options: &FilterOptions) -> bool {
    filter_options
        .iter()
        .all(|(key, expected)| match (key.as_str(), expected) {
            ("is_public", Value::Bool(is_public)) => flavor.is_public == *is_public,
            ("min_ram", Value::Number(n)) => n.as_u64().map_or(false, |min| flavor.ram >= min),
            ("min_disk", Value::Number(n)) => n.as_u64().map_or(false, |min| flavor.disk >= min),
            _ => true,
        })
}

impl ComputeService for MemoryComputeService {
    type Error = Error;

    fn current_version(&self) -> Result<VersionInfo> {
        self.record(ServiceCall::CurrentVersion);
        Ok(self.version_info.clone())
    }

    fn list_servers(
        &self,
        version: ApiVersion,
        detailed: bool,
        search_opts: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Server>> {
        self.record(ServiceCall::ListServers {
            version,
            detailed,
            search_opts: search_opts.clone(),
            page_query: page_query.cloned(),
        });
        let servers = self
            .servers
            .iter()
            .filter(|s| server_matches(s, search_opts))
            .map(|s| self.server_at_version(s, version))
            .collect();
        apply_page_query(servers, page_query)
    }

    fn get_server(&self, version: ApiVersion, server_id: &str) -> Result<Server> {
        self.record(ServiceCall::GetServer {
            version,
            server_id: server_id.to_owned(),
        });
        self.servers
            .iter()
            .find(|s| s.id == server_id)
            .map(|s| self.server_at_version(s, version))
            .ok_or_else(|| Error::UnknownServer(server_id.to_owned()))
    }

    fn list_flavors(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Flavor>> {
        self.record(ServiceCall::ListFlavors {
            filter_options: filter_options.clone(),
            page_query: page_query.cloned(),
        });
        let flavors = self
            .flavors
            .iter()
            .filter(|f| flavor_matches(f, filter_options))
            .cloned()
            .collect();
        apply_page_query(flavors, page_query)
    }

    fn get_flavor(&self, flavor_id: &str) -> Result<Flavor> {
        self.record(ServiceCall::GetFlavor {
            flavor_id: flavor_id.to_owned(),
        });
        self.flavors
            .iter()
            .find(|f| f.id == flavor_id)
            .cloned()
            .ok_or_else(|| Error::UnknownFlavor(flavor_id.to_owned()))
    }

    fn get_flavor_extra_specs(&self, flavor_id: &str) -> Result<ExtraSpecs> {
        self.record(ServiceCall::GetFlavorExtraSpecs {
            flavor_id: flavor_id.to_owned(),
        });
        if !self.flavors.iter().any(|f| f.id == flavor_id) {
            return Err(Error::UnknownFlavor(flavor_id.to_owned()));
        }
        Ok(self.extra_specs.get(flavor_id).cloned().unwrap_or_default())
    }

    fn get_usage(
        &self,
        version: ApiVersion,
        tenant_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        marker: Option<&Marker>,
    ) -> Result<TenantUsage> {
        self.record(ServiceCall::GetUsage {
            version,
            tenant_id: tenant_id.to_owned(),
            start,
            end,
            marker: marker.cloned(),
        });
        let page = self.usage_page(version, Some(tenant_id), start, end, marker)?;
        Ok(tenant_usage(start, end, page))
    }

    fn list_usage(
        &self,
        version: ApiVersion,
        start: NaiveDateTime,
        end: NaiveDateTime,
        detailed: bool,
        marker: Option<&Marker>,
    ) -> Result<Vec<TenantUsage>> {
        self.record(ServiceCall::ListUsage {
            version,
            start,
            end,
            detailed,
            marker: marker.cloned(),
        });
        let page = self.usage_page(version, None, start, end, marker)?;

        // Group by tenant, in order of first appearance
        let mut grouped: Vec<Vec<ServerUsage>> = Vec::new();
        for su in page {
            match grouped
                .iter_mut()
                .find(|g| g.first().map_or(false, |first| first.tenant_id == su.tenant_id))
            {
                Some(group) => group.push(su),
                None => grouped.push(vec![su]),
            }
        }
        Ok(grouped
            .into_iter()
            .map(|group| {
                let mut usage = tenant_usage(start, end, group);
                if !detailed {
                    usage.server_usages.clear();
                }
                usage
            })
            .collect())
    }

    fn get_limits(&self, reserved: bool, tenant_id: Option<&str>) -> Result<Vec<AbsoluteLimit>> {
        self.record(ServiceCall::GetLimits {
            reserved,
            tenant_id: tenant_id.map(str::to_owned),
        });
        Ok(self.limits.clone())
    }
}
