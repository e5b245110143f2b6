use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::paginate::Marker;

/// Usage of a single server over the requested period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerUsage {
    pub instance_id: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub memory_mb: u64,
    #[serde(default)]
    pub local_gb: u64,
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    /// None while the server is still running
    #[serde(default)]
    pub ended_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub uptime: u64,
}

impl ServerUsage {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// Usage of a tenant over the requested period
///
/// A paginated usage report returns one [TenantUsage] per page, the
/// `total_*` fields only cover the servers of that page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantUsage {
    pub tenant_id: String,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    pub total_hours: f64,
    pub total_local_gb_usage: f64,
    pub total_memory_mb_usage: f64,
    pub total_vcpus_usage: f64,
    pub server_usages: Vec<ServerUsage>,
}

impl TenantUsage {
    /// Marker of the next usage page: the last server of this one
    pub fn marker(&self) -> Option<Marker> {
        self.server_usages
            .last()
            .map(|su| Marker(su.instance_id.clone()))
    }

    /// Fold the next page of the same usage report into this one
    pub fn merge(&mut self, next: TenantUsage) {
        self.total_hours += next.total_hours;
        self.total_local_gb_usage += next.total_local_gb_usage;
        self.total_memory_mb_usage += next.total_memory_mb_usage;
        self.total_vcpus_usage += next.total_vcpus_usage;
        self.server_usages.extend(next.server_usages);
    }

    /// Aggregated figures as displayed on the usage overview
    pub fn summary(&self) -> UsageSummary {
        let active = self.server_usages.iter().filter(|su| su.is_active());
        let (instances, vcpus, memory_mb, local_gb) =
            active.fold((0, 0, 0, 0), |(i, v, m, l), su| {
                (i + 1, v + su.vcpus as u64, m + su.memory_mb, l + su.local_gb)
            });
        UsageSummary {
            instances,
            vcpus,
            vcpu_hours: self.total_vcpus_usage,
            memory_mb,
            memory_mb_hours: self.total_memory_mb_usage,
            local_gb,
            disk_gb_hours: self.total_local_gb_usage,
        }
    }
}

/// Marker of the next page of a usage list: the last server of the last tenant
pub fn usage_list_marker(usages: &[TenantUsage]) -> Option<Marker> {
    usages.last().and_then(TenantUsage::marker)
}

/// Fold the next page of a usage list into `usages`
///
/// A tenant may be split across pages: its usages are merged, other tenants
/// are appended in the order they come.
pub fn merge_usage_list(usages: &mut Vec<TenantUsage>, next_page: Vec<TenantUsage>) {
    for next in next_page {
        match usages.iter_mut().find(|u| u.tenant_id == next.tenant_id) {
            Some(usage) => usage.merge(next),
            None => usages.push(next),
        }
    }
}

/// Figures of the currently running servers plus the period totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub instances: u64,
    pub vcpus: u64,
    pub vcpu_hours: f64,
    pub memory_mb: u64,
    pub memory_mb_hours: f64,
    pub local_gb: u64,
    pub disk_gb_hours: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_usage(instance_id: &str, tenant_id: &str, active: bool) -> ServerUsage {
        let started_at =
            NaiveDateTime::parse_from_str("2012-10-08T20:10:44", "%Y-%m-%dT%H:%M:%S").unwrap();
        ServerUsage {
            instance_id: instance_id.to_owned(),
            tenant_id: tenant_id.to_owned(),
            name: format!("server {instance_id}"),
            hours: 10.0,
            memory_mb: 512,
            local_gb: 1,
            vcpus: 2,
            flavor: "m1.tiny".to_owned(),
            state: if active { "active" } else { "terminated" }.to_owned(),
            started_at: Some(started_at),
            ended_at: if active { None } else { Some(started_at) },
            uptime: 36000,
        }
    }

    fn tenant_usage(tenant_id: &str, instances: &[&str]) -> TenantUsage {
        TenantUsage {
            tenant_id: tenant_id.to_owned(),
            total_hours: 10.0 * instances.len() as f64,
            total_local_gb_usage: 10.0 * instances.len() as f64,
            total_memory_mb_usage: 5120.0 * instances.len() as f64,
            total_vcpus_usage: 20.0 * instances.len() as f64,
            server_usages: instances
                .iter()
                .map(|id| server_usage(id, tenant_id, true))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_page_has_no_marker() {
        let usage: TenantUsage = serde_json::from_str("{}").unwrap();
        assert_eq!(usage.marker(), None);
        assert_eq!(usage_list_marker(&[]), None);
    }

    #[test]
    fn marker_is_last_instance() {
        let usage = tenant_usage("t1", &["a", "b"]);
        assert_eq!(usage.marker(), Some(Marker::from("b")));
        assert_eq!(
            usage_list_marker(&[tenant_usage("t0", &["z"]), usage]),
            Some(Marker::from("b"))
        );
    }

    #[test]
    fn merge_adds_totals() {
        let mut usage = tenant_usage("t1", &["a", "b"]);
        usage.merge(tenant_usage("t1", &["c"]));
        assert_eq!(usage.server_usages.len(), 3);
        assert_eq!(usage.total_hours, 30.0);
        assert_eq!(usage.total_vcpus_usage, 60.0);
        assert_eq!(usage.marker(), Some(Marker::from("c")));
    }

    #[test]
    fn merge_list_per_tenant() {
        let mut usages = vec![tenant_usage("t1", &["a"]), tenant_usage("t2", &["b"])];
        merge_usage_list(
            &mut usages,
            vec![tenant_usage("t2", &["c"]), tenant_usage("t3", &["d"])],
        );
        assert_eq!(usages.len(), 3);
        assert_eq!(usages[1].tenant_id, "t2");
        assert_eq!(usages[1].server_usages.len(), 2);
        assert_eq!(usages[2].tenant_id, "t3");
    }

    #[test]
    fn summary_only_counts_running_servers() {
        let mut usage = tenant_usage("t1", &["a", "b"]);
        usage.server_usages.push(server_usage("c", "t1", false));
        let summary = usage.summary();
        assert_eq!(summary.instances, 2);
        assert_eq!(summary.vcpus, 4);
        assert_eq!(summary.memory_mb, 1024);
        assert_eq!(summary.local_gb, 2);
        assert_eq!(summary.vcpu_hours, 40.0);
        assert_eq!(summary.disk_gb_hours, 20.0);
    }
}
