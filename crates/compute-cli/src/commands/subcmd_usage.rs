use core::any::Any;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use compute_api_client::ComputeServiceClient;
use compute_paging::{
    compute::{TenantUsage, UsageSummary},
    ComputeApi,
};
use serde::Serialize;

use crate::errors::Result;

#[derive(Debug, Clone, clap::Args)]
pub struct Period {
    /// Start of the period. Defaults to the first day of the current month
    #[arg(long, value_parser = crate::utils::parse_datetime)]
    start: Option<NaiveDateTime>,
    /// End of the period. Defaults to now
    #[arg(long, value_parser = crate::utils::parse_datetime)]
    end: Option<NaiveDateTime>,
}
impl Period {
    fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let now = Utc::now().naive_utc();
        let start = self.start.unwrap_or_else(|| {
            NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                .unwrap_or(now.date())
                .and_time(Default::default())
        });
        (start, self.end.unwrap_or(now))
    }
}

/// Commands related to usage reports
#[derive(Debug, Clone, clap::Subcommand)]
pub enum UsageSubcmd {
    /// Display the usage of a tenant, every page of the report merged
    Get {
        /// The tenant to report on, instead of the session one
        #[arg(long)]
        tenant: Option<String>,
        #[command(flatten)]
        period: Period,
        /// Only display the aggregated figures
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// Display the usage of every tenant, every page of the report merged
    #[command(visible_aliases = ["ls"])]
    List {
        #[command(flatten)]
        period: Period,
    },
}

#[derive(Debug, Serialize)]
struct TenantSummary {
    tenant_id: String,
    #[serde(flatten)]
    summary: UsageSummary,
}
impl From<&TenantUsage> for TenantSummary {
    fn from(usage: &TenantUsage) -> Self {
        Self {
            tenant_id: usage.tenant_id.clone(),
            summary: usage.summary(),
        }
    }
}

impl super::CommandExecutor for UsageSubcmd {
    fn execute(self, params: Box<dyn Any>) -> Result<Box<dyn crate::display::Displayable>> {
        let compute_api: ComputeApi<ComputeServiceClient> = *params.downcast().unwrap();
        let res: Box<dyn crate::display::Displayable> = match self {
            UsageSubcmd::Get {
                tenant,
                period,
                summary,
            } => {
                let (start, end) = period.bounds();
                let tenant_id = tenant.unwrap_or_else(|| compute_api.tenant_id().to_owned());
                let usage = compute_api.usage_get(&tenant_id, start, end)?;
                if summary {
                    Box::new(TenantSummary::from(&usage))
                } else {
                    Box::new(usage)
                }
            }
            UsageSubcmd::List { period } => {
                let (start, end) = period.bounds();
                let usages = compute_api.usage_list(start, end)?;
                Box::new(usages.iter().map(TenantSummary::from).collect::<Vec<_>>())
            }
        };
        Ok(res)
    }
}
