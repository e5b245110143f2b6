use core::any::Any;

use compute_api_client::ComputeServiceClient;
use compute_paging::{ComputeApi, FilterOptions, Marker};
use serde_json::Value;

use super::PageDisplay;
use crate::errors::Result;

/// Commands related to servers
#[derive(Debug, Clone, clap::Subcommand)]
pub enum ServersSubcmd {
    /// List one page of servers of the session tenant, in the order of the compute service
    #[command(visible_aliases = ["ls"])]
    List {
        /// Start the page after the server with this ID
        #[arg(long)]
        marker: Option<String>,
        /// Return every server in one go instead of a single page
        #[arg(long, default_value_t = false)]
        all: bool,
        /// List the servers of every tenant
        #[arg(long, default_value_t = false)]
        all_tenants: bool,
        /// Additional search option, e.g. `status=ACTIVE`. Can be repeated
        #[arg(
            short,
            long = "filter",
            value_name = "KEY=VALUE",
            value_parser = crate::utils::parse_filter
        )]
        filters: Vec<(String, Value)>,
    },
    /// Display a server
    Get {
        /// The ID of the server
        server_id: String,
    },
}

impl super::CommandExecutor for ServersSubcmd {
    fn execute(self, params: Box<dyn Any>) -> Result<Box<dyn crate::display::Displayable>> {
        let compute_api: ComputeApi<ComputeServiceClient> = *params.downcast().unwrap();
        let res: Box<dyn crate::display::Displayable> = match self {
            ServersSubcmd::List {
                marker,
                all,
                all_tenants,
                filters,
            } => {
                let mut search_opts: FilterOptions = filters.into_iter().collect();
                if all_tenants {
                    search_opts.insert("all_tenants".to_owned(), Value::Bool(true));
                }
                let page = compute_api.server_list(search_opts, marker.map(Marker::from), !all)?;
                Box::new(PageDisplay::from(page))
            }
            ServersSubcmd::Get { server_id } => Box::new(compute_api.server_get(&server_id)?),
        };
        Ok(res)
    }
}
