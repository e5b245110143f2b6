use core::any::Any;

use compute_paging::{version::CLIENT_MAX_VERSION, Feature};
use serde_json::json;

use super::CommandExecutor;
use crate::errors::Result;

/// Top level cli sub-commands.
#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Commands listing and inspecting servers
    #[command(visible_aliases = ["server", "s"])]
    Servers {
        #[command(subcommand)]
        subcmd: super::subcmd_servers::ServersSubcmd,
    },
    /// Commands listing and inspecting flavors
    #[command(visible_aliases = ["flavor", "f"])]
    Flavors {
        #[command(subcommand)]
        subcmd: super::subcmd_flavors::FlavorsSubcmd,
    },
    /// Commands reporting the usage of tenants over a period
    Usage {
        #[command(subcommand)]
        subcmd: super::subcmd_usage::UsageSubcmd,
    },
    /// Display the absolute limits of a tenant
    Limits {
        /// Include the reserved resources in the used counters
        #[arg(long, default_value_t = false)]
        reserved: bool,
        /// The tenant to display the limits of, instead of the session one
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Display the compute API version negotiated with the service
    Version,
}

impl CommandExecutor for Command {
    fn execute(self, params: Box<dyn Any>) -> Result<Box<dyn crate::display::Displayable>> {
        let (gargs, auth_gargs): (super::CliGlobalArgs, super::AuthGlobalArgs) =
            *params.downcast().unwrap();
        let compute_api = super::compute_api(gargs, auth_gargs)?;
        match self {
            Command::Servers { subcmd } => subcmd.execute(Box::new(compute_api)),
            Command::Flavors { subcmd } => subcmd.execute(Box::new(compute_api)),
            Command::Usage { subcmd } => subcmd.execute(Box::new(compute_api)),
            Command::Limits { reserved, tenant } => {
                let tenant_id = tenant.unwrap_or_else(|| compute_api.tenant_id().to_owned());
                Ok(Box::new(
                    compute_api.tenant_absolute_limits(reserved, Some(&tenant_id))?,
                ))
            }
            Command::Version => {
                let version = compute_api.api_version()?;
                let features = [
                    Feature::LockedAttribute,
                    Feature::InstanceDescription,
                    Feature::UsagePagination,
                    Feature::Multiattach,
                ]
                .into_iter()
                .filter(|f| version.supports(*f))
                .map(|f| format!("{f:?}"))
                .collect::<Vec<_>>();
                Ok(Box::new(json!({
                    "negotiated": version,
                    "client_max": CLIENT_MAX_VERSION,
                    "features": features,
                })))
            }
        }
    }
}

