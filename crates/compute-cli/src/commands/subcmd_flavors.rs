use core::any::Any;

use compute_api_client::ComputeServiceClient;
use compute_paging::{ComputeApi, Marker};

use super::PageDisplay;
use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Visibility {
    Public,
    Private,
    All,
}
impl Visibility {
    fn is_public(self) -> Option<bool> {
        match self {
            Visibility::Public => Some(true),
            Visibility::Private => Some(false),
            Visibility::All => None,
        }
    }
}

/// Commands related to flavors
#[derive(Debug, Clone, clap::Subcommand)]
pub enum FlavorsSubcmd {
    /// List one page of flavors, sorted by name
    #[command(visible_aliases = ["ls"])]
    List {
        /// Start the page after the flavor with this ID
        #[arg(long)]
        marker: Option<String>,
        /// Walk backward: return the page before the marker
        #[arg(long, default_value_t = false)]
        reversed: bool,
        /// Return every flavor in one go instead of a single page
        #[arg(long, default_value_t = false)]
        all: bool,
        #[arg(long, value_enum, default_value_t = Visibility::Public)]
        visibility: Visibility,
        /// Also retrieve the extra specs of each flavor
        #[arg(long, default_value_t = false)]
        extra_specs: bool,
    },
    /// Display a flavor
    Get {
        /// The ID of the flavor
        flavor_id: String,
        /// Also retrieve the extra specs of the flavor
        #[arg(long, default_value_t = false)]
        extra_specs: bool,
    },
}

impl super::CommandExecutor for FlavorsSubcmd {
    fn execute(self, params: Box<dyn Any>) -> Result<Box<dyn crate::display::Displayable>> {
        let compute_api: ComputeApi<ComputeServiceClient> = *params.downcast().unwrap();
        let res: Box<dyn crate::display::Displayable> = match self {
            FlavorsSubcmd::List {
                marker,
                reversed,
                all,
                visibility,
                extra_specs,
            } => {
                let page = compute_api.flavor_list_paged(
                    visibility.is_public(),
                    extra_specs,
                    marker.map(Marker::from),
                    !all,
                    reversed,
                )?;
                Box::new(PageDisplay::from(page))
            }
            FlavorsSubcmd::Get {
                flavor_id,
                extra_specs,
            } => Box::new(compute_api.flavor_get(&flavor_id, extra_specs)?),
        };
        Ok(res)
    }
}
