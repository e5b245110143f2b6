mod commands;
mod subcmd_flavors;
mod subcmd_servers;
mod subcmd_usage;

use core::{any::Any, num::NonZeroUsize};
use std::path::PathBuf;

use compute_api_client::{AuthToken, ComputeServiceClient, PasswordCredentials};
use compute_paging::{ComputeApi, Marked, Marker, Paginated, PagingSettings};
use serde::Serialize;

use crate::errors::{Error, Result};

pub trait CommandExecutor {
    fn execute(self, params: Box<dyn Any>) -> Result<Box<dyn crate::display::Displayable>>;
}

#[derive(Clone, Debug, clap::Args)]
pub struct CliGlobalArgs {
    /// Set the URL of the compute service API, including its version path.
    #[arg(
        long,
        value_hint = clap::ValueHint::Url,
        env = "COMPUTE_API_URL",
        default_value = "http://localhost:8774/v2.1",
        global = true
    )]
    pub compute_api_url: String,
    /// Set the tenant the session is scoped to.
    /// {n}Defaults to the project of the token when authenticating with a password.
    #[arg(long, env = "COMPUTE_TENANT_ID", global = true)]
    pub tenant_id: Option<String>,
    /// Set the number of items per page, overriding the API_RESULT_PAGE_SIZE environment variable.
    #[arg(long, global = true)]
    pub page_size: Option<NonZeroUsize>,
    /// Read the paging settings from a JSON file, e.g. {"page_size": 50, "sort_key": "name"}
    #[arg(long, value_hint = clap::ValueHint::FilePath, global = true)]
    pub paging_settings: Option<PathBuf>,
}

#[derive(Clone, clap::Args)]
pub struct AuthGlobalArgs {
    /// Use an already issued authentication token.
    #[arg(long, env = "COMPUTE_AUTH_TOKEN", global = true, hide_env_values = true)]
    pub auth_token: Option<String>,
    /// Set the URL of the identity service API, used to authenticate with a password.
    #[arg(
        long,
        value_hint = clap::ValueHint::Url,
        env = "COMPUTE_IDENTITY_URL",
        default_value = "http://localhost:5000/v3",
        global = true
    )]
    pub identity_url: String,
    /// Authenticate with a password as this user.
    /// {n}The password is prompted if not in the environment.
    #[arg(long, env = "COMPUTE_USER_NAME", global = true)]
    pub user_name: Option<String>,
    #[arg(long, env = "COMPUTE_PASSWORD", global = true, hide = true)]
    pub password: Option<String>,
    #[arg(long, env = "COMPUTE_USER_DOMAIN", default_value = "Default", global = true)]
    pub user_domain: String,
    /// The project to scope the password authentication to.
    #[arg(long, env = "COMPUTE_PROJECT_NAME", global = true)]
    pub project_name: Option<String>,
    #[arg(long, env = "COMPUTE_PROJECT_DOMAIN", default_value = "Default", global = true)]
    pub project_domain: String,
}

#[derive(Clone, Debug, clap::Parser)]
/// The Compute CLI
///
/// compute-cli browses the servers, flavors, usage and limits of a compute service,
/// one page at a time.
#[command(
    author = option_env!("CARGO_PKG_AUTHORS").unwrap_or(""),
    version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
    about,
    long_about = None
)]
pub struct CliParser {
    #[clap(next_help_heading = Some("Global options"))]
    #[command(flatten)]
    pub gargs: CliGlobalArgs,
    #[clap(next_help_heading = Some("Authentication options"))]
    #[command(flatten)]
    pub auth_gargs: AuthGlobalArgs,
    #[command(subcommand)]
    /// Top level cli sub-commands.
    pub cmd: commands::Command,
}

impl CliParser {
    pub fn execute(self) -> Result<Box<dyn crate::display::Displayable>> {
        let cmd = self.cmd;
        let params = Box::new((self.gargs, self.auth_gargs));
        cmd.execute(params)
    }
}

impl CliGlobalArgs {
    /// Settings file, then environment, then command line
    fn paging_settings(&self) -> Result<PagingSettings> {
        let settings = match &self.paging_settings {
            Some(path) => PagingSettings::from_json(&std::fs::read_to_string(path)?)?,
            None => PagingSettings::default(),
        }
        .with_env_overrides();
        Ok(match self.page_size {
            Some(page_size) => settings.with_page_size(page_size),
            None => settings,
        })
    }
}

impl core::fmt::Debug for AuthGlobalArgs {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthGlobalArgs")
            .field("auth_token", &redacted(&self.auth_token))
            .field("identity_url", &self.identity_url)
            .field("user_name", &self.user_name)
            .field("password", &redacted(&self.password))
            .field("user_domain", &self.user_domain)
            .field("project_name", &self.project_name)
            .field("project_domain", &self.project_domain)
            .finish()
    }
}

impl AuthGlobalArgs {
    fn auth_token(self) -> Result<AuthToken> {
        if let Some(user_name) = self.user_name {
            let project_name = self.project_name.ok_or_else(|| {
                Error::generic("--project-name is required to authenticate with a password")
            })?;
            let password = match self.password {
                Some(password) => password,
                None => crate::utils::prompt_user_for_password()?,
            };
            return Ok(AuthToken::from_password(PasswordCredentials {
                identity_url: self.identity_url,
                user_name,
                password,
                user_domain: self.user_domain,
                project_name,
                project_domain: self.project_domain,
            })?);
        }
        match self.auth_token {
            Some(token) => Ok(AuthToken::new(token)),
            None => Err(Error::Generic(
                "Provide either --auth-token or --user-name to authenticate".to_owned(),
            )),
        }
    }
}

pub(crate) fn compute_api(
    gargs: CliGlobalArgs,
    auth_gargs: AuthGlobalArgs,
) -> Result<ComputeApi<ComputeServiceClient>> {
    let settings = gargs.paging_settings()?;
    let client = ComputeServiceClient::new(gargs.compute_api_url, auth_gargs.auth_token()?);
    let tenant_id = gargs
        .tenant_id
        .or_else(|| client.project_id())
        .ok_or_else(|| Error::Generic("--tenant-id is required".to_owned()))?;
    log::debug!("compute_api - tenant_id={tenant_id} settings={settings:?}");
    Ok(ComputeApi::new(client, settings, &tenant_id))
}

/// A page as displayed, with the markers to pass to get its neighbours
#[derive(Debug, Serialize)]
pub(crate) struct PageDisplay<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev_marker: Option<Marker>,
}

impl<T: Marked> From<Paginated<T>> for PageDisplay<T> {
    fn from(page: Paginated<T>) -> Self {
        let next_marker = page.next_marker();
        let prev_marker = page.prev_marker();
        let (items, _, _) = page.into_parts();
        Self {
            items,
            next_marker,
            prev_marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn debug_output_hides_secrets() {
        let cli_parser = CliParser::try_parse_from([
            "compute-cli",
            "--auth-token",
            "gAAAAAB-token-value",
            "--user-name",
            "admin",
            "--password",
            "hunter2",
            "--tenant-id",
            "t1",
            "limits",
        ])
        .unwrap();
        let debug = format!("{cli_parser:?}");
        assert!(!debug.contains("gAAAAAB-token-value"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("admin"));
        assert!(debug.contains("t1"));
    }

    #[test]
    fn servers_list_args() {
        let cli_parser = CliParser::try_parse_from([
            "compute-cli",
            "--page-size",
            "5",
            "servers",
            "list",
            "--marker",
            "s1",
            "-f",
            "status=ACTIVE",
        ])
        .unwrap();
        assert_eq!(cli_parser.gargs.page_size.map(NonZeroUsize::get), Some(5));
        assert!(CliParser::try_parse_from(["compute-cli", "--page-size", "0", "limits"]).is_err());
    }
}
