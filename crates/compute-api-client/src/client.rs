use core::cell::RefCell;

use chrono::NaiveDateTime;
use compute_paging::{
    compute::{AbsoluteLimit, ComputeService, ExtraSpecs, Flavor, Server, TenantUsage},
    ApiVersion, FilterOptions, Marker, PageQuery, VersionInfo,
};
use reqwest::{
    blocking::{Client, RequestBuilder},
    header::HeaderMap,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::AuthToken;
use crate::errors::{Error, Result};

const USAGE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Blocking client of the compute service API
#[derive(Debug, Clone)]
pub struct ComputeServiceClient {
    client: Client,
    compute_api_url: String,
    token: RefCell<AuthToken>,
}

pub(crate) fn req_builder_to_response(req: RequestBuilder) -> Result<(HeaderMap, String)> {
    log::debug!("req={req:?}");
    let res = req.send()?;
    log::debug!("res={res:?}");
    let status_code = res.status();
    let headers = res.headers().clone();
    let body_bytes = res
        .bytes()
        .map_err(|e| {
            log::error!("Could not retrieve body bytes: {e}");
            Error::UnretrievableBodyResponse
        })?
        .into();
    let body_str = String::from_utf8(body_bytes).map_err(|e| {
        log::error!("Body is not valid UTF8: {e}");
        Error::UnretrievableBodyResponse
    })?;
    log::debug!("body_str={body_str}");
    if status_code.is_client_error() || status_code.is_server_error() {
        log::debug!(
            "{} {}: {body_str}",
            status_code.as_u16(),
            status_code.canonical_reason().unwrap_or("UNKNOWN")
        );
        Err(Error::ApiErrorResponse {
            code: status_code.as_u16(),
            message: error_message(body_str),
        })
    } else {
        Ok((headers, body_str))
    }
}

/// Compute API errors look like `{"itemNotFound": {"code": 404, "message": "..."}}`
fn error_message(body_str: String) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&body_str) else {
        return body_str;
    };
    map.get("message")
        .or_else(|| map.values().find_map(|v| v.get("message")))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or(body_str)
}

/// Turn filter options and paging parameters into query string pairs
fn query_params(
    filter_options: &FilterOptions,
    page_query: Option<&PageQuery>,
) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for (key, value) in filter_options {
        match value {
            Value::Null => (),
            Value::String(s) => params.push((key.clone(), s.clone())),
            Value::Array(values) => {
                for v in values {
                    params.push((key.clone(), query_value(v)));
                }
            }
            other => params.push((key.clone(), query_value(other))),
        }
    }
    if let Some(page_query) = page_query {
        if let Some(marker) = &page_query.marker {
            params.push(("marker".to_owned(), marker.to_string()));
        }
        params.push(("limit".to_owned(), page_query.limit.to_string()));
        if let Some(sort) = &page_query.sort {
            params.push(("sort_key".to_owned(), sort.key.clone()));
            params.push(("sort_dir".to_owned(), sort.dir.to_string()));
        }
    }
    params
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn usage_params(
    start: NaiveDateTime,
    end: NaiveDateTime,
    marker: Option<&Marker>,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("start".to_owned(), start.format(USAGE_DATETIME_FORMAT).to_string()),
        ("end".to_owned(), end.format(USAGE_DATETIME_FORMAT).to_string()),
    ];
    if let Some(marker) = marker {
        params.push(("marker".to_owned(), marker.to_string()));
    }
    params
}

/// Extract the payload from its envelope, e.g. `{"server": {...}}`
fn unwrap_field<T: DeserializeOwned>(mut value: Value, field: &'static str) -> Result<T> {
    let inner = value
        .get_mut(field)
        .map(Value::take)
        .ok_or(Error::MissingResponseField(field))?;
    Ok(serde_json::from_value(inner)?)
}

impl ComputeServiceClient {
    pub fn new(compute_api_url: String, token: AuthToken) -> Self {
        Self {
            client: Client::new(),
            compute_api_url: compute_api_url.trim_end_matches('/').to_owned(),
            token: RefCell::new(token),
        }
    }

    /// The project of the authentication token, if known
    pub fn project_id(&self) -> Option<String> {
        self.token.borrow().project_id().map(str::to_owned)
    }

    fn api_call_get(
        &self,
        path: &str,
        query: &[(String, String)],
        version: Option<ApiVersion>,
    ) -> Result<Value> {
        let mut token = self.token.borrow_mut();
        token.refresh_if_needed()?;

        let api_endpoint = if path.is_empty() {
            format!("{}/", self.compute_api_url)
        } else {
            format!("{}/{path}", self.compute_api_url)
        };
        log::debug!("Initiating GET {api_endpoint} query={query:?} version={version:?}");

        let req = self
            .client
            .get(&api_endpoint)
            .query(query)
            .header("X-Auth-Token", &token.value)
            .header("Accept", "application/json");
        let req = match version {
            Some(version) => req
                .header("X-OpenStack-Nova-API-Version", version.to_string())
                .header("OpenStack-API-Version", format!("compute {version}")),
            None => req,
        };
        let (_, body) = req_builder_to_response(req)?;
        match body.as_str() {
            "" => Ok(Value::Null),
            _ => Ok(serde_json::from_str(&body)?),
        }
    }
}

impl ComputeService for ComputeServiceClient {
    type Error = Error;

    fn current_version(&self) -> Result<VersionInfo> {
        unwrap_field(self.api_call_get("", &[], None)?, "version")
    }

    ////////////////////////
    //      Servers       //
    ////////////////////////

    fn list_servers(
        &self,
        version: ApiVersion,
        detailed: bool,
        search_opts: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Server>> {
        let path = if detailed { "servers/detail" } else { "servers" };
        let query = query_params(search_opts, page_query);
        unwrap_field(self.api_call_get(path, &query, Some(version))?, "servers")
    }

    fn get_server(&self, version: ApiVersion, server_id: &str) -> Result<Server> {
        let path = format!("servers/{server_id}");
        unwrap_field(self.api_call_get(&path, &[], Some(version))?, "server")
    }

    ////////////////////////
    //      Flavors       //
    ////////////////////////

    fn list_flavors(
        &self,
        filter_options: &FilterOptions,
        page_query: Option<&PageQuery>,
    ) -> Result<Vec<Flavor>> {
        let query = query_params(filter_options, page_query);
        unwrap_field(self.api_call_get("flavors/detail", &query, None)?, "flavors")
    }

    fn get_flavor(&self, flavor_id: &str) -> Result<Flavor> {
        let path = format!("flavors/{flavor_id}");
        unwrap_field(self.api_call_get(&path, &[], None)?, "flavor")
    }

    fn get_flavor_extra_specs(&self, flavor_id: &str) -> Result<ExtraSpecs> {
        let path = format!("flavors/{flavor_id}/os-extra_specs");
        unwrap_field(self.api_call_get(&path, &[], None)?, "extra_specs")
    }

    ////////////////////////
    //       Usage        //
    ////////////////////////

    fn get_usage(
        &self,
        version: ApiVersion,
        tenant_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        marker: Option<&Marker>,
    ) -> Result<TenantUsage> {
        let path = format!("os-simple-tenant-usage/{tenant_id}");
        let query = usage_params(start, end, marker);
        unwrap_field(self.api_call_get(&path, &query, Some(version))?, "tenant_usage")
    }

    fn list_usage(
        &self,
        version: ApiVersion,
        start: NaiveDateTime,
        end: NaiveDateTime,
        detailed: bool,
        marker: Option<&Marker>,
    ) -> Result<Vec<TenantUsage>> {
        let mut query = usage_params(start, end, marker);
        if detailed {
            query.push(("detailed".to_owned(), "1".to_owned()));
        }
        unwrap_field(
            self.api_call_get("os-simple-tenant-usage", &query, Some(version))?,
            "tenant_usages",
        )
    }

    ////////////////////////
    //       Limits       //
    ////////////////////////

    fn get_limits(&self, reserved: bool, tenant_id: Option<&str>) -> Result<Vec<AbsoluteLimit>> {
        let mut query = Vec::new();
        if reserved {
            query.push(("reserved".to_owned(), "1".to_owned()));
        }
        if let Some(tenant_id) = tenant_id {
            query.push(("tenant_id".to_owned(), tenant_id.to_owned()));
        }
        let mut limits = self.api_call_get("limits", &query, None)?;
        let absolute: serde_json::Map<String, Value> = unwrap_field(
            limits
                .get_mut("limits")
                .map(Value::take)
                .ok_or(Error::MissingResponseField("limits"))?,
            "absolute",
        )?;
        Ok(absolute
            .into_iter()
            .filter_map(|(name, value)| match value.as_i64() {
                Some(value) => Some(AbsoluteLimit { name, value }),
                None => {
                    log::warn!("Ignoring non integer absolute limit {name}={value}");
                    None
                }
            })
            .collect())
    }
}
