//! Request descriptors and the (resource, operation) dispatch table.
//!
//! Each supported pair maps to a pure builder turning item parameters into a
//! [`RequestDescriptor`]. Nothing here touches the network.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::dates::normalize_due_date;
use super::params::ItemParameters;
use super::{Operation, Resource};
use crate::error::NodeError;

/// Production Bling API v3 base URL.
pub const BASE_URL: &str = "https://api.bling.com.br/Api/v3";

/// Only open payable accounts are listed.
const PAYABLE_STATUS_OPEN: &str = "1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully-formed outbound HTTP call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    fn new(method: HttpMethod, url: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            headers,
        }
    }

    fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    fn with_json_body(mut self, body: Value) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(body);
        self
    }

    /// First query value for `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Batch-wide inputs shared by every builder.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub base_url: String,
    /// Date used when no due-date bound is given.
    pub today: NaiveDate,
}

impl RequestContext {
    pub fn new(base_url: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            base_url: base_url.into(),
            today,
        }
    }

    fn collection_url(&self, resource: Resource) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), resource.path())
    }

    fn entity_url(&self, resource: Resource, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(resource),
            urlencoding::encode(id)
        )
    }
}

pub type RequestBuilderFn =
    fn(Resource, &RequestContext, &ItemParameters) -> Result<RequestDescriptor, NodeError>;

const ROUTES: &[(Resource, Operation, RequestBuilderFn)] = &[
    (Resource::Contact, Operation::Create, build_create),
    (Resource::Contact, Operation::Get, build_get),
    (Resource::Contact, Operation::GetAll, build_list),
    (Resource::Contact, Operation::Update, build_update),
    (Resource::Contact, Operation::Delete, build_delete),
    (Resource::Product, Operation::Create, build_create),
    (Resource::Product, Operation::Get, build_get),
    (Resource::Product, Operation::GetAll, build_list),
    (Resource::Product, Operation::Update, build_update),
    (Resource::Product, Operation::Delete, build_delete),
    (Resource::PayableAccount, Operation::GetAll, build_list_payable),
];

/// Looks up the builder for a (resource, operation) pair.
pub fn route(resource: Resource, operation: Operation) -> Option<RequestBuilderFn> {
    ROUTES
        .iter()
        .find(|(r, o, _)| *r == resource && *o == operation)
        .map(|(_, _, builder)| *builder)
}

fn build_create(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let body = entity_body(resource, params)?;
    Ok(RequestDescriptor::new(HttpMethod::Post, ctx.collection_url(resource)).with_json_body(body))
}

fn build_get(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let id = require_id(resource, Operation::Get, params)?;
    Ok(RequestDescriptor::new(HttpMethod::Get, ctx.entity_url(resource, id)))
}

fn build_list(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let limit = params.limit()?;
    Ok(RequestDescriptor::new(HttpMethod::Get, ctx.collection_url(resource)).with_query("limite", limit))
}

fn build_update(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let id = require_id(resource, Operation::Update, params)?;
    let body = entity_body(resource, params)?;
    Ok(RequestDescriptor::new(HttpMethod::Put, ctx.entity_url(resource, id)).with_json_body(body))
}

fn build_delete(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let id = require_id(resource, Operation::Delete, params)?;
    Ok(RequestDescriptor::new(HttpMethod::Delete, ctx.entity_url(resource, id)))
}

fn build_list_payable(
    resource: Resource,
    ctx: &RequestContext,
    params: &ItemParameters,
) -> Result<RequestDescriptor, NodeError> {
    let limit = params.limit()?;
    let due_until = normalize_due_date(params.data_vencimento_final.as_deref(), ctx.today)?;
    Ok(RequestDescriptor::new(HttpMethod::Get, ctx.collection_url(resource))
        .with_query("limite", limit)
        .with_query("dataVencimentoFinal", due_until)
        .with_query("situacao", PAYABLE_STATUS_OPEN))
}

fn require_id<'a>(
    resource: Resource,
    operation: Operation,
    params: &'a ItemParameters,
) -> Result<&'a str, NodeError> {
    params.id_for(resource).ok_or_else(|| {
        let label = match resource {
            Resource::Contact => "Contact ID",
            Resource::Product => "Product ID",
            Resource::PayableAccount => "ID",
        };
        NodeError::validation(format!("{} is required for {} operation", label, operation))
    })
}

fn entity_body(resource: Resource, params: &ItemParameters) -> Result<Value, NodeError> {
    let body = match resource {
        Resource::Contact => serde_json::to_value(&params.contact_data),
        Resource::Product => serde_json::to_value(&params.product_data),
        Resource::PayableAccount => Ok(Value::Object(Default::default())),
    };
    body.map_err(|e| NodeError::validation(format!("Invalid {} data: {}", resource, e)))
}
