//! Batch execution: one request per input item, responses flattened into
//! output records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dates::utc_today;
use super::params::ItemParameters;
use super::request::{route, RequestContext, RequestDescriptor, BASE_URL};
use super::{Operation, Resource};
use crate::credentials::CREDENTIAL_NAME;
use crate::error::{BatchError, NodeError};
use crate::transport::AuthenticatedTransport;

/// How a batch reacts to a failing item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPolicy {
    /// Emit an error record and keep going instead of aborting the batch.
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl BatchPolicy {
    pub fn continue_on_fail() -> Self {
        Self {
            continue_on_fail: true,
        }
    }
}

/// Back-reference from an output record to its input item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One record produced by the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub json: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_item: Option<PairedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutputRecord {
    pub fn new(json: Value) -> Self {
        Self {
            json,
            paired_item: None,
            error: None,
        }
    }

    /// Error record for a failed item under continue-on-fail.
    pub fn failed(item_index: usize, message: String) -> Self {
        Self {
            json: json!({ "error": message }),
            paired_item: Some(PairedItem { item: item_index }),
            error: Some(message),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A complete node invocation as received from the host.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub resource: Resource,
    pub operation: Operation,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub policy: Option<BatchPolicy>,
}

/// The Bling node.
///
/// Holds the injected transport and the batch-independent settings. Resource
/// and operation are chosen per [`execute`](BlingNode::execute) call and apply
/// to every item of that batch.
pub struct BlingNode {
    transport: Arc<dyn AuthenticatedTransport>,
    credential_name: String,
    base_url: String,
    today: Option<NaiveDate>,
}

impl BlingNode {
    pub fn new(transport: Arc<dyn AuthenticatedTransport>) -> Self {
        Self {
            transport,
            credential_name: CREDENTIAL_NAME.to_string(),
            base_url: BASE_URL.to_string(),
            today: None,
        }
    }

    /// Overrides the API base URL (mock servers, sandboxes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_credential_name(mut self, name: impl Into<String>) -> Self {
        self.credential_name = name.into();
        self
    }

    /// Pins the date used as default due-date bound.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub async fn run(
        &self,
        invocation: Invocation,
        default_policy: BatchPolicy,
    ) -> Result<Vec<OutputRecord>, BatchError> {
        let policy = invocation.policy.unwrap_or(default_policy);
        self.execute(invocation.resource, invocation.operation, &invocation.items, &policy)
            .await
    }

    /// Runs `operation` on `resource` for every item, in order.
    ///
    /// Each item is awaited to completion before the next one starts.
    pub async fn execute(
        &self,
        resource: Resource,
        operation: Operation,
        items: &[Value],
        policy: &BatchPolicy,
    ) -> Result<Vec<OutputRecord>, BatchError> {
        info!(
            resource = %resource,
            operation = %operation,
            items = items.len(),
            continue_on_fail = policy.continue_on_fail,
            "Executing Bling batch"
        );

        let ctx = RequestContext::new(self.base_url.clone(), self.today.unwrap_or_else(utc_today));
        let mut records = Vec::new();

        for (index, item) in items.iter().enumerate() {
            match self.execute_item(resource, operation, &ctx, item).await {
                Ok(response) => records.extend(normalize_response(response)),
                Err(err) if policy.continue_on_fail => {
                    warn!(item_index = index, error = %err, "Item failed, continuing");
                    records.push(OutputRecord::failed(index, err.to_string()));
                }
                Err(err) => {
                    warn!(item_index = index, error = %err, "Item failed, aborting batch");
                    return Err(BatchError::new(index, err));
                }
            }
        }

        info!(records = records.len(), "Bling batch finished");
        Ok(records)
    }

    async fn execute_item(
        &self,
        resource: Resource,
        operation: Operation,
        ctx: &RequestContext,
        item: &Value,
    ) -> Result<Option<Value>, NodeError> {
        let request = build_request(resource, operation, ctx, item)?;
        debug!(method = %request.method, url = %request.url, "Dispatching item");
        self.transport
            .authenticated_request(&self.credential_name, &request)
            .await
    }
}

/// Builds the request for one item without sending it.
pub fn build_request(
    resource: Resource,
    operation: Operation,
    ctx: &RequestContext,
    item: &Value,
) -> Result<RequestDescriptor, NodeError> {
    let builder = route(resource, operation)
        .ok_or(NodeError::UnsupportedOperation { resource, operation })?;
    let params = ItemParameters::from_value(item.clone())?;
    builder(resource, ctx, &params)
}

/// Arrays become one record per element; other values one record; an empty
/// response none.
pub fn normalize_response(response: Option<Value>) -> Vec<OutputRecord> {
    match response {
        None => Vec::new(),
        Some(Value::Array(values)) => values.into_iter().map(OutputRecord::new).collect(),
        Some(value) => vec![OutputRecord::new(value)],
    }
}
