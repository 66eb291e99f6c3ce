//! The Bling node: parameter surface, request building and batch execution.
//!
//! # Architecture
//!
//! ```text
//! Invocation (resource, operation, items)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       BlingNode::execute                 │
//! │  - Resolve route once per batch          │
//! │  - Per item: parse params, build request │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       AuthenticatedTransport             │
//! │  - Attach OAuth2 token, send request     │
//! └─────────────────────────────────────────┘
//!          ↓
//!   Vec<OutputRecord> (arrays flattened)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod dates;
pub mod description;
pub mod dispatcher;
pub mod params;
pub mod request;

pub use dispatcher::{BatchPolicy, BlingNode, Invocation, OutputRecord};
pub use params::{ContactData, ItemParameters, ProductData, ProductStatus};
pub use request::{route, HttpMethod, RequestBuilderFn, RequestContext, RequestDescriptor};

/// Bling entity type targeted by the node.
///
/// Accepts the Portuguese path-style values used by existing workflows
/// (`contatos`, `produtos`, `contas-pagar`) as aliases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    #[serde(alias = "contatos")]
    Contact,
    #[serde(alias = "produtos")]
    Product,
    #[serde(alias = "contas-pagar")]
    PayableAccount,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Contact, Resource::Product, Resource::PayableAccount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Contact => "contact",
            Resource::Product => "product",
            Resource::PayableAccount => "payable-account",
        }
    }

    /// Path below the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Contact => "contatos",
            Resource::Product => "produtos",
            Resource::PayableAccount => "contas/pagar",
        }
    }

    /// Operations the node exposes for this resource.
    pub fn operations(&self) -> &'static [Operation] {
        match self {
            Resource::Contact | Resource::Product => &[
                Operation::Create,
                Operation::Delete,
                Operation::Get,
                Operation::GetAll,
                Operation::Update,
            ],
            Resource::PayableAccount => &[Operation::GetAll],
        }
    }

    pub fn supports(&self, operation: Operation) -> bool {
        self.operations().contains(&operation)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRUD-style action performed on a [`Resource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "create")]
    Create,
    #[serde(rename = "get")]
    Get,
    #[serde(rename = "getAll")]
    GetAll,
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "delete")]
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::GetAll => "getAll",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    /// True for operations addressing a single entity by id.
    pub fn requires_id(&self) -> bool {
        matches!(self, Operation::Get | Operation::Update | Operation::Delete)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_aliases() {
        let r: Resource = serde_json::from_str("\"contatos\"").unwrap();
        assert_eq!(r, Resource::Contact);
        let r: Resource = serde_json::from_str("\"contas-pagar\"").unwrap();
        assert_eq!(r, Resource::PayableAccount);
        let r: Resource = serde_json::from_str("\"payable-account\"").unwrap();
        assert_eq!(r, Resource::PayableAccount);
        assert!(serde_json::from_str::<Resource>("\"nfe\"").is_err());
    }

    #[test]
    fn test_operation_names() {
        let op: Operation = serde_json::from_str("\"getAll\"").unwrap();
        assert_eq!(op, Operation::GetAll);
        assert_eq!(serde_json::to_string(&Operation::GetAll).unwrap(), "\"getAll\"");
        assert!(Operation::Delete.requires_id());
        assert!(!Operation::Create.requires_id());
    }

    #[test]
    fn test_payable_accounts_only_list() {
        assert_eq!(Resource::PayableAccount.operations(), &[Operation::GetAll]);
        assert!(!Resource::PayableAccount.supports(Operation::Create));
        assert!(Resource::Product.supports(Operation::Update));
        assert_eq!(Resource::PayableAccount.path(), "contas/pagar");
    }
}
