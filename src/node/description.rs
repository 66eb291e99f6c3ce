//! Declarative node description consumed by the host's UI and validation.
//!
//! The description lists every parameter the node reads, with `show`
//! conditions tying each one to the resource/operation it applies to.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::params::DEFAULT_LIMIT;
use super::{Operation, Resource};
use crate::credentials::CREDENTIAL_NAME;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Options,
    String,
    Number,
    Collection,
    DateTime,
}

/// One selectable value of an `options` property.
#[derive(Clone, Debug, Serialize)]
pub struct OptionValue {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum PropertyOptions {
    Choices(Vec<OptionValue>),
    /// Sub-fields of a collection.
    Fields(Vec<NodeProperty>),
}

/// Parameter values under which a property is shown.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DisplayOptions {
    pub show: BTreeMap<String, Vec<String>>,
}

impl DisplayOptions {
    /// True when every `show` condition matches the selection.
    pub fn matches(&self, resource: Resource, operation: Operation) -> bool {
        self.show.iter().all(|(parameter, allowed)| {
            let selected = match parameter.as_str() {
                "resource" => resource.as_str(),
                "operation" => operation.as_str(),
                _ => return false,
            };
            allowed.iter().any(|v| v == selected)
        })
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    pub display_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub default: Value,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_data_expression: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_options: Option<DisplayOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<PropertyOptions>,
}

impl NodeProperty {
    fn new(display_name: &str, name: &str, kind: PropertyType, default: Value) -> Self {
        Self {
            display_name: display_name.to_string(),
            name: name.to_string(),
            kind,
            default,
            required: false,
            no_data_expression: false,
            description: None,
            placeholder: None,
            type_options: None,
            display_options: None,
            options: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn selector(mut self) -> Self {
        self.no_data_expression = true;
        self
    }

    fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    fn show(mut self, parameter: &str, values: &[&str]) -> Self {
        self.display_options
            .get_or_insert_with(DisplayOptions::default)
            .show
            .insert(
                parameter.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
        self
    }

    fn choices(mut self, choices: Vec<OptionValue>) -> Self {
        self.options = Some(PropertyOptions::Choices(choices));
        self
    }

    fn fields(mut self, fields: Vec<NodeProperty>) -> Self {
        self.options = Some(PropertyOptions::Fields(fields));
        self
    }

    /// Whether the host shows this property for the selection.
    pub fn is_visible(&self, resource: Resource, operation: Operation) -> bool {
        self.display_options
            .as_ref()
            .map_or(true, |d| d.matches(resource, operation))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CredentialRequirement {
    pub name: String,
    pub required: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub display_name: String,
    pub name: String,
    pub icon: String,
    pub group: Vec<String>,
    pub version: u32,
    pub subtitle: String,
    pub description: String,
    pub defaults: Value,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub credentials: Vec<CredentialRequirement>,
    pub properties: Vec<NodeProperty>,
}

impl NodeDescription {
    pub fn property(&self, name: &str) -> Option<&NodeProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties shown for the selection, in declaration order.
    pub fn visible_properties(&self, resource: Resource, operation: Operation) -> Vec<&NodeProperty> {
        self.properties
            .iter()
            .filter(|p| p.is_visible(resource, operation))
            .collect()
    }
}

fn choice(name: &str, value: &str) -> OptionValue {
    OptionValue {
        name: name.to_string(),
        value: value.to_string(),
        description: None,
        action: None,
    }
}

fn operation_choice(operation: Operation, description: &str, action: &str) -> OptionValue {
    let name = match operation {
        Operation::Create => "Create",
        Operation::Delete => "Delete",
        Operation::Get => "Get",
        Operation::GetAll => "Get Many",
        Operation::Update => "Update",
    };
    OptionValue {
        name: name.to_string(),
        value: operation.as_str().to_string(),
        description: Some(description.to_string()),
        action: Some(action.to_string()),
    }
}

fn crud_operations(singular_pt: &str, plural_pt: &str, singular: &str, plural: &str) -> Vec<OptionValue> {
    vec![
        operation_choice(Operation::Create, &format!("Criar um {}", singular_pt), &format!("Create a {}", singular)),
        operation_choice(Operation::Delete, &format!("Deletar um {}", singular_pt), &format!("Delete a {}", singular)),
        operation_choice(Operation::Get, &format!("Obter um {}", singular_pt), &format!("Get a {}", singular)),
        operation_choice(Operation::GetAll, &format!("Obter muitos {}", plural_pt), &format!("Get many {}", plural)),
        operation_choice(Operation::Update, &format!("Atualizar um {}", singular_pt), &format!("Update a {}", singular)),
    ]
}

fn text_field(display_name: &str, name: &str, description: &str) -> NodeProperty {
    NodeProperty::new(display_name, name, PropertyType::String, json!("")).describe(description)
}

/// The complete Bling node description.
pub fn node_description() -> NodeDescription {
    let contact = Resource::Contact.as_str();
    let product = Resource::Product.as_str();
    let payable = Resource::PayableAccount.as_str();
    let by_id = [Operation::Get.as_str(), Operation::Update.as_str(), Operation::Delete.as_str()];
    let with_body = [Operation::Create.as_str(), Operation::Update.as_str()];

    let properties = vec![
        NodeProperty::new("Resource", "resource", PropertyType::Options, json!(contact))
            .selector()
            .choices(vec![
                choice("Contas a Pagar", payable),
                choice("Contato", contact),
                choice("Produto", product),
            ]),
        NodeProperty::new("Operation", "operation", PropertyType::Options, json!("get"))
            .selector()
            .show("resource", &[contact])
            .choices(crud_operations("contato", "contatos", "contact", "contacts")),
        NodeProperty::new("Operation", "operation", PropertyType::Options, json!("get"))
            .selector()
            .show("resource", &[product])
            .choices(crud_operations("produto", "produtos", "product", "products")),
        NodeProperty::new("Operation", "operation", PropertyType::Options, json!("getAll"))
            .selector()
            .show("resource", &[payable])
            .choices(vec![operation_choice(
                Operation::GetAll,
                "Obter contas a pagar em aberto",
                "Get many payable accounts",
            )]),
        text_field("Contact ID", "contactId", "ID do contato")
            .required()
            .show("resource", &[contact])
            .show("operation", &by_id),
        text_field("Product ID", "productId", "ID do produto")
            .required()
            .show("resource", &[product])
            .show("operation", &by_id),
        NodeProperty::new("Contact Data", "contactData", PropertyType::Collection, json!({}))
            .placeholder("Add Field")
            .show("resource", &[contact])
            .show("operation", &with_body)
            .fields(vec![
                text_field("Nome", "nome", "Nome do contato"),
                text_field("Email", "email", "Email do contato").placeholder("name@email.com"),
                text_field("Telefone", "telefone", "Telefone do contato"),
                text_field("Documento", "documento", "CPF/CNPJ do contato"),
            ]),
        NodeProperty::new("Product Data", "productData", PropertyType::Collection, json!({}))
            .placeholder("Add Field")
            .show("resource", &[product])
            .show("operation", &with_body)
            .fields(vec![
                text_field("Nome", "nome", "Nome do produto"),
                text_field("Código", "codigo", "Código do produto"),
                NodeProperty::new("Preço", "preco", PropertyType::Number, json!(0))
                    .describe("Preço do produto"),
                NodeProperty::new("Situação", "situacao", PropertyType::Options, json!("A"))
                    .describe("Situação do produto")
                    .choices(vec![choice("Ativo", "A"), choice("Inativo", "I")]),
            ]),
        NodeProperty::new("Data Vencimento Final", "dataVencimentoFinal", PropertyType::DateTime, json!(""))
            .describe("Data limite para vencimento das contas (formato YYYY-MM-DD). Se não informado, usa a data atual.")
            .placeholder("Data limite para buscar contas com vencimento até esta data")
            .show("resource", &[payable])
            .show("operation", &[Operation::GetAll.as_str()]),
        NodeProperty {
            type_options: Some(json!({ "minValue": 1 })),
            ..NodeProperty::new("Limit", "limit", PropertyType::Number, json!(DEFAULT_LIMIT))
                .describe("Max number of results to return")
                .show("operation", &[Operation::GetAll.as_str()])
        },
    ];

    NodeDescription {
        display_name: "Bling".to_string(),
        name: "bling".to_string(),
        icon: "file:bling.svg".to_string(),
        group: vec!["output".to_string()],
        version: 1,
        subtitle: "={{$parameter[\"operation\"] + \": \" + $parameter[\"resource\"]}}".to_string(),
        description: "Consume Bling API".to_string(),
        defaults: json!({ "name": "Bling" }),
        inputs: vec!["main".to_string()],
        outputs: vec!["main".to_string()],
        credentials: vec![CredentialRequirement {
            name: CREDENTIAL_NAME.to_string(),
            required: true,
        }],
        properties,
    }
}
