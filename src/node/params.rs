//! Per-item node parameters.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::Resource;
use crate::error::NodeError;

/// Default `limite` for list operations.
pub const DEFAULT_LIMIT: i64 = 50;

/// Parameters read for one input item.
///
/// Keys follow the node's parameter names (`contactId`, `contactData`,
/// `dataVencimentoFinal`, ...). Parameters not relevant to the selected
/// operation are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemParameters {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub contact_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_id")]
    pub product_id: Option<String>,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub contact_data: ContactData,

    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub product_data: ProductData,

    /// Upper bound for payable-account due dates, any parseable date format.
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub data_vencimento_final: Option<String>,

    #[serde(default, deserialize_with = "deserialize_limit")]
    pub limit: Option<i64>,
}

impl ItemParameters {
    pub fn from_value(value: Value) -> Result<Self, NodeError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| NodeError::validation(format!("Invalid item parameters: {}", e)))
    }

    /// Entity id for resources addressed by id.
    pub fn id_for(&self, resource: Resource) -> Option<&str> {
        match resource {
            Resource::Contact => self.contact_id.as_deref(),
            Resource::Product => self.product_id.as_deref(),
            Resource::PayableAccount => None,
        }
    }

    /// The `limite` query value: 50 when unset, at least 1.
    pub fn limit(&self) -> Result<i64, NodeError> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) if limit >= 1 => Ok(limit),
            Some(limit) => Err(NodeError::validation(format!(
                "Limit must be at least 1, got {}",
                limit
            ))),
        }
    }
}

/// Body fields for contact create/update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactData {
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    /// CPF or CNPJ.
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub documento: Option<String>,
}

/// Body fields for product create/update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text", skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price", skip_serializing_if = "Option::is_none")]
    pub preco: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situacao: Option<ProductStatus>,
}

/// Product status as Bling encodes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "I")]
    Inactive,
}

/// Ids arrive as strings or bare numbers; blanks count as absent.
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let id = match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a string or number id, got {}",
                other
            )))
        }
    };
    Ok(id.filter(|s| !s.trim().is_empty()))
}

fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// `null` collections behave like absent ones.
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text fields also take numbers and booleans (phone numbers, CPF/CNPJ).
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a text value, got {}",
            other
        ))),
    }
}

/// Prices arrive as numbers or numeric strings; blank strings count as absent.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("price out of range: {}", n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a numeric price, got \"{}\"", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a numeric price, got {}",
            other
        ))),
    }
}

/// Number parameters may come in as integral floats (`50.0`).
fn deserialize_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a numeric limit, got {}",
                other
            )))
        }
    };
    if let Some(limit) = number.as_i64() {
        return Ok(Some(limit));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        _ => Err(serde::de::Error::custom(format!(
            "expected an integer limit, got {}",
            number
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_item_uses_defaults() {
        let params = ItemParameters::from_value(json!({})).unwrap();
        assert!(params.contact_id.is_none());
        assert_eq!(params.limit().unwrap(), 50);
        assert_eq!(params.contact_data, ContactData::default());

        let params = ItemParameters::from_value(Value::Null).unwrap();
        assert!(params.data_vencimento_final.is_none());
    }

    #[test]
    fn test_ids_accept_numbers_and_drop_blanks() {
        let params = ItemParameters::from_value(json!({
            "contactId": 12345,
            "productId": "   "
        }))
        .unwrap();
        assert_eq!(params.id_for(Resource::Contact), Some("12345"));
        assert_eq!(params.id_for(Resource::Product), None);
        assert_eq!(params.id_for(Resource::PayableAccount), None);
    }

    #[test]
    fn test_limit_below_one_is_rejected() {
        let params = ItemParameters::from_value(json!({ "limit": 0 })).unwrap();
        let err = params.limit().unwrap_err();
        assert!(err.is_validation());

        let params = ItemParameters::from_value(json!({ "limit": 7 })).unwrap();
        assert_eq!(params.limit().unwrap(), 7);
    }

    #[test]
    fn test_product_data_omits_unset_fields() {
        let params = ItemParameters::from_value(json!({
            "productData": { "nome": "Caneta", "preco": 2.5, "situacao": "I" }
        }))
        .unwrap();
        assert_eq!(params.product_data.situacao, Some(ProductStatus::Inactive));

        let body = serde_json::to_value(&params.product_data).unwrap();
        assert_eq!(body, json!({ "nome": "Caneta", "preco": 2.5, "situacao": "I" }));
    }

    #[test]
    fn test_integral_float_limit_accepted() {
        let params = ItemParameters::from_value(json!({ "limit": 50.0 })).unwrap();
        assert_eq!(params.limit().unwrap(), 50);

        let err = ItemParameters::from_value(json!({ "limit": 2.5 })).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_numeric_text_fields_coerced() {
        let params = ItemParameters::from_value(json!({
            "contactData": { "nome": "Ana", "telefone": 11999999999u64, "documento": 12345678909u64 }
        }))
        .unwrap();
        assert_eq!(params.contact_data.telefone.as_deref(), Some("11999999999"));
        assert_eq!(params.contact_data.documento.as_deref(), Some("12345678909"));

        let body = serde_json::to_value(&params.contact_data).unwrap();
        assert_eq!(
            body,
            json!({ "nome": "Ana", "telefone": "11999999999", "documento": "12345678909" })
        );
    }

    #[test]
    fn test_null_collections_use_defaults() {
        let params = ItemParameters::from_value(json!({
            "contactData": null,
            "productData": null,
            "limit": null
        }))
        .unwrap();
        assert_eq!(params.contact_data, ContactData::default());
        assert_eq!(params.product_data, ProductData::default());
        assert_eq!(params.limit().unwrap(), 50);
    }

    #[test]
    fn test_price_accepts_numeric_string() {
        let params = ItemParameters::from_value(json!({
            "productData": { "codigo": 42, "preco": "12.50" }
        }))
        .unwrap();
        assert_eq!(params.product_data.preco, Some(12.5));
        assert_eq!(params.product_data.codigo.as_deref(), Some("42"));

        let params = ItemParameters::from_value(json!({ "productData": { "preco": "" } })).unwrap();
        assert!(params.product_data.preco.is_none());

        let err = ItemParameters::from_value(json!({ "productData": { "preco": "caro" } })).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_invalid_item_is_validation_error() {
        let err = ItemParameters::from_value(json!({ "contactId": [1, 2] })).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("Invalid item parameters"));
    }
}
