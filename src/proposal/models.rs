use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// A single service line on a proposal.
///
/// Records coming out of the document store were written by UI forms and are
/// not trusted: quantity and unit price tolerate missing, null or string
/// values and fall back to 1 and 0 so a render never sees a NaN.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct ServiceItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        default = "default_qty",
        alias = "quantity",
        deserialize_with = "qty_or_one"
    )]
    #[schema(example = 2.0)]
    pub qty: f64,
    #[serde(default)]
    #[schema(example = "hrs")]
    pub unit: String,
    #[serde(
        default,
        alias = "unitPrice",
        deserialize_with = "price_or_zero"
    )]
    #[schema(example = 500.0)]
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Draft,
    ReadyToSend,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    /// Parse the status text stored on a record; unknown values read as Draft.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ready_to_send" | "ready-to-send" | "readytosend" => Self::ReadyToSend,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Draft,
        }
    }
}

/// A proposal record as supplied by the document store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    #[schema(example = "prop-2041")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, deserialize_with = "services_or_empty")]
    pub services: Vec<ServiceItem>,
    #[serde(default, deserialize_with = "price_or_zero")]
    pub subtotal: f64,
    #[serde(default, deserialize_with = "price_or_zero")]
    pub tax: f64,
    #[serde(default, deserialize_with = "price_or_zero")]
    pub discount: f64,
    #[serde(default, deserialize_with = "price_or_zero")]
    pub total: f64,
    #[serde(default, alias = "termsText")]
    pub terms: String,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ProposalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "inactive" => Self::Inactive,
            _ => Self::Active,
        }
    }
}

/// A client record referenced by `Proposal::client_id`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub preferred_contact_channel: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ClientStatus,
}

/// Branding fields of the user that owns a proposal.
///
/// Owner data is cosmetic: a missing profile renders as empty placeholders,
/// so every field defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, alias = "photoURL")]
    pub photo_url: String,
    #[serde(default, alias = "freelancerField")]
    pub business_field: String,
}

fn default_qty() -> f64 {
    1.0
}

fn lenient_number<'de, D>(deserializer: D, fallback: f64) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(fallback),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(fallback),
        _ => fallback,
    })
}

fn qty_or_one<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer, 1.0)
}

fn price_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer, 0.0)
}

fn services_or_empty<'de, D>(deserializer: D) -> Result<Vec<ServiceItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(services_from_value(value))
}

/// Decode a stored `services` value, dropping anything that is not a
/// well-formed line item and treating a non-array as no services at all.
pub fn services_from_value(value: serde_json::Value) -> Vec<ServiceItem> {
    let serde_json::Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_item_defaults_for_missing_numbers() {
        let item: ServiceItem = serde_json::from_str(r#"{"name": "Design"}"#).unwrap();
        assert_eq!(item.qty, 1.0);
        assert_eq!(item.price, 0.0);
    }

    #[test]
    fn test_service_item_tolerates_string_numbers() {
        let item: ServiceItem =
            serde_json::from_str(r#"{"name": "Dev", "qty": "3", "price": "250.5"}"#).unwrap();
        assert_eq!(item.qty, 3.0);
        assert_eq!(item.price, 250.5);
    }

    #[test]
    fn test_service_item_non_numeric_falls_back() {
        let item: ServiceItem =
            serde_json::from_str(r#"{"qty": "a lot", "price": null}"#).unwrap();
        assert_eq!(item.qty, 1.0);
        assert_eq!(item.price, 0.0);
    }

    #[test]
    fn test_proposal_malformed_services_read_as_empty() {
        let proposal: Proposal =
            serde_json::from_str(r#"{"id": "p1", "services": "oops"}"#).unwrap();
        assert!(proposal.services.is_empty());
    }

    #[test]
    fn test_proposal_aliases() {
        let proposal: Proposal = serde_json::from_str(
            r#"{
                "id": "p1",
                "termsText": "Net 30",
                "services": [{"name": "Design", "quantity": 2, "unitPrice": 500}]
            }"#,
        )
        .unwrap();
        assert_eq!(proposal.terms, "Net 30");
        assert_eq!(proposal.services[0].qty, 2.0);
        assert_eq!(proposal.services[0].price, 500.0);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(ProposalStatus::parse("ready_to_send"), ProposalStatus::ReadyToSend);
        assert_eq!(ProposalStatus::parse("ACCEPTED"), ProposalStatus::Accepted);
        assert_eq!(ProposalStatus::parse("whatever"), ProposalStatus::Draft);
        assert_eq!(ClientStatus::parse("inactive"), ClientStatus::Inactive);
    }
}
