//! Wire models for the turnos backend
//!
//! The backend speaks Spanish JSON keys (`ck_area`, `nombre`, `numero_turno`, ...).
//! Every model accepts both the Spanish key and the English field name so the
//! fixtures and the live API decode the same way. Ids may arrive as JSON
//! numbers or strings; display-only fields that fail to parse become `None`.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A physical service location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(alias = "ck_sucursal", deserialize_with = "number_or_string")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "direccion")]
    pub address: String,
}

impl Branch {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            address: String::new(),
        }
    }
}

/// A department within a branch (billing, technical services, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    #[serde(alias = "ck_area", deserialize_with = "number_or_string")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "codigo")]
    pub code: String,
}

/// A specific procedure offered within an area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(alias = "ck_servicio", deserialize_with = "number_or_string")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default, alias = "codigo")]
    pub code: String,
    /// `Some(true)` for client-only services, `Some(false)` for walk-ins only,
    /// `None` when the service is offered to everyone.
    #[serde(default, alias = "es_cliente", alias = "clientEligibility")]
    pub client_eligibility: Option<bool>,
}

/// A client whose contract passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedClient {
    #[serde(alias = "ck_cliente", deserialize_with = "number_or_string")]
    pub id: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(default, alias = "contrato", deserialize_with = "optional_number_or_string")]
    pub contract: Option<String>,
}

/// An issued queue ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(alias = "ck_turno", deserialize_with = "number_or_string")]
    pub id: String,
    #[serde(
        alias = "numero_turno",
        alias = "numero",
        deserialize_with = "number_or_string"
    )]
    pub number: String,
    #[serde(default, alias = "area", alias = "nombre_area")]
    pub area_name: String,
    #[serde(default, alias = "servicio", alias = "nombre_servicio")]
    pub service_name: String,
    #[serde(default, alias = "sucursal", alias = "nombre_sucursal")]
    pub branch_name: String,
    /// Estimated wait in minutes
    #[serde(default, alias = "tiempo_espera", deserialize_with = "lenient_minutes")]
    pub wait_time: Option<u32>,
    #[serde(default, alias = "fecha_creacion", deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST turnos/crear`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTurnRequest {
    pub ck_area: String,
    pub ck_sucursal: String,
    pub ck_servicio: String,
    pub es_cliente: bool,
    pub ck_cliente: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl From<NumberOrString> for String {
    fn from(raw: NumberOrString) -> Self {
        match raw {
            NumberOrString::Unsigned(n) => n.to_string(),
            NumberOrString::Signed(n) => n.to_string(),
            NumberOrString::Text(s) => s,
        }
    }
}

/// Ids and ticket numbers arrive as either `42` or `"A-042"` depending on the
/// branch setup.
fn number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer).map(String::from)
}

fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<NumberOrString>::deserialize(deserializer)?.map(String::from))
}

/// Display-only field: anything that does not parse as `T` is dropped.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Wait estimates come as `15`, `"15"` or garbage.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse().ok(),
        other => serde_json::from_value(other).ok(),
    })
}
