use crate::model::block::Block;
use serde::{Deserialize, Serialize};

/// Identification of whoever currently holds a locker, plus the staff member
/// that touched it last.
///
/// `registered_by` survives a clear; the other fields are wiped by it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    #[serde(rename = "propietario")]
    pub owner_name: Option<String>,
    #[serde(rename = "correo")]
    pub owner_email: Option<String>,
    #[serde(rename = "telefono")]
    pub owner_phone: Option<String>,
    pub registrado_por: Option<String>,
}

/// A locker as it travels over the wire.
///
/// `receipt` never carries raw bytes: listings render it as a `data:` URI and
/// registration responses replace it with a short marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locker {
    pub id: i64,
    #[serde(rename = "bloque")]
    pub block: Block,
    #[serde(rename = "numero")]
    pub number: i64,
    #[serde(rename = "ocupado")]
    pub occupied: bool,
    #[serde(flatten)]
    pub occupant: Occupant,
    #[serde(rename = "comprobante")]
    pub receipt: Option<String>,
}

/// Sparse set of occupant fields sent when registering a locker.
///
/// Only the fields that are `Some` overwrite the stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerUpdate {
    #[serde(rename = "propietario", default)]
    pub owner_name: Option<String>,
    #[serde(rename = "correo", default)]
    pub owner_email: Option<String>,
    #[serde(rename = "telefono", default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub registrado_por: Option<String>,
}

impl LockerUpdate {
    pub fn is_empty(&self) -> bool {
        self.owner_name.is_none()
            && self.owner_email.is_none()
            && self.owner_phone.is_none()
            && self.registrado_por.is_none()
    }

    /// Produces the occupant that results from applying this update on top of
    /// `current`.
    pub fn apply(&self, current: &Occupant) -> Occupant {
        Occupant {
            owner_name: self.owner_name.clone().or_else(|| current.owner_name.clone()),
            owner_email: self.owner_email.clone().or_else(|| current.owner_email.clone()),
            owner_phone: self.owner_phone.clone().or_else(|| current.owner_phone.clone()),
            registrado_por: self
                .registrado_por
                .clone()
                .or_else(|| current.registrado_por.clone()),
        }
    }
}
