use serde::{Deserialize, Serialize};

/// Occupancy figures for one block.
///
/// `percent` is `100 * occupied / total`, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockOccupancy {
    #[serde(rename = "bloque")]
    pub block: String,
    #[serde(rename = "casilleros")]
    pub total: i64,
    #[serde(rename = "ocupados")]
    pub occupied: i64,
    #[serde(rename = "libres")]
    pub free: i64,
    #[serde(rename = "ocupacion")]
    pub percent: f64,
}
