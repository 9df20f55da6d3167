use serde::{Deserialize, Serialize};

/// A lettered group of lockers, as embedded in every locker returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: i64,
    #[serde(rename = "letra")]
    pub letter: String,
}

/// Result of a block allocation: the new block and the ids of its lockers in
/// physical (row by row) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedBlock {
    pub id: i64,
    #[serde(rename = "letra")]
    pub letter: String,
    #[serde(rename = "casilleros")]
    pub locker_ids: Vec<i64>,
}
