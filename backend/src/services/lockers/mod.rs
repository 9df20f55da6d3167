//! # Locker Service Module
//!
//! Blocks of lettered lockers and their occupancy. Every route lives under
//! `/casillero` (itself mounted under `/api/v1`).
//!
//! ## Sub-modules:
//! - `allocator`: picks the next letter and numbers a new block's lockers.
//! - `create_block`, `delete_block`, `letters`: block lifecycle.
//! - `list`, `occupancy`: read side, including per-block statistics.
//! - `register`, `clear`: the FREE/OCCUPIED transitions of a single locker
//!   or a whole block.
//! - `receipt`: validation and re-encoding of proof-of-payment images.

pub mod allocator;
mod clear;
mod create_block;
mod delete_block;
mod letters;
mod list;
mod occupancy;
pub mod receipt;
mod register;

use crate::error::ApiError;
use actix_web::web::{delete, get, patch, post, put, scope};
use actix_web::Scope;
use common::model::block::Block;
use common::model::locker::{Locker, Occupant};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

const API_PATH: &str = "/casillero";

/// Configures the locker routes.
///
/// # Registered Routes:
///
/// * **`POST /bloque`** (admin): allocates the next block, `{mode}` selects
///   horizontal (`true`, default) or vertical numbering.
/// * **`GET /`**: lists lockers, optionally `?letra=`.
/// * **`PATCH /{id}`** and **`PATCH /bloque/{letra}/numero/{numero}`** (auth):
///   multipart registration of an occupant, optional `comprobante` file.
/// * **`PUT /clear/{id}`**, **`PUT /clearbloque`** (admin): frees one locker
///   or every locker of a block.
/// * **`GET /letras`**: letters of the existing blocks.
/// * **`DELETE /bloque/{letra}`** (admin): removes a block and its lockers.
/// * **`GET /ocupacion`** (admin): occupancy per block.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/letras", get().to(letters::process))
        .route("/ocupacion", get().to(occupancy::process))
        .route("/bloque", post().to(create_block::process))
        .route("/bloque/{letra}", delete().to(delete_block::process))
        .route(
            "/bloque/{letra}/numero/{numero}",
            patch().to(register::process_by_label),
        )
        .route("/clearbloque", put().to(clear::process_block))
        .route("/clear/{id}", put().to(clear::process_locker))
        .route("/{id}", patch().to(register::process))
}

/// A locker row as stored, receipt bytes included.
#[derive(Debug, Clone, PartialEq)]
pub struct LockerRecord {
    pub id: i64,
    pub block: Block,
    pub number: i64,
    pub occupied: bool,
    pub occupant: Occupant,
    pub receipt: Option<Vec<u8>>,
}

impl LockerRecord {
    /// Wire form with the receipt mapped through `render`.
    pub fn into_locker(self, render: impl FnOnce(Vec<u8>) -> String) -> Locker {
        Locker {
            id: self.id,
            block: self.block,
            number: self.number,
            occupied: self.occupied,
            occupant: self.occupant,
            receipt: self.receipt.map(render),
        }
    }
}

/// How a caller addresses a single locker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockerTarget {
    Id(i64),
    Label { letter: String, number: i64 },
}

const SELECT_LOCKER: &str = "SELECT c.id, b.id, b.letra, c.numero, c.ocupado, c.propietario, c.correo, \
     c.telefono, c.registrado_por, c.comprobante \
     FROM casilleros c INNER JOIN bloque b ON c.bloque = b.id";

fn map_locker(row: &Row<'_>) -> rusqlite::Result<LockerRecord> {
    Ok(LockerRecord {
        id: row.get(0)?,
        block: Block {
            id: row.get(1)?,
            letter: row.get(2)?,
        },
        number: row.get(3)?,
        occupied: row.get(4)?,
        occupant: Occupant {
            owner_name: row.get(5)?,
            owner_email: row.get(6)?,
            owner_phone: row.get(7)?,
            registrado_por: row.get(8)?,
        },
        receipt: row.get(9)?,
    })
}

pub fn find_locker(conn: &Connection, target: &LockerTarget) -> Result<Option<LockerRecord>, ApiError> {
    let found = match target {
        LockerTarget::Id(id) => conn
            .query_row(&format!("{} WHERE c.id = ?1", SELECT_LOCKER), params![id], map_locker)
            .optional()?,
        LockerTarget::Label { letter, number } => conn
            .query_row(
                &format!("{} WHERE b.letra = ?1 AND c.numero = ?2", SELECT_LOCKER),
                params![letter, number],
                map_locker,
            )
            .optional()?,
    };
    Ok(found)
}

/// Upper-cases a block letter and checks it is a single ASCII letter.
pub fn normalize_letter(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_uppercase().to_string()),
        _ => Err(ApiError::Validation(format!(
            "La letra del bloque debe ser un único carácter A-Z, se recibió '{}'",
            trimmed
        ))),
    }
}

/// Parses an optional JSON body. Only an empty body falls back to the
/// default; anything else must deserialize.
pub fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(format!("JSON inválido: {}", e)))
}

/// Staff name to stamp on a clear: the explicit value if any, else the caller.
fn clearer(explicit: Option<String>, claims: &crate::services::auth::token::Claims) -> String {
    explicit
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| claims.display_name())
}
