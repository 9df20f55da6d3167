//! # Locker Registration
//!
//! Assigns an occupant to a locker, or updates the occupant of one that is
//! already taken. Backs both `PATCH /casillero/{id}` and
//! `PATCH /casillero/bloque/{letra}/numero/{numero}`.
//!
//! ## Workflow
//!
//! 1. **Multipart parsing**: text parts `propietario`, `correo`, `telefono` and
//!    `registrado_por` form a sparse [`LockerUpdate`]; an optional `comprobante`
//!    file part carries the proof of payment. Its declared content type is
//!    used, falling back to a guess from the filename.
//! 2. **Validation**: supplied fields are checked and the receipt type is
//!    matched against the allow-list. Nothing has been written yet.
//! 3. **Encoding**: the receipt is shrunk and re-encoded on the blocking pool.
//! 4. **Persistence**: the locker is looked up, the update merged on top of
//!    the stored occupant (a free locker needs at least `propietario`), `ocupado` forced to true, and the row saved.
//!    Concurrent registrations of the same locker resolve last-writer-wins.
//! 5. **Response**: the message depends on whether the locker was free before;
//!    the receipt bytes are replaced by a marker.

use crate::error::ApiError;
use crate::services::auth::guard::AuthUser;
use crate::services::lockers::receipt::{self, ReceiptUpload, RECEIPT_MARKER};
use crate::services::lockers::{find_locker, normalize_letter, LockerRecord, LockerTarget};
use crate::services::users::is_valid_email;
use crate::state::AppState;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use common::model::locker::LockerUpdate;
use common::responses::ApiResponse;
use futures_util::StreamExt;
use log::info;
use regex::Regex;
use rusqlite::{params, Connection, TransactionBehavior};
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));

/// Text parts are short; anything beyond this is not a name or an email.
const MAX_TEXT_FIELD: usize = 1024;

/// Whether a registration allocated a free locker or rewrote an occupied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Assigned,
    Updated,
}

impl Registration {
    pub fn message(self) -> &'static str {
        match self {
            Registration::Assigned => "Registro exitoso. Casillero asignado correctamente.",
            Registration::Updated => "Actualización exitosa. Datos del casillero actualizados.",
        }
    }
}

pub async fn process(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    register(state, user, LockerTarget::Id(id.into_inner()), payload).await
}

pub async fn process_by_label(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(String, i64)>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (letter, number) = path.into_inner();
    let target = LockerTarget::Label {
        letter: normalize_letter(&letter)?,
        number,
    };
    register(state, user, target, payload).await
}

async fn register(
    state: web::Data<AppState>,
    user: AuthUser,
    target: LockerTarget,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let policy = state.config.receipts;
    let (update, upload) = read_form(payload, policy.max_bytes).await?;
    if update.is_empty() && upload.is_none() {
        return Err(ApiError::Validation(
            "No se enviaron datos para registrar el casillero".to_string(),
        ));
    }
    validate_update(&update)?;

    let receipt = match upload {
        Some(upload) => Some(receipt::encode_on_pool(upload, policy).await?),
        None => None,
    };

    let (outcome, record) = state
        .db
        .run(move |conn| register_locker(conn, &target, &update, receipt))
        .await?;

    info!(
        "Locker {} (block {}, #{}) {:?} by user {}",
        record.id, record.block.letter, record.number, outcome, user.0.user_id
    );
    let locker = record.into_locker(|_| RECEIPT_MARKER.to_string());
    Ok(HttpResponse::Ok().json(ApiResponse::new(outcome.message(), locker)))
}

/// Merges `update` (and `receipt`, when given) into the target locker and
/// marks it occupied.
pub fn register_locker(
    conn: &mut Connection,
    target: &LockerTarget,
    update: &LockerUpdate,
    receipt: Option<Vec<u8>>,
) -> Result<(Registration, LockerRecord), ApiError> {
    // IMMEDIATE takes the write lock up front, so concurrent registrations
    // queue on the busy timeout instead of failing the read-to-write upgrade.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = find_locker(&tx, target)?
        .ok_or_else(|| ApiError::NotFound("No se encontró el casillero".to_string()))?;

    let outcome = if current.occupied {
        Registration::Updated
    } else if update.owner_name.is_none() {
        return Err(ApiError::Validation(
            "Se requiere el propietario para asignar un casillero libre".to_string(),
        ));
    } else {
        Registration::Assigned
    };

    let saved = LockerRecord {
        occupied: true,
        occupant: update.apply(&current.occupant),
        receipt: receipt.or(current.receipt),
        ..current
    };

    tx.execute(
        "UPDATE casilleros SET ocupado = 1, propietario = ?1, correo = ?2, telefono = ?3, \
         registrado_por = ?4, comprobante = ?5 WHERE id = ?6",
        params![
            saved.occupant.owner_name,
            saved.occupant.owner_email,
            saved.occupant.owner_phone,
            saved.occupant.registrado_por,
            saved.receipt,
            saved.id
        ],
    )?;
    tx.commit()?;
    Ok((outcome, saved))
}

/// Checks the fields a client actually sent.
pub fn validate_update(update: &LockerUpdate) -> Result<(), ApiError> {
    let fields = [
        ("propietario", &update.owner_name),
        ("correo", &update.owner_email),
        ("telefono", &update.owner_phone),
        ("registrado_por", &update.registrado_por),
    ];
    for (name, value) in fields {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(ApiError::Validation(format!("El campo {} no puede estar vacío", name)));
        }
    }
    if let Some(email) = &update.owner_email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation(
                "El correo debe ser un correo electrónico válido".to_string(),
            ));
        }
    }
    if let Some(phone) = &update.owner_phone {
        if !PHONE_RE.is_match(phone.trim()) {
            return Err(ApiError::Validation(
                "Se debe ingresar un numero de teléfono válido".to_string(),
            ));
        }
    }
    Ok(())
}

async fn read_form(
    mut payload: Multipart,
    max_receipt_bytes: usize,
) -> Result<(LockerUpdate, Option<ReceiptUpload>), ApiError> {
    let mut update = LockerUpdate::default();
    let mut upload = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("comprobante") => {
                let declared = field.content_type().map(|m| m.essence_str().to_string());
                let guessed = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .and_then(|f| mime_guess::from_path(f).first())
                    .map(|m| m.essence_str().to_string());
                let content_type = declared
                    .filter(|ct| ct != "application/octet-stream")
                    .or(guessed)
                    .unwrap_or_default();

                // Reject before buffering the whole file.
                receipt::check_content_type(&content_type)?;
                let bytes = read_bytes(&mut field, max_receipt_bytes, "comprobante").await?;
                if !bytes.is_empty() {
                    upload = Some(ReceiptUpload {
                        content_type,
                        bytes,
                    });
                }
            }
            Some(text @ ("propietario" | "correo" | "telefono" | "registrado_por")) => {
                let text = text.to_string();
                let bytes = read_bytes(&mut field, MAX_TEXT_FIELD, &text).await?;
                let value = String::from_utf8(bytes).map_err(|_| {
                    ApiError::Validation(format!("El campo {} no es UTF-8 válido", text))
                })?;
                let slot = match text.as_str() {
                    "propietario" => &mut update.owner_name,
                    "correo" => &mut update.owner_email,
                    "telefono" => &mut update.owner_phone,
                    _ => &mut update.registrado_por,
                };
                *slot = Some(value.trim().to_string());
            }
            _ => {}
        }
    }

    Ok((update, upload))
}

async fn read_bytes(field: &mut Field, limit: usize, name: &str) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::Validation(format!(
                "El campo {} excede el tamaño máximo de {} bytes",
                name, limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_malformed_fields_are_rejected() {
        let blank = LockerUpdate {
            owner_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_update(&blank), Err(ApiError::Validation(_))));

        let bad_email = LockerUpdate {
            owner_email: Some("ana.uni.cl".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_update(&bad_email), Err(ApiError::Validation(_))));

        let bad_phone = LockerUpdate {
            owner_phone: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_update(&bad_phone), Err(ApiError::Validation(_))));
    }

    #[test]
    fn complete_update_passes() {
        let update = LockerUpdate {
            owner_name: Some("Ana Pérez".to_string()),
            owner_email: Some("ana@uni.cl".to_string()),
            owner_phone: Some("5512345678".to_string()),
            registrado_por: Some("staff1".to_string()),
        };
        assert!(validate_update(&update).is_ok());
        assert!(validate_update(&LockerUpdate::default()).is_ok());
    }

    #[test]
    fn messages_differ_per_outcome() {
        assert_ne!(Registration::Assigned.message(), Registration::Updated.message());
    }
}
