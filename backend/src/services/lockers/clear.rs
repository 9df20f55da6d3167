use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::services::lockers::{clearer, normalize_letter, optional_json};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::{ClearBlockRequest, ClearLockerRequest};
use common::responses::{Affected, ApiResponse};
use log::info;
use rusqlite::{params, Connection};

/// Column reset shared by both clears. `?1` is the clearing staff member.
const RESET: &str = "UPDATE casilleros SET ocupado = 0, propietario = NULL, correo = NULL, \
     telefono = NULL, comprobante = NULL, registrado_por = ?1";

/// Handler for `PUT /casillero/clear/{id}`.
pub async fn process_locker(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let request: ClearLockerRequest = optional_json(&body)?;
    let cleared_by = clearer(request.registrado_por, &admin.0);

    let affected = state
        .db
        .run(move |conn| clear_locker(conn, id, &cleared_by))
        .await?;

    info!("Locker {} cleared by user {}", id, admin.0.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        "Casillero limpiado correctamente",
        Affected { affected },
    )))
}

/// Handler for `PUT /casillero/clearbloque`.
pub async fn process_block(
    state: web::Data<AppState>,
    admin: AdminUser,
    payload: web::Json<ClearBlockRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = payload.into_inner();
    let letter = normalize_letter(&request.letra)?;
    let cleared_by = clearer(request.registrado_por, &admin.0);

    let target = letter.clone();
    let affected = state
        .db
        .run(move |conn| clear_block(conn, &target, &cleared_by))
        .await?;

    info!(
        "Block {} cleared ({} lockers) by user {}",
        letter, affected, admin.0.user_id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        "Bloque limpiado correctamente",
        Affected { affected },
    )))
}

/// Frees one locker. Clearing an already free locker still stamps the clearer.
pub fn clear_locker(conn: &Connection, id: i64, cleared_by: &str) -> Result<usize, ApiError> {
    let affected = conn.execute(&format!("{} WHERE id = ?2", RESET), params![cleared_by, id])?;
    if affected == 0 {
        return Err(ApiError::NotFound("No se encontró el casillero".to_string()));
    }
    Ok(affected)
}

/// Frees every locker of a block with a single statement.
pub fn clear_block(conn: &Connection, letter: &str, cleared_by: &str) -> Result<usize, ApiError> {
    let affected = conn.execute(
        &format!(
            "{} WHERE bloque IN (SELECT id FROM bloque WHERE letra = ?2)",
            RESET
        ),
        params![cleared_by, letter],
    )?;
    if affected == 0 {
        return Err(ApiError::NotFound(
            "No se encontraron casilleros para limpiar".to_string(),
        ));
    }
    Ok(affected)
}
