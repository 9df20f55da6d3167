use crate::error::ApiError;
use crate::services::lockers::receipt::data_uri;
use crate::services::lockers::{map_locker, normalize_letter, LockerRecord, SELECT_LOCKER};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::ListLockersQuery;
use common::responses::ApiResponse;
use rusqlite::{params, Connection};

/// Handler for `GET /casillero?letra=`.
///
/// Receipts go out as `data:` URIs so the listing stays plain JSON.
pub async fn process(
    state: web::Data<AppState>,
    query: web::Query<ListLockersQuery>,
) -> Result<HttpResponse, ApiError> {
    let letter = match query.into_inner().letra.filter(|l| !l.trim().is_empty()) {
        Some(raw) => Some(normalize_letter(&raw)?),
        None => None,
    };

    let lockers = state
        .db
        .run(move |conn| list_lockers(conn, letter.as_deref()))
        .await?
        .into_iter()
        .map(|record| record.into_locker(|bytes| data_uri(&bytes)))
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(ApiResponse::new(
        "Casilleros encontrados correctamente",
        lockers,
    )))
}

/// All lockers ordered by id, optionally restricted to one block.
pub fn list_lockers(conn: &Connection, letter: Option<&str>) -> Result<Vec<LockerRecord>, ApiError> {
    let lockers = match letter {
        Some(letter) => conn
            .prepare(&format!("{} WHERE b.letra = ?1 ORDER BY c.id ASC", SELECT_LOCKER))?
            .query_map(params![letter], map_locker)?
            .collect::<Result<Vec<_>, _>>()?,
        None => conn
            .prepare(&format!("{} ORDER BY c.id ASC", SELECT_LOCKER))?
            .query_map([], map_locker)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    if lockers.is_empty() {
        return Err(ApiError::NotFound("No se encontraron casilleros".to_string()));
    }
    Ok(lockers)
}
