use crate::error::ApiError;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::responses::ApiResponse;
use rusqlite::Connection;

pub async fn process(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let letters = state.db.run(|conn| list_letters(conn)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Letras encontradas correctamente", letters)))
}

pub fn list_letters(conn: &Connection) -> Result<Vec<String>, ApiError> {
    let letters = conn
        .prepare("SELECT letra FROM bloque ORDER BY letra ASC")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    if letters.is_empty() {
        return Err(ApiError::NotFound("No se encontraron letras de bloques".to_string()));
    }
    Ok(letters)
}
