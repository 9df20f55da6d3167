use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::occupancy::BlockOccupancy;
use common::responses::ApiResponse;
use rusqlite::Connection;

const OCCUPANCY_QUERY: &str = r#"
SELECT
    b.letra,
    COUNT(c.id),
    SUM(CASE WHEN c.ocupado THEN 1 ELSE 0 END),
    SUM(CASE WHEN c.ocupado THEN 0 ELSE 1 END),
    ROUND(100.0 * SUM(CASE WHEN c.ocupado THEN 1 ELSE 0 END) / COUNT(c.id), 2)
FROM casilleros c
INNER JOIN bloque b ON c.bloque = b.id
GROUP BY b.letra
ORDER BY b.letra
"#;

pub async fn process(state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse, ApiError> {
    let stats = state.db.run(|conn| occupancy(conn)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Ocupación obtenida correctamente", stats)))
}

/// Per-block totals computed in one grouped query.
pub fn occupancy(conn: &Connection) -> Result<Vec<BlockOccupancy>, ApiError> {
    let stats = conn
        .prepare(OCCUPANCY_QUERY)?
        .query_map([], |row| {
            Ok(BlockOccupancy {
                block: row.get(0)?,
                total: row.get(1)?,
                occupied: row.get(2)?,
                free: row.get(3)?,
                percent: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    if stats.is_empty() {
        return Err(ApiError::NotFound("No se encontraron datos de ocupación".to_string()));
    }
    Ok(stats)
}
