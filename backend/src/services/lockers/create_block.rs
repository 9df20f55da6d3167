use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::services::lockers::allocator::{BlockAllocator, GridAllocator, Numbering};
use crate::services::lockers::optional_json;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::block::CreatedBlock;
use common::requests::CreateBlockRequest;
use common::responses::ApiResponse;
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Handler for `POST /casillero/bloque`.
///
/// The body is optional; a missing body or `mode` means horizontal numbering.
pub async fn process(
    state: web::Data<AppState>,
    admin: AdminUser,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let request: CreateBlockRequest = optional_json(&body)?;
    let mode = request.mode.unwrap_or(true);
    let allocator = GridAllocator::new(state.config.layout);

    let block = state
        .db
        .run(move |conn| create_block(conn, &allocator, Numbering::from(mode)))
        .await?;

    info!(
        "Block {} created by user {} with {} lockers",
        block.letter,
        admin.0.user_id,
        block.locker_ids.len()
    );
    Ok(HttpResponse::Created().json(ApiResponse::new("Bloque creado correctamente", block)))
}

/// Allocates a block and all its lockers in one `IMMEDIATE` transaction.
pub fn create_block(
    conn: &mut Connection,
    allocator: &dyn BlockAllocator,
    numbering: Numbering,
) -> Result<CreatedBlock, ApiError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let block = allocator.allocate(&tx, numbering)?;
    if block.locker_ids.is_empty() {
        return Err(ApiError::Conflict("No se pudo crear el bloque".to_string()));
    }
    tx.commit()?;
    Ok(block)
}
