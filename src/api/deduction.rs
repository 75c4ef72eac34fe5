use actix_web::{HttpResponse, web};
use tracing::info;

use crate::error::AppError;
use crate::store::{PayrollStore, StoreError};

/// Delete a single Employee Deduction
#[utoipa::path(
    delete,
    path = "/api/employee-deductions/{deduction_id}",
    params(
        ("deduction_id", Path, description = "Employee deduction ID")
    ),
    responses(
        (status = 204, description = "Deduction deleted"),
        (status = 404, description = "Deduction not found", body = Object, example = json!({
            "message": "Employee deduction with id 0b7c5f8e-3f0a-4d8e-9a53-6a1f0b0f2a11 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Deduction"
)]
pub async fn delete_deduction(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let deduction_id = path.into_inner();

    if !store.delete_deduction(&deduction_id).await? {
        return Err(StoreError::deduction_not_found(&deduction_id).into());
    }

    info!(deduction_id = %deduction_id, "Employee deduction deleted");
    Ok(HttpResponse::NoContent().finish())
}
