use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::deduction::{Deduction, DeductionInput};
use crate::model::employee::{EmployeeWithDeductions, EmployeeWithNetPay};
use crate::payroll;
use crate::store::{EmployeeChanges, NewEmployee, PayrollStore, StoreError};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = 62000.0)]
    pub salary: f64,
    #[serde(default)]
    pub deductions: Vec<DeductionInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployee {
    #[schema(example = "Jane Roe")]
    pub name: Option<String>,
    #[schema(example = 64000.0)]
    pub salary: Option<f64>,
    pub deductions: Option<Vec<DeductionInput>>,
}

fn check_amount(field: &str, value: f64) -> Result<(), AppError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(format!("{field} must be >= 0")))
    }
}

fn check_deductions(deductions: &[DeductionInput]) -> Result<(), AppError> {
    deductions
        .iter()
        .try_for_each(|d| check_amount("Deduction amount", d.deduction_amount))
}

impl CreateEmployee {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        check_amount("Salary", self.salary)?;
        check_deductions(&self.deductions)
    }
}

impl UpdateEmployee {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(salary) = self.salary {
            check_amount("Salary", salary)?;
        }
        check_deductions(self.deductions.as_deref().unwrap_or_default())
    }

    /// A blank name means "leave the name alone".
    fn changes(&self) -> EmployeeChanges {
        EmployeeChanges {
            name: self
                .name
                .as_ref()
                .filter(|name| !name.trim().is_empty())
                .cloned(),
            salary: self.salary,
        }
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created with normalized deductions", body = EmployeeWithDeductions),
        (status = 400, description = "Invalid payload or duplicate name", body = Object, example = json!({
            "message": "An employee with that name already exists."
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    store: web::Data<dyn PayrollStore>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    payload.validate()?;

    let deductions = payroll::settle_new(payload.salary, &payload.deductions);
    let created = store
        .create_employee(
            NewEmployee {
                name: payload.name,
                salary: payload.salary,
            },
            deductions,
        )
        .await?;

    info!(employee_id = %created.id, "Employee created");
    Ok(HttpResponse::Created().json(created))
}

/// List employees with net pay
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Employees with total deductions and net pay", body = [EmployeeWithNetPay]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(store: web::Data<dyn PayrollStore>) -> Result<HttpResponse, AppError> {
    let employees = store.list_employees().await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeWithDeductions),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee with id 6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    let employee = store.find_employee(&employee_id).await?;
    let deductions = store.deductions_for_employee(&employee_id).await?;

    Ok(HttpResponse::Ok().json(EmployeeWithDeductions::new(employee, deductions)))
}

/// Update Employee
///
/// Deductions sent here are merged into the stored ones by type, then the whole
/// set is capped against the salary the employee has after this update.
#[utoipa::path(
    patch,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee with every deduction after normalization", body = EmployeeWithDeductions),
        (status = 400, description = "Invalid payload or duplicate name"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee with id 6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn update_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
    body: web::Json<UpdateEmployee>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    let body = body.into_inner();
    body.validate()?;

    let changes = body.changes();
    if changes.is_empty() && body.deductions.is_none() {
        warn!(employee_id = %employee_id, "No updates provided, re-settling stored deductions");
    }

    let incoming = body.deductions.unwrap_or_default();
    let settle = move |salary: f64, existing: Vec<Deduction>| {
        payroll::settle_update(salary, existing, &incoming)
    };

    let updated = store
        .update_employee(&employee_id, changes, &settle)
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 204, description = "Employee and its deductions deleted"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee with id 6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10 not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    store: web::Data<dyn PayrollStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    if !store.delete_employee(&employee_id).await? {
        return Err(StoreError::employee_not_found(&employee_id).into());
    }

    info!(employee_id = %employee_id, "Employee deleted");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test, web};
    use serde_json::{Value, json};

    use crate::routes;
    use crate::store::{MemoryStore, PayrollStore};

    fn memory_store() -> web::Data<dyn PayrollStore> {
        web::Data::from(Arc::new(MemoryStore::new()) as Arc<dyn PayrollStore>)
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data($store.clone())
                    .service(web::scope("/api").configure(routes::api_routes)),
            )
            .await
        };
    }

    fn amount_of(body: &Value, category: &str) -> Option<f64> {
        body["deductions"]
            .as_array()?
            .iter()
            .find(|d| d["deductionType"] == category)?["deductionAmount"]
            .as_f64()
    }

    #[actix_web::test]
    async fn create_keeps_deductions_within_salary() {
        let store = memory_store();
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(json!({
                "name": "HelperUser",
                "salary": 62000,
                "deductions": [{"deductionType": "BENEFITS", "deductionAmount": 8}]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["name"], "HelperUser");
        assert_eq!(body["salary"], 62000.0);
        assert!(body["id"].is_string());
        assert_eq!(amount_of(&body, "BENEFITS"), Some(8.0));
    }

    #[actix_web::test]
    async fn create_without_deductions_returns_empty_list() {
        let store = memory_store();
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(json!({"name": "HelperUser", "salary": 62000}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["deductions"], json!([]));
    }

    #[actix_web::test]
    async fn create_caps_deductions_above_salary() {
        let store = memory_store();
        let app = app!(store);

        let req = test::TestRequest::post()
            .uri("/api/employees")
            .set_json(json!({
                "name": "Capped",
                "salary": 400,
                "deductions": [
                    {"deductionType": "TAX", "deductionAmount": 333},
                    {"deductionType": "UNION", "deductionAmount": 167}
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(amount_of(&body, "TAX"), Some(266.0));
        assert_eq!(amount_of(&body, "UNION"), Some(133.0));
    }

    #[actix_web::test]
    async fn create_rejects_invalid_payloads() {
        let store = memory_store();
        let app = app!(store);

        for payload in [
            json!({"name": "", "salary": 10}),
            json!({"name": "Neg", "salary": -1}),
            json!({"name": "Neg", "salary": 10, "deductions": [{"deductionType": "TAX", "deductionAmount": -5}]}),
            json!({"name": "Odd", "salary": 10, "deductions": [{"deductionType": "BONUS", "deductionAmount": 5}]}),
            json!({"salary": 10}),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/employees")
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body: Value = test::read_body_json(resp).await;
            assert!(body["message"].is_string());
        }
    }

    #[actix_web::test]
    async fn create_rejects_duplicate_name() {
        let store = memory_store();
        let app = app!(store);

        for expected in [StatusCode::CREATED, StatusCode::BAD_REQUEST] {
            let req = test::TestRequest::post()
                .uri("/api/employees")
                .set_json(json!({"name": "Twin", "salary": 10}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    async fn seed(store: &web::Data<dyn PayrollStore>, name: &str, salary: f64, tax: Option<f64>) -> String {
        let deductions = tax
            .map(|amount| {
                vec![crate::model::deduction::DeductionDraft {
                    id: None,
                    deduction_type: crate::model::deduction::DeductionType::Tax,
                    deduction_amount: amount,
                }]
            })
            .unwrap_or_default();
        store
            .create_employee(
                crate::store::NewEmployee {
                    name: name.into(),
                    salary,
                },
                deductions,
            )
            .await
            .unwrap()
            .id
    }

    async fn patch(store: &web::Data<dyn PayrollStore>, id: &str, payload: Value) -> (StatusCode, Value) {
        let app = app!(store);
        let req = test::TestRequest::patch()
            .uri(&format!("/api/employees/{id}"))
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_web::test]
    async fn update_changes_name_and_salary() {
        let store = memory_store();
        let id = seed(&store, "test User 3", 200.0, None).await;

        let (status, body) = patch(&store, &id, json!({"name": "HelperUser 3", "salary": 100})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["name"], "HelperUser 3");
        assert_eq!(body["salary"], 100.0);
    }

    #[actix_web::test]
    async fn update_replaces_touched_deduction_and_keeps_identity() {
        let store = memory_store();
        let id = seed(&store, "test User", 400.0, Some(100.0)).await;
        let tax_id = store.deductions_for_employee(&id).await.unwrap()[0].id.clone();

        let (status, body) = patch(
            &store,
            &id,
            json!({"deductions": [{"deductionType": "TAX", "deductionAmount": 50}]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deductions"][0]["id"], tax_id.as_str());
        assert_eq!(amount_of(&body, "TAX"), Some(50.0));
    }

    #[actix_web::test]
    async fn update_keeps_untouched_categories() {
        let store = memory_store();
        let id = seed(&store, "test User", 1000.0, Some(100.0)).await;

        let (_, body) = patch(
            &store,
            &id,
            json!({"deductions": [{"deductionType": "UNION", "deductionAmount": 50}]}),
        )
        .await;

        assert_eq!(amount_of(&body, "TAX"), Some(100.0));
        assert_eq!(amount_of(&body, "UNION"), Some(50.0));
    }

    #[actix_web::test]
    async fn update_caps_deduction_raised_past_salary() {
        let store = memory_store();
        let id = seed(&store, "test User", 400.0, Some(100.0)).await;

        let (status, body) = patch(
            &store,
            &id,
            json!({"deductions": [{"deductionType": "TAX", "deductionAmount": 450}]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(amount_of(&body, "TAX"), Some(400.0));
    }

    #[actix_web::test]
    async fn update_to_zero_salary_zeroes_deductions() {
        let store = memory_store();
        let id = seed(&store, "test User", 400.0, Some(100.0)).await;

        let (status, body) = patch(&store, &id, json!({"salary": 0})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["salary"], 0.0);
        assert_eq!(amount_of(&body, "TAX"), Some(0.0));
    }

    #[actix_web::test]
    async fn update_settles_new_salary_and_new_deductions_together() {
        let store = memory_store();
        let id = seed(&store, "test User", 1000.0, Some(100.0)).await;

        // 300 + 100 against the new salary of 200 -> scale 0.5
        let (_, body) = patch(
            &store,
            &id,
            json!({
                "salary": 200,
                "deductions": [{"deductionType": "BENEFITS", "deductionAmount": 300}]
            }),
        )
        .await;

        assert_eq!(amount_of(&body, "BENEFITS"), Some(150.0));
        assert_eq!(amount_of(&body, "TAX"), Some(50.0));
    }

    #[actix_web::test]
    async fn update_rejects_renaming_to_another_employees_name() {
        let store = memory_store();
        let first = seed(&store, "First", 400.0, None).await;
        let second = seed(&store, "Second", 300.0, None).await;

        let (status, body) = patch(&store, &first, json!({"name": "Second", "salary": 10})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "An employee with that name already exists.");

        let kept = store.find_employee(&first).await.unwrap();
        assert_eq!(kept.name, "First");
        assert_eq!(kept.salary, 400.0);
        let other = store.find_employee(&second).await.unwrap();
        assert_eq!(other.name, "Second");
        assert_eq!(other.salary, 300.0);
    }

    #[actix_web::test]
    async fn update_with_own_name_succeeds() {
        let store = memory_store();
        let id = seed(&store, "Same", 400.0, None).await;

        let (status, body) = patch(&store, &id, json!({"name": "Same", "salary": 500})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Same");
        assert_eq!(body["salary"], 500.0);
    }

    #[actix_web::test]
    async fn update_ignores_blank_name() {
        let store = memory_store();
        let id = seed(&store, "Keeper", 400.0, None).await;

        let (status, body) = patch(&store, &id, json!({"name": "  "})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Keeper");
    }

    #[actix_web::test]
    async fn update_unknown_employee_is_not_found() {
        let store = memory_store();

        let (status, body) = patch(&store, "missing", json!({"name": "New Name"})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[actix_web::test]
    async fn get_and_list_report_deductions_and_net_pay() {
        let store = memory_store();
        let id = seed(&store, "test Userton", 400.0, Some(100.0)).await;
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "test Userton");
        assert_eq!(amount_of(&body, "TAX"), Some(100.0));

        let req = test::TestRequest::get().uri("/api/employees").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["totalDeductions"], 100.0);
        assert_eq!(body[0]["netPay"], 300.0);
    }

    #[actix_web::test]
    async fn get_unknown_employee_is_not_found() {
        let store = memory_store();
        let app = app!(store);

        let req = test::TestRequest::get()
            .uri("/api/employees/missing")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn delete_removes_employee_and_deductions() {
        let store = memory_store();
        let id = seed(&store, "Test User", 400.0, Some(100.0)).await;
        let app = app!(store);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(store.deductions_for_employee(&id).await.unwrap().is_empty());

        let req = test::TestRequest::delete()
            .uri(&format!("/api/employees/{id}"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
