use crate::api::employee::{CreateEmployee, UpdateEmployee};
use crate::model::deduction::{Deduction, DeductionInput, DeductionType};
use crate::model::employee::{Employee, EmployeeWithDeductions, EmployeeWithNetPay};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll HR API",
        version = "1.0.0",
        description = r#"
## Employee payroll records

Keeps employee records and their payroll deductions and reports net pay.

### 🔹 Deduction rules
- Deduction types: **TAX**, **BENEFITS**, **UNION**, **OTHER**; at most one of each per employee
- The sum of an employee's deductions never exceeds their salary
  - zero salary → every deduction is zero
  - over salary → each deduction is scaled by `salary / total` and floored
- A partial update merges the sent deductions into the stored ones by type and
  caps the result against the salary after the update

### 📦 Response Format
- JSON with camelCase keys
- Errors are `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::deduction::delete_deduction
    ),
    components(
        schemas(
            CreateEmployee,
            UpdateEmployee,
            Employee,
            EmployeeWithDeductions,
            EmployeeWithNetPay,
            Deduction,
            DeductionInput,
            DeductionType
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Deduction", description = "Payroll deduction APIs"),
    )
)]
pub struct ApiDoc;
