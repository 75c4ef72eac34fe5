use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::deduction::Deduction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10",
        "name": "Jane Doe",
        "salary": 62000.0,
        "createdAt": "2026-01-01T09:00:00Z",
        "updatedAt": "2026-01-01T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = "6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10")]
    pub id: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = 62000.0)]
    pub salary: f64,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,

    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Employee together with every deduction it owns.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithDeductions {
    pub id: String,
    pub name: String,
    pub salary: f64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
    pub deductions: Vec<Deduction>,
}

impl EmployeeWithDeductions {
    pub fn new(employee: Employee, deductions: Vec<Deduction>) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            salary: employee.salary,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
            deductions,
        }
    }
}

/// Listing row: salary with the derived deduction total and net pay.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "6f1d3c3e-8a7b-4bfa-8a0e-2f5d2f7a9c10",
        "name": "Jane Doe",
        "salary": 400.0,
        "totalDeductions": 100.0,
        "netPay": 300.0
    })
)]
pub struct EmployeeWithNetPay {
    pub id: String,
    pub name: String,
    pub salary: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
}

impl EmployeeWithNetPay {
    pub fn new(employee: Employee, total_deductions: f64) -> Self {
        Self {
            net_pay: crate::payroll::net_pay(employee.salary, total_deductions),
            id: employee.id,
            name: employee.name,
            salary: employee.salary,
            total_deductions,
        }
    }
}
