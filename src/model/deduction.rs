use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Closed set of payroll withholding categories.
///
/// A category is the natural key of a deduction within one employee.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeductionType {
    Tax,
    Benefits,
    Union,
    Other,
}

/// Anything carrying a deduction amount that the normalizer may rescale.
pub trait Withholding {
    fn amount(&self) -> f64;
    fn set_amount(&mut self, amount: f64);
}

/// Persisted deduction row.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "0b7c5f8e-3f0a-4d8e-9a53-6a1f0b0f2a11",
    "deductionType": "TAX",
    "deductionAmount": 1200.0
}))]
pub struct Deduction {
    pub id: String,
    #[serde(skip_serializing)]
    pub employee_id: String,
    pub deduction_type: DeductionType,
    pub deduction_amount: f64,
}

/// Deduction as it arrives on the wire: `{deductionType, deductionAmount}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeductionInput {
    #[schema(example = "BENEFITS")]
    pub deduction_type: DeductionType,
    #[schema(example = 8.0)]
    pub deduction_amount: f64,
}

/// Deduction waiting to be upserted.
///
/// `id` is the persisted identity when the category already exists for the
/// employee; new rows get a fresh id at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionDraft {
    pub id: Option<String>,
    pub deduction_type: DeductionType,
    pub deduction_amount: f64,
}

impl From<Deduction> for DeductionDraft {
    fn from(d: Deduction) -> Self {
        Self {
            id: Some(d.id),
            deduction_type: d.deduction_type,
            deduction_amount: d.deduction_amount,
        }
    }
}

impl From<DeductionInput> for DeductionDraft {
    fn from(d: DeductionInput) -> Self {
        Self {
            id: None,
            deduction_type: d.deduction_type,
            deduction_amount: d.deduction_amount,
        }
    }
}

impl Withholding for DeductionDraft {
    fn amount(&self) -> f64 {
        self.deduction_amount
    }

    fn set_amount(&mut self, amount: f64) {
        self.deduction_amount = amount;
    }
}

impl Withholding for DeductionInput {
    fn amount(&self) -> f64 {
        self.deduction_amount
    }

    fn set_amount(&mut self, amount: f64) {
        self.deduction_amount = amount;
    }
}
