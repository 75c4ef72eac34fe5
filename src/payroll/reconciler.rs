use std::collections::BTreeMap;

use crate::model::deduction::{Deduction, DeductionDraft, DeductionInput, DeductionType};

/// Merges a partial set of deduction changes into the stored deductions.
///
/// Categories missing from `incoming` keep their stored amount. Categories
/// present are replaced by the incoming amount while keeping the stored id;
/// new categories come back without an id. Later entries of a repeated
/// category win. The result is ordered by category.
pub fn reconcile(existing: Vec<Deduction>, incoming: &[DeductionInput]) -> Vec<DeductionDraft> {
    let mut merged: BTreeMap<DeductionType, DeductionDraft> = existing
        .into_iter()
        .map(|d| (d.deduction_type, DeductionDraft::from(d)))
        .collect();

    for change in incoming {
        merged
            .entry(change.deduction_type)
            .and_modify(|draft| draft.deduction_amount = change.deduction_amount)
            .or_insert_with(|| DeductionDraft::from(*change));
    }

    merged.into_values().collect()
}
