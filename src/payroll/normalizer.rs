use crate::model::deduction::Withholding;

/// Caps `deductions` so their sum never exceeds `salary`.
///
/// - an empty list is returned as is
/// - a zero salary forces every amount to zero
/// - a total already within salary is returned untouched
/// - otherwise each amount is scaled by `salary / total` and floored
///
/// Flooring each entry independently can leave the total up to
/// `len - 1` below salary. Inputs are assumed non-negative with categories
/// already de-duplicated.
pub fn normalize<T: Withholding>(salary: f64, mut deductions: Vec<T>) -> Vec<T> {
    if deductions.is_empty() {
        return deductions;
    }

    if salary == 0.0 {
        for deduction in &mut deductions {
            deduction.set_amount(0.0);
        }
        return deductions;
    }

    let total: f64 = deductions.iter().map(Withholding::amount).sum();
    if total <= salary {
        return deductions;
    }

    if total.is_finite() {
        for deduction in &mut deductions {
            // multiply before dividing so exact proportions stay exact
            let product = deduction.amount() * salary;
            let scaled = if product.is_finite() {
                product / total
            } else {
                deduction.amount() * (salary / total)
            };
            deduction.set_amount(scaled.floor());
        }
    } else {
        // the sum overflowed: compare shares of a total shrunk by the entry count
        let len = deductions.len() as f64;
        let shrunk_total: f64 = deductions.iter().map(|d| d.amount() / len).sum();
        let scale = salary / shrunk_total;
        for deduction in &mut deductions {
            let scaled = (deduction.amount() / len) * scale;
            deduction.set_amount(scaled.floor());
        }
    }
    deductions
}
