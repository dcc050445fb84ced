//! Report aggregation engine
//!
//! Pure transforms from fetched record collections into display-ready report
//! rows. Every function here is stateless: identical input produces identical
//! output, so reports are recomputed on each request and never cached.
//!
//! Degenerate denominators (zero sales, zero selling price, zero old price)
//! yield `0` rather than an error. Records that break an invariant, carry an
//! unresolved reference or push a total past `Decimal`'s range are skipped
//! with a `tracing` warning so a partial report is still produced.

mod consumables;
mod department;
mod price_change;
mod recipe;
mod variance;
mod waste;

pub use consumables::*;
pub use department::*;
pub use price_change::*;
pub use recipe::*;
pub use variance::*;
pub use waste::*;

use rust_decimal::Decimal;

/// Department label for inventory whose department reference did not resolve
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Item label for rows whose inventory reference did not resolve
pub const UNKNOWN_ITEM: &str = "Unknown item";

/// Category label for waste recorded without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// `part / whole × 100`, or zero when `whole` is not positive or the result
/// does not fit in a `Decimal`
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .or_else(|| {
            part.checked_div(whole)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        })
        .unwrap_or(Decimal::ZERO)
}

fn label_or(name: Option<&str>, fallback: &str) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_guards_zero_and_negative_denominators() {
        assert_eq!(percentage(Decimal::from(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage(Decimal::from(5), Decimal::from(-10)), Decimal::ZERO);
        assert_eq!(percentage(Decimal::from(25), Decimal::from(100)), Decimal::from(25));
    }

    #[test]
    fn percentage_of_huge_values_does_not_panic() {
        // Scaling first overflows, dividing first still fits
        assert!(percentage(Decimal::MAX, Decimal::from(1000)) > Decimal::ZERO);
        assert_eq!(percentage(Decimal::MAX, Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn blank_labels_fall_back() {
        assert_eq!(label_or(Some("  "), UNKNOWN_DEPARTMENT), "Unknown");
        assert_eq!(label_or(None, UNKNOWN_ITEM), "Unknown item");
        assert_eq!(label_or(Some(" Bar "), UNKNOWN_DEPARTMENT), "Bar");
    }
}
