//! Validation utilities for the Annu restaurant ERP

use rust_decimal::Decimal;

use crate::models::PurchaseOrderItem;

// ============================================================================
// Stock and Money Validations
// ============================================================================

/// Quantities and prices are never negative
pub fn validate_non_negative(value: Decimal) -> Result<(), &'static str> {
    if value < Decimal::ZERO {
        return Err("Value cannot be negative");
    }
    Ok(())
}

/// Received and ordered quantities must be strictly positive
pub fn validate_positive(value: Decimal) -> Result<(), &'static str> {
    if value <= Decimal::ZERO {
        return Err("Value must be greater than zero");
    }
    Ok(())
}

/// Par level must not sit below the reorder point
pub fn validate_stock_levels(par_level: Decimal, reorder_point: Decimal) -> Result<(), &'static str> {
    validate_non_negative(par_level)?;
    validate_non_negative(reorder_point)?;
    if par_level < reorder_point {
        return Err("Par level cannot be below the reorder point");
    }
    Ok(())
}

/// Every purchase order line needs a name, a positive quantity and a
/// non-negative unit cost
pub fn validate_order_lines(items: &[PurchaseOrderItem]) -> Result<(), &'static str> {
    for item in items {
        if item.name.trim().is_empty() {
            return Err("Order line name is required");
        }
        validate_positive(item.quantity).map_err(|_| "Order line quantity must be greater than zero")?;
        validate_non_negative(item.unit_cost).map_err(|_| "Order line unit cost cannot be negative")?;
    }
    Ok(())
}

/// Food plus beverage must not exceed the recorded total
pub fn validate_sales_breakdown(food: Decimal, beverage: Decimal, total: Decimal) -> Result<(), &'static str> {
    validate_non_negative(food)?;
    validate_non_negative(beverage)?;
    validate_non_negative(total)?;
    match food.checked_add(beverage) {
        Some(breakdown) if breakdown <= total => Ok(()),
        _ => Err("Food and beverage sales exceed the total"),
    }
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !domain.ends_with('.') => Ok(()),
        _ => Err("Invalid email format"),
    }
}

/// Validate password strength: at least 8 characters with an uppercase letter,
/// a lowercase letter, a digit and one of `@$!%*?&`
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| "@$!%*?&".contains(c));
    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(
            "Password must contain an uppercase letter, a lowercase letter, a number and a special character",
        );
    }
    Ok(())
}

/// Display names need at least two visible characters
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().chars().count() < 2 {
        return Err("Name must be at least 2 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(name: &str, quantity: &str, unit_cost: &str) -> PurchaseOrderItem {
        PurchaseOrderItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            quantity: dec(quantity),
            unit_cost: dec(unit_cost),
            inventory_item_id: None,
            received_quantity: Decimal::ZERO,
        }
    }

    #[test]
    fn test_non_negative() {
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(dec("-0.01")).is_err());
    }

    #[test]
    fn test_stock_levels() {
        assert!(validate_stock_levels(dec("20"), dec("5")).is_ok());
        assert!(validate_stock_levels(dec("5"), dec("5")).is_ok());
        assert!(validate_stock_levels(dec("4"), dec("5")).is_err());
        assert!(validate_stock_levels(dec("-1"), dec("0")).is_err());
    }

    #[test]
    fn test_order_lines() {
        assert!(validate_order_lines(&[line("Basil", "2", "1.25")]).is_ok());
        assert!(validate_order_lines(&[line(" ", "2", "1.25")]).is_err());
        assert!(validate_order_lines(&[line("Basil", "0", "1.25")]).is_err());
        assert!(validate_order_lines(&[line("Basil", "1", "-1")]).is_err());
    }

    #[test]
    fn test_sales_breakdown() {
        assert!(validate_sales_breakdown(dec("60"), dec("40"), dec("100")).is_ok());
        assert!(validate_sales_breakdown(dec("60"), dec("40"), dec("120")).is_ok());
        assert!(validate_sales_breakdown(dec("80"), dec("40"), dec("100")).is_err());
        assert!(validate_sales_breakdown(Decimal::MAX, Decimal::MAX, Decimal::MAX).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("chef@annu.co").is_ok());
        assert!(validate_email("chef@annu").is_err());
        assert!(validate_email("@annu.co").is_err());
        assert!(validate_email("chef.annu.co").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Passw0rd!").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("password1!").is_err());
        assert!(validate_password("Password!!").is_err());
        assert!(validate_password("Password11").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name(" A ").is_err());
    }
}
