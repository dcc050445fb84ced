//! Report engine property tests
//!
//! - Property 1: Departmental totals conserve inventory value and sales
//! - Property 2: Recipe margin plus cost equals selling price
//! - Property 3: Zero denominators never produce a percentage
//! - Property 4: Count variance sign follows counted vs expected
//! - Property 5: Reports are deterministic for the same input
//! - Property 6: Full-range decimals never abort a report

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{CountRecord, IngredientItem, InventoryItem, Recipe, RecipeIngredient, Sale, WasteRecord};
use shared::reports::{
    count_variance_report, departmental_cost_summary, percentage, recipe_cost_report, waste_by_category,
    UNKNOWN_DEPARTMENT,
};
use std::str::FromStr;
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn stock(department: Option<&str>, quantity: Decimal, cost: Decimal) -> InventoryItem {
    InventoryItem {
        id: Uuid::new_v4(),
        name: "stock".to_string(),
        unit: "kg".to_string(),
        category: None,
        department: department.map(str::to_string),
        quantity,
        cost,
        supplier: None,
        par_level: Decimal::ZERO,
        reorder_point: Decimal::ZERO,
    }
}

fn sale(department: Option<&str>, total: Decimal) -> Sale {
    Sale {
        id: Uuid::new_v4(),
        date: day(),
        food_sales: Decimal::ZERO,
        beverage_sales: Decimal::ZERO,
        total_sales: total,
        department: department.map(str::to_string),
    }
}

fn recipe(selling_price: Decimal, lines: &[(Decimal, Decimal)]) -> Recipe {
    Recipe {
        id: Uuid::new_v4(),
        name: "dish".to_string(),
        selling_price,
        ingredients: lines
            .iter()
            .map(|(quantity, cost)| RecipeIngredient {
                id: Uuid::new_v4(),
                quantity: *quantity,
                item: Some(IngredientItem {
                    id: Uuid::new_v4(),
                    name: "ingredient".to_string(),
                    unit: "kg".to_string(),
                    cost: *cost,
                }),
            })
            .collect(),
    }
}

// ============================================================================
// Worked Examples
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Kitchen holds 10 × 2.00 and 5 × 1.00 against 100 of kitchen sales
    #[test]
    fn test_kitchen_cost_percentage() {
        let report = departmental_cost_summary(
            &[
                stock(Some("Kitchen"), dec("10"), dec("2.00")),
                stock(Some("Kitchen"), dec("5"), dec("1.00")),
            ],
            &[sale(Some("Kitchen"), dec("100"))],
        );

        let kitchen = &report.departments["Kitchen"];
        assert_eq!(kitchen.cogs, dec("25"));
        assert_eq!(kitchen.sales, dec("100"));
        assert_eq!(kitchen.cost_percentage, dec("25"));
        assert_eq!(report.store.cost_percentage, dec("25"));
    }

    /// Two ingredients costing 10.00 against a 15.00 price
    #[test]
    fn test_recipe_margin_example() {
        let rows = recipe_cost_report(&[recipe(dec("15.00"), &[(dec("2"), dec("3.00")), (dec("1"), dec("4.00"))])]);

        let row = &rows[0];
        assert_eq!(row.total_cost, dec("10.00"));
        assert_eq!(row.profit_margin_amount, dec("5.00"));
        assert_eq!(row.profit_margin_percentage.round_dp(2), dec("33.33"));
        assert_eq!(row.cost_percentage.round_dp(2), dec("66.67"));
    }

    /// Items without a department land in the Unknown bucket
    #[test]
    fn test_unknown_department_bucket() {
        let report = departmental_cost_summary(&[stock(None, dec("4"), dec("1"))], &[]);

        assert_eq!(report.departments[UNKNOWN_DEPARTMENT].cogs, dec("4"));
        assert_eq!(report.departments[UNKNOWN_DEPARTMENT].cost_percentage, Decimal::ZERO);
    }

    /// Empty inputs give an empty, zeroed report
    #[test]
    fn test_empty_inputs() {
        let report = departmental_cost_summary(&[], &[]);

        assert!(report.departments.is_empty());
        assert_eq!(report.store.cogs, Decimal::ZERO);
        assert_eq!(report.store.cost_percentage, Decimal::ZERO);
        assert!(recipe_cost_report(&[]).is_empty());
        assert!(count_variance_report(&[]).is_empty());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Quantities 0.0 to 1000.0
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=10000i64).prop_map(|n| Decimal::new(n, 1))
    }

    /// Unit prices 0.00 to 1000.00
    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Any representable decimal, including values whose products overflow
    fn full_range_strategy() -> impl Strategy<Value = Decimal> {
        (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28u32)
            .prop_map(|(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale))
    }

    fn department_strategy() -> impl Strategy<Value = Option<&'static str>> {
        prop_oneof![Just(None), Just(Some("Kitchen")), Just(Some("Bar")), Just(Some("Pastry"))]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property 1: Sum of department COGS equals the store COGS equals the
        /// sum of item values, and attributed plus unattributed sales equal
        /// the store sales
        #[test]
        fn prop_departmental_totals_conserve(
            items in prop::collection::vec((department_strategy(), quantity_strategy(), price_strategy()), 0..20),
            sales in prop::collection::vec((department_strategy(), price_strategy()), 0..20)
        ) {
            let inventory: Vec<InventoryItem> = items.iter().map(|(d, q, c)| stock(*d, *q, *c)).collect();
            let sales: Vec<Sale> = sales.iter().map(|(d, t)| sale(*d, *t)).collect();
            let report = departmental_cost_summary(&inventory, &sales);

            let expected_cogs: Decimal = inventory.iter().filter_map(InventoryItem::value).sum();
            let department_cogs: Decimal = report.departments.values().map(|d| d.cogs).sum();
            prop_assert_eq!(department_cogs, expected_cogs);
            prop_assert_eq!(report.store.cogs, expected_cogs);

            let department_sales: Decimal = report.departments.values().map(|d| d.sales).sum();
            let expected_sales: Decimal = sales.iter().filter_map(Sale::reported_total).sum();
            prop_assert_eq!(department_sales + report.unattributed_sales, expected_sales);
            prop_assert_eq!(report.store.sales, expected_sales);

            let line_count: usize = report.departments.values().map(|d| d.items.len()).sum();
            prop_assert_eq!(line_count, inventory.len());
            prop_assert_eq!(report.skipped_records, 0);
        }

        /// Property 2: margin amount + total cost = selling price, and the two
        /// percentages sum to 100 whenever the price is positive
        #[test]
        fn prop_recipe_margin_identity(
            selling_price in price_strategy(),
            lines in prop::collection::vec((quantity_strategy(), price_strategy()), 0..8)
        ) {
            let rows = recipe_cost_report(&[recipe(selling_price, &lines)]);
            let row = &rows[0];

            prop_assert_eq!(row.profit_margin_amount + row.total_cost, row.selling_price);
            prop_assert_eq!(row.ingredient_count, lines.len());
            if selling_price > Decimal::ZERO {
                let sum = (row.profit_margin_percentage + row.cost_percentage).round_dp(6);
                prop_assert_eq!(sum, Decimal::ONE_HUNDRED);
            } else {
                prop_assert_eq!(row.cost_percentage, Decimal::ZERO);
                prop_assert_eq!(row.profit_margin_percentage, Decimal::ZERO);
            }
        }

        /// Property 3: a zero or negative whole always yields 0
        #[test]
        fn prop_percentage_zero_guard(part in price_strategy(), whole in -1000i64..=0i64) {
            prop_assert_eq!(percentage(part, Decimal::new(whole, 2)), Decimal::ZERO);
        }

        /// Property 4: variance = counted - expected, with matching sign
        #[test]
        fn prop_count_variance_sign(expected in quantity_strategy(), counted in quantity_strategy()) {
            let rows = count_variance_report(&[CountRecord {
                id: Uuid::new_v4(),
                item_id: None,
                item_name: Some("Flour".to_string()),
                expected,
                counted,
                date: day(),
                counted_by: None,
            }]);

            prop_assert_eq!(rows[0].variance, counted - expected);
            prop_assert_eq!(rows[0].variance > Decimal::ZERO, counted > expected);
            prop_assert_eq!(rows[0].variance.is_zero(), counted == expected);
        }

        /// Property 5: running a report twice yields byte-identical output
        #[test]
        fn prop_reports_are_deterministic(
            items in prop::collection::vec((department_strategy(), quantity_strategy(), price_strategy()), 0..10),
            waste in prop::collection::vec((department_strategy(), price_strategy()), 0..10)
        ) {
            let inventory: Vec<InventoryItem> = items.iter().map(|(d, q, c)| stock(*d, *q, *c)).collect();
            let first = serde_json::to_string(&departmental_cost_summary(&inventory, &[])).unwrap();
            let second = serde_json::to_string(&departmental_cost_summary(&inventory, &[])).unwrap();
            prop_assert_eq!(first, second);

            let records: Vec<WasteRecord> = waste
                .iter()
                .map(|(category, value)| WasteRecord {
                    id: Uuid::new_v4(),
                    item_id: None,
                    item_name: None,
                    category: category.map(str::to_string),
                    quantity: Decimal::ONE,
                    value: *value,
                    date: day(),
                    reason: None,
                    recorded_by: None,
                })
                .collect();
            let by_category = waste_by_category(&records);
            let category_sum: Decimal = by_category.categories.values().sum();
            prop_assert_eq!(category_sum, by_category.total_value);
            prop_assert_eq!(
                serde_json::to_string(&by_category).unwrap(),
                serde_json::to_string(&waste_by_category(&records)).unwrap()
            );
        }

        /// Property 6: every inventory row and recipe line is either costed
        /// or counted as skipped, whatever the magnitudes involved
        #[test]
        fn prop_full_range_decimals_are_total(
            items in prop::collection::vec(
                (department_strategy(), full_range_strategy(), full_range_strategy()),
                0..10
            ),
            selling_price in full_range_strategy(),
            lines in prop::collection::vec((full_range_strategy(), full_range_strategy()), 0..6)
        ) {
            let inventory: Vec<InventoryItem> = items.iter().map(|(d, q, c)| stock(*d, *q, *c)).collect();
            let report = departmental_cost_summary(&inventory, &[]);
            let line_count: usize = report.departments.values().map(|d| d.items.len()).sum();
            prop_assert_eq!(line_count + report.skipped_records, inventory.len());

            let sales: Vec<Sale> = items.iter().map(|(d, _, total)| sale(*d, *total)).collect();
            let report = departmental_cost_summary(&inventory, &sales);
            prop_assert!(report.store.sales >= Decimal::ZERO);
            prop_assert!(report.store.cost_percentage >= Decimal::ZERO);

            let rows = recipe_cost_report(&[recipe(selling_price, &lines)]);
            prop_assert_eq!(rows[0].ingredient_count + rows[0].skipped_ingredients, lines.len());
        }
    }
}
