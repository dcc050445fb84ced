//! Departmental cost summary

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{label_or, percentage, UNKNOWN_DEPARTMENT};
use crate::models::{InventoryItem, Sale};

/// Cost of goods against sales for one department
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentCostSummary {
    pub cogs: Decimal,
    pub sales: Decimal,
    pub cost_percentage: Decimal,
    pub items: Vec<DepartmentItemLine>,
}

/// An inventory row contributing to a department's cost of goods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentItemLine {
    pub id: Uuid,
    pub name: String,
    pub quantity: Decimal,
    pub cost: Decimal,
    pub value: Decimal,
}

/// Store-wide totals over all inventory and all sales
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreCostTotals {
    pub cogs: Decimal,
    pub sales: Decimal,
    pub cost_percentage: Decimal,
}

/// Departmental cost summary report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentalCostReport {
    /// Keyed by department name, ordered alphabetically
    pub departments: BTreeMap<String, DepartmentCostSummary>,
    pub store: StoreCostTotals,
    /// Sales recorded without a department; counted in `store` only
    pub unattributed_sales: Decimal,
    /// Inventory and sales rows dropped for breaking the non-negative invariant
    /// or overflowing a total
    pub skipped_records: usize,
}

/// Group inventory value by department and set it against sales.
///
/// Sales carrying a department are attributed to that department. Sales
/// without one contribute only to the store totals, so a department's cost
/// percentage is never computed against store-wide sales.
pub fn departmental_cost_summary(inventory: &[InventoryItem], sales: &[Sale]) -> DepartmentalCostReport {
    let mut report = DepartmentalCostReport::default();

    for item in inventory {
        if !item.is_well_formed() {
            tracing::warn!(
                item_id = %item.id,
                quantity = %item.quantity,
                cost = %item.cost,
                "skipping inventory row with negative quantity or cost"
            );
            report.skipped_records += 1;
            continue;
        }

        let department = label_or(item.department.as_deref(), UNKNOWN_DEPARTMENT);
        let department_cogs = report.departments.get(&department).map_or(Decimal::ZERO, |d| d.cogs);
        let totals = item.value().and_then(|value| {
            Some((
                value,
                department_cogs.checked_add(value)?,
                report.store.cogs.checked_add(value)?,
            ))
        });
        let Some((value, department_cogs, store_cogs)) = totals else {
            tracing::warn!(
                item_id = %item.id,
                quantity = %item.quantity,
                cost = %item.cost,
                "skipping inventory row whose value overflows"
            );
            report.skipped_records += 1;
            continue;
        };

        let summary = report.departments.entry(department).or_default();
        summary.cogs = department_cogs;
        summary.items.push(DepartmentItemLine {
            id: item.id,
            name: item.name.clone(),
            quantity: item.quantity,
            cost: item.cost,
            value,
        });
        report.store.cogs = store_cogs;
    }

    for sale in sales {
        let Some(total) = sale.reported_total() else {
            tracing::warn!(
                sale_id = %sale.id,
                food_sales = %sale.food_sales,
                beverage_sales = %sale.beverage_sales,
                "skipping sale whose breakdown overflows"
            );
            report.skipped_records += 1;
            continue;
        };
        if total < Decimal::ZERO {
            tracing::warn!(sale_id = %sale.id, total = %total, "skipping sale with negative total");
            report.skipped_records += 1;
            continue;
        }

        let department = sale.department.as_deref().map(str::trim).filter(|d| !d.is_empty());
        let attributed = match department {
            Some(department) => report.departments.get(department).map_or(Decimal::ZERO, |d| d.sales),
            None => report.unattributed_sales,
        };
        let (Some(attributed), Some(store_sales)) =
            (attributed.checked_add(total), report.store.sales.checked_add(total))
        else {
            tracing::warn!(sale_id = %sale.id, total = %total, "skipping sale that overflows the sales totals");
            report.skipped_records += 1;
            continue;
        };

        report.store.sales = store_sales;
        match department {
            Some(department) => report.departments.entry(department.to_string()).or_default().sales = attributed,
            None => report.unattributed_sales = attributed,
        }
    }

    for summary in report.departments.values_mut() {
        summary.cost_percentage = percentage(summary.cogs, summary.sales);
    }
    report.store.cost_percentage = percentage(report.store.cogs, report.store.sales);

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(department: Option<&str>, quantity: &str, cost: &str) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: "item".to_string(),
            unit: "ea".to_string(),
            category: None,
            department: department.map(str::to_string),
            quantity: dec(quantity),
            cost: dec(cost),
            supplier: None,
            par_level: Decimal::ZERO,
            reorder_point: Decimal::ZERO,
        }
    }

    fn sale(department: Option<&str>, total: &str) -> Sale {
        Sale {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            food_sales: Decimal::ZERO,
            beverage_sales: Decimal::ZERO,
            total_sales: dec(total),
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn kitchen_example() {
        let inventory = vec![
            item(Some("Kitchen"), "10", "2.00"),
            item(Some("Kitchen"), "5", "1.00"),
        ];
        let sales = vec![sale(Some("Kitchen"), "100")];

        let report = departmental_cost_summary(&inventory, &sales);
        let kitchen = &report.departments["Kitchen"];

        assert_eq!(kitchen.cogs, dec("25.00"));
        assert_eq!(kitchen.sales, dec("100"));
        assert_eq!(kitchen.cost_percentage, dec("25"));
        assert_eq!(kitchen.items.len(), 2);
        assert_eq!(report.store.cost_percentage, dec("25"));
    }

    #[test]
    fn unresolved_department_goes_to_unknown() {
        let report = departmental_cost_summary(&[item(None, "3", "4"), item(Some(""), "1", "1")], &[]);
        assert_eq!(report.departments.len(), 1);
        assert_eq!(report.departments[UNKNOWN_DEPARTMENT].cogs, dec("13"));
    }

    #[test]
    fn zero_sales_gives_zero_percentage() {
        let report = departmental_cost_summary(&[item(Some("Bar"), "4", "5")], &[]);
        assert_eq!(report.departments["Bar"].cost_percentage, Decimal::ZERO);
        assert_eq!(report.store.cost_percentage, Decimal::ZERO);
    }

    #[test]
    fn unattributed_sales_only_count_at_store_level() {
        let inventory = vec![item(Some("Bar"), "10", "1")];
        let sales = vec![sale(None, "40"), sale(Some("Bar"), "50")];

        let report = departmental_cost_summary(&inventory, &sales);

        assert_eq!(report.departments["Bar"].sales, dec("50"));
        assert_eq!(report.departments["Bar"].cost_percentage, dec("20"));
        assert_eq!(report.unattributed_sales, dec("40"));
        assert_eq!(report.store.sales, dec("90"));
    }

    #[test]
    fn sales_only_department_has_zero_cogs() {
        let report = departmental_cost_summary(&[], &[sale(Some("Patio"), "80")]);
        let patio = &report.departments["Patio"];
        assert_eq!(patio.cogs, Decimal::ZERO);
        assert_eq!(patio.cost_percentage, Decimal::ZERO);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let inventory = vec![item(Some("Kitchen"), "-2", "3"), item(Some("Kitchen"), "1", "3")];
        let sales = vec![sale(Some("Kitchen"), "-5")];

        let report = departmental_cost_summary(&inventory, &sales);

        assert_eq!(report.skipped_records, 2);
        assert_eq!(report.departments["Kitchen"].cogs, dec("3"));
        assert_eq!(report.departments["Kitchen"].sales, Decimal::ZERO);
    }

    #[test]
    fn zero_total_falls_back_to_food_and_beverage() {
        let mut breakdown_only = sale(Some("Kitchen"), "0");
        breakdown_only.food_sales = dec("60");
        breakdown_only.beverage_sales = dec("15.50");
        let recorded = sale(Some("Kitchen"), "24.50");

        let report = departmental_cost_summary(&[item(Some("Kitchen"), "10", "2.5")], &[breakdown_only, recorded]);

        assert_eq!(report.departments["Kitchen"].sales, dec("100.00"));
        assert_eq!(report.departments["Kitchen"].cost_percentage, dec("25"));
        assert_eq!(report.store.sales, dec("100.00"));
    }

    #[test]
    fn overflowing_rows_are_skipped() {
        let huge = "100000000000000000000";
        let inventory = vec![item(Some("Kitchen"), huge, huge), item(Some("Kitchen"), "2", "3")];

        let report = departmental_cost_summary(&inventory, &[]);

        assert_eq!(report.skipped_records, 1);
        assert_eq!(report.departments["Kitchen"].cogs, dec("6"));
        assert_eq!(report.departments["Kitchen"].items.len(), 1);
        assert_eq!(report.store.cogs, dec("6"));
    }

    #[test]
    fn overflowing_sales_are_skipped() {
        let mut breakdown_only = sale(Some("Bar"), "0");
        breakdown_only.food_sales = Decimal::MAX;
        breakdown_only.beverage_sales = Decimal::MAX;
        let sales = vec![
            sale(None, "10"),
            breakdown_only,
            sale(Some("Bar"), &Decimal::MAX.to_string()),
            sale(None, "1"),
        ];

        let report = departmental_cost_summary(&[], &sales);

        // The breakdown overflows, then MAX overflows the store total of 10
        assert_eq!(report.skipped_records, 2);
        assert_eq!(report.store.sales, dec("11"));
        assert_eq!(report.unattributed_sales, dec("11"));
        assert!(!report.departments.contains_key("Bar"));
    }
}
