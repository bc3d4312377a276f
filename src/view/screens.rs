//! View presets for the back-office screens.

use super::{SortDirection, ViewConfig, DEFAULT_PAGE_SIZE};

/// Employee list: role lookup, role dropdown, name search.
pub fn employees() -> ViewConfig {
    ViewConfig::new("employees")
        .enrich("role_id", "role_name", "role")
        .search_fields(&["first_name", "last_name"])
        .equality_filter("role", "role_id")
        .sortable(&["first_name", "last_name", "role_name", "email", "created_at"])
        .default_sort("last_name", SortDirection::Ascending)
        .page_size(DEFAULT_PAGE_SIZE)
}

/// Order verification: status chips (multi-select on the resolved label),
/// customer name search, newest first.
pub fn orders() -> ViewConfig {
    ViewConfig::new("orders")
        .enrich("status_id", "status_name", "status")
        .search_fields(&["customer_first_name", "customer_last_name"])
        .multi_filter("status", "status_name")
        .sortable(&["id", "customer_last_name", "total_amount", "status_name"])
        .default_sort("created_at", SortDirection::Descending)
        .page_size(DEFAULT_PAGE_SIZE)
}

/// Inventory: category lookup and dropdown, product name search.
pub fn inventory() -> ViewConfig {
    ViewConfig::new("inventory")
        .enrich_with_fallback("category_id", "category_name", "category", "Uncategorized")
        .search_fields(&["product_name"])
        .equality_filter("category", "category_id")
        .sortable(&["product_name", "category_name", "quantity", "price", "updated_at"])
        .default_sort("product_name", SortDirection::Ascending)
        .page_size(DEFAULT_PAGE_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::reference::{ReferenceCollection, ReferenceEntry};
    use crate::view::DataView;
    use chrono::{Duration, TimeZone, Utc};

    fn order_statuses() -> ReferenceCollection {
        ReferenceCollection::new(
            "status",
            vec![
                ReferenceEntry::new("1", "Pending"),
                ReferenceEntry::new("2", "Verified"),
                ReferenceEntry::new("3", "Cancelled"),
            ],
        )
    }

    fn order_rows() -> Vec<Record> {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let customers = ["Maria Santos", "Jose Rizal", "Andres Cruz", "Maria Clara", "Juan Luna"];
        customers
            .iter()
            .enumerate()
            .flat_map(|(i, name)| {
                let (first, last) = name.split_once(' ').unwrap();
                (1..=3i64).map(move |status| {
                    Record::new()
                        .with("id", (i as i64) * 3 + status)
                        .with("customer_first_name", first)
                        .with("customer_last_name", last)
                        .with("status_id", status)
                        .with("created_at", base + Duration::hours((i as i64) * 3 + status))
                })
            })
            .collect()
    }

    #[test]
    fn test_order_status_chips_exclude_cancelled_regardless_of_search() {
        let mut view = DataView::new(orders().page_size(100));
        view.replace_reference(order_statuses());
        view.replace_records(order_rows());
        view.toggle_multi_filter("status", "Pending");
        let derived = view.toggle_multi_filter("status", "Verified");
        assert_eq!(derived.total_count, 10);
        assert!(derived.rows.iter().all(|r| r.text("status_name") != "Cancelled"));

        for search in ["", "maria", "LUNA", "a"] {
            let derived = view.set_search(search);
            assert!(derived.total_count > 0);
            assert!(derived.rows.iter().all(|r| r.text("status_name") != "Cancelled"));
        }
    }

    #[test]
    fn test_orders_default_newest_first() {
        let mut view = DataView::new(orders());
        view.replace_reference(order_statuses());
        let derived = view.replace_records(order_rows());
        assert_eq!(derived.rows[0].id().as_deref(), Some("15"));
        assert_eq!(derived.total_pages, 2);
    }

    #[test]
    fn test_verified_chip_only() {
        let mut view = DataView::new(orders().page_size(100));
        view.replace_reference(order_statuses());
        view.replace_records(order_rows());
        let derived = view.toggle_multi_filter("status", "Verified");
        assert_eq!(derived.total_count, 5);
        assert!(derived.rows.iter().all(|r| r.text("status_name") == "Verified"));
    }

    #[test]
    fn test_inventory_uses_custom_fallback() {
        let mut view = DataView::new(inventory());
        let derived = view.replace_records(vec![Record::new()
            .with("id", 1i64)
            .with("product_name", "Rice 5kg")
            .with("category_id", 4i64)]);
        assert_eq!(derived.rows[0].text("category_name"), "Uncategorized");
    }

    #[test]
    fn test_employee_preset_reference_dimensions() {
        assert_eq!(employees().reference_dimensions(), vec!["role"]);
        assert_eq!(orders().reference_dimensions(), vec!["status"]);
        assert_eq!(inventory().reference_dimensions(), vec!["category"]);
    }
}
