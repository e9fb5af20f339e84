//! CSV extraction: order file contents -> grouped purchase orders.
//!
//! Extraction is all-or-nothing per file. A malformed row or an unusable
//! quantity rejects the whole file so a partially entered order never reaches
//! the portal.

use std::collections::HashMap;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

use crate::error::ExtractError;
use crate::models::order::{LineItem, OrderFile, PurchaseOrder, ShippingInfo};

/// Columns every order file must carry. "Ship To Address 2" is the one
/// optional column and is deliberately absent here.
const REQUIRED_COLUMNS: [&str; 9] = [
    "PO_num",
    "First Name",
    "Last Name",
    "Ship To Address",
    "Ship To City",
    "Ship To State",
    "Ship To Zip",
    "SKU",
    "Qty",
];

#[derive(Debug, Deserialize)]
struct OrderRow {
    #[serde(rename = "PO_num")]
    po_number: String,
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Last Name")]
    last_name: String,
    #[serde(rename = "Ship To Address")]
    address1: String,
    #[serde(rename = "Ship To Address 2", default)]
    address2: Option<String>,
    #[serde(rename = "Ship To City")]
    city: String,
    #[serde(rename = "Ship To State")]
    state: String,
    #[serde(rename = "Ship To Zip")]
    zip: String,
    #[serde(rename = "SKU")]
    sku: String,
    /// Read as text so a bad value fails with the row's SKU attached instead
    /// of a generic deserialize error.
    #[serde(rename = "Qty")]
    quantity: String,
}

/// Parses an order file into purchase orders, grouped by `PO_num`.
///
/// Orders come back in first-seen row order and each keeps its line items in
/// row order. The shipping block is taken from the first row of each group;
/// later rows only contribute line items.
pub fn extract_orders(file: &OrderFile) -> Result<Vec<PurchaseOrder>, ExtractError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(file.contents.as_bytes());

    let headers = reader.headers().map_err(|source| ExtractError::Malformed {
        file: file.name.clone(),
        source,
    })?;
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ExtractError::MissingColumn {
                file: file.name.clone(),
                column: column.to_string(),
            });
        }
    }

    let mut orders: Vec<PurchaseOrder> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, record) in reader.deserialize::<OrderRow>().enumerate() {
        // Header row is line 1.
        let line = i + 2;
        let row = record.map_err(|source| ExtractError::Malformed {
            file: file.name.clone(),
            source,
        })?;

        let quantity = parse_quantity(file, line, &row)?;
        let item = LineItem {
            sku: row.sku,
            quantity,
        };

        match seen.get(&row.po_number) {
            Some(&index) => orders[index].items.push(item),
            None => {
                seen.insert(row.po_number.clone(), orders.len());
                orders.push(PurchaseOrder {
                    po_number: row.po_number,
                    shipping: ShippingInfo {
                        first_name: row.first_name,
                        last_name: row.last_name,
                        address1: row.address1,
                        address2: row.address2.unwrap_or_default(),
                        city: row.city,
                        state: row.state,
                        zip: row.zip,
                    },
                    items: vec![item],
                });
            }
        }
    }

    debug!(
        "📄 Extracted {} purchase order(s) from {}",
        orders.len(),
        file.name
    );
    Ok(orders)
}

fn parse_quantity(file: &OrderFile, line: usize, row: &OrderRow) -> Result<u32, ExtractError> {
    let parsed = row.quantity.parse::<u32>().ok().filter(|&q| q >= 1);
    parsed.ok_or_else(|| ExtractError::InvalidQuantity {
        file: file.name.clone(),
        line,
        sku: row.sku.clone(),
        value: row.quantity.clone(),
    })
}

// ========== tests ==========

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "PO_num,First Name,Last Name,Ship To Address,Ship To Address 2,Ship To City,Ship To State,Ship To Zip,SKU,Qty";

    fn file(lines: &[&str]) -> OrderFile {
        let mut contents = String::from(HEADER);
        for line in lines {
            contents.push('\n');
            contents.push_str(line);
        }
        OrderFile::new("orders_test.csv", contents)
    }

    #[test]
    fn groups_rows_by_po_in_first_seen_order() {
        let file = file(&[
            "P200,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,1",
            "P100,Ben,Ito,9 Elm Ave,Unit 4,Denver,CO,80202,SKU-B,2",
            "P200,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-C,3",
        ]);

        let orders = extract_orders(&file).unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].po_number, "P200");
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].items[0].sku, "SKU-A");
        assert_eq!(orders[0].items[1].sku, "SKU-C");
        assert_eq!(orders[1].po_number, "P100");
        assert_eq!(orders[1].items, vec![LineItem {
            sku: "SKU-B".to_string(),
            quantity: 2,
        }]);
    }

    #[test]
    fn duplicate_skus_stay_distinct_items() {
        let file = file(&[
            "P1,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,1",
            "P1,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,4",
        ]);

        let orders = extract_orders(&file).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].items.len(), 2);
        assert_eq!(orders[0].items[0].quantity, 1);
        assert_eq!(orders[0].items[1].quantity, 4);
    }

    #[test]
    fn shipping_comes_from_first_row_of_group() {
        let file = file(&[
            "P1,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,1",
            "P1,Bob,Other,99 Wrong Rd,,Nowhere,ZZ,00000,SKU-B,1",
        ]);

        let orders = extract_orders(&file).unwrap();

        assert_eq!(orders[0].shipping.first_name, "Ana");
        assert_eq!(orders[0].shipping.address1, "12 Oak St");
        assert_eq!(orders[0].items.len(), 2);
    }

    #[test]
    fn non_numeric_quantity_rejects_whole_file() {
        let file = file(&[
            "P1,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,1",
            "P2,Ben,Ito,9 Elm Ave,,Denver,CO,80202,SKU-B,two",
        ]);

        let err = extract_orders(&file).unwrap_err();

        match err {
            ExtractError::InvalidQuantity { line, sku, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(sku, "SKU-B");
                assert_eq!(value, "two");
            }
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn zero_quantity_rejects_whole_file() {
        let file = file(&["P1,Ana,Reyes,12 Oak St,,Austin,TX,78701,SKU-A,0"]);

        assert!(matches!(
            extract_orders(&file),
            Err(ExtractError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn missing_required_column_names_the_column() {
        let contents = "PO_num,First Name,Last Name,Ship To Address,Ship To City,Ship To State,Ship To Zip,SKU\nP1,Ana,Reyes,12 Oak St,Austin,TX,78701,SKU-A";
        let file = OrderFile::new("orders_test.csv", contents);

        let err = extract_orders(&file).unwrap_err();

        match err {
            ExtractError::MissingColumn { column, .. } => assert_eq!(column, "Qty"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn address2_column_may_be_absent_entirely() {
        let contents = "PO_num,First Name,Last Name,Ship To Address,Ship To City,Ship To State,Ship To Zip,SKU,Qty\nP1,Ana,Reyes,12 Oak St,Austin,TX,78701,SKU-A,2";
        let file = OrderFile::new("orders_test.csv", contents);

        let orders = extract_orders(&file).unwrap();

        assert_eq!(orders[0].shipping.address2, "");
        assert_eq!(orders[0].items[0].quantity, 2);
    }

    #[test]
    fn header_only_file_yields_no_orders() {
        let orders = extract_orders(&file(&[])).unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn short_row_is_malformed() {
        let file = file(&["P1,Ana,Reyes"]);

        assert!(matches!(
            extract_orders(&file),
            Err(ExtractError::Malformed { .. })
        ));
    }
}
