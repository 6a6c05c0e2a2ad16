use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::catalog::{Product, ProductRow, ProductStatus};
use super::{quoted_line, split_line};

pub const HEADER: &str = "Name,SKU,Price,Stock,Unit,Status,Category ID,Description";

const MIN_FIELDS: usize = 6;
const DEFAULT_UNIT: &str = "kg";

pub fn render(products: &[Product]) -> String {
    let mut out = String::from(HEADER);
    for product in products {
        out.push('\n');
        out.push_str(&quoted_line([
            product.name.clone(),
            product.sku.clone().unwrap_or_default(),
            product.price.to_string(),
            product.stock.to_string(),
            product.unit.clone(),
            product.status.to_string(),
            product.category_id.to_string(),
            product.description.clone().unwrap_or_default(),
        ]));
    }
    out
}

/// A data line that was not imported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ParsedProducts {
    pub rows: Vec<ProductRow>,
    pub skipped: Vec<SkippedRow>,
}

/// Read an upload; the first line is the header. Bad rows are skipped, never fatal.
pub fn parse(text: &str) -> ParsedProducts {
    let mut parsed = ParsedProducts::default();

    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line) {
            Ok(row) => parsed.rows.push(row),
            Err(reason) => {
                tracing::debug!(line = index + 1, reason = %reason, "Skipping product row");
                parsed.skipped.push(SkippedRow { line: index + 1, reason });
            }
        }
    }
    parsed
}

fn parse_row(line: &str) -> Result<ProductRow, String> {
    let fields = split_line(line);
    if fields.len() < MIN_FIELDS {
        return Err(format!("expected at least {} fields, got {}", MIN_FIELDS, fields.len()));
    }
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");
    let optional = |i: usize| Some(field(i).to_string()).filter(|v| !v.is_empty());

    let name = field(0);
    if name.is_empty() {
        return Err("missing name".to_string());
    }
    let price = field(2)
        .parse::<Decimal>()
        .map_err(|_| format!("invalid price {:?}", field(2)))?;
    let stock = field(3)
        .parse::<u32>()
        .map_err(|_| format!("invalid stock {:?}", field(3)))?;
    let category_id = Uuid::parse_str(field(6)).map_err(|_| format!("invalid category id {:?}", field(6)))?;

    Ok(ProductRow {
        name: name.to_string(),
        sku: optional(1),
        price,
        stock,
        unit: optional(4).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        status: field(5).parse().unwrap_or(ProductStatus::Active),
        category_id,
        description: optional(7),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(name: &str, sku: &str) -> ProductRow {
        ProductRow {
            name: name.to_string(),
            sku: Some(sku.to_string()),
            price: Decimal::new(1_250_050, 2),
            stock: 40,
            unit: "kg".to_string(),
            status: ProductStatus::OutOfStock,
            category_id: Uuid::new_v4(),
            description: Some("Frozen, cleaned, ready to fry".to_string()),
        }
    }

    #[test]
    fn test_export_then_import_is_symmetric() {
        let seller = Uuid::new_v4();
        let products = vec![
            Product::new(seller, row("Sato fillet", "SATO-F"), Utc::now()),
            Product::new(seller, row("Kamba (prawns)", "KMB-L"), Utc::now()),
        ];

        let parsed = parse(&render(&products));
        assert!(parsed.skipped.is_empty());
        let rows: Vec<ProductRow> = products.iter().map(Product::to_row).collect();
        assert_eq!(parsed.rows, rows);
    }

    #[test]
    fn test_short_and_incomplete_rows_are_skipped() {
        let category = Uuid::new_v4();
        let text = format!(
            "{}\n\
             \"Dagaa\",\"DG-1\",\"8000\",\"25\",\"kg\",\"active\",\"{cat}\"\n\
             \"Pweza\",\"PW-1\",\"9000\"\n\
             \"\",\"X\",\"1\",\"1\",\"kg\",\"active\",\"{cat}\"\n\
             \"Ngisi\",\"NG-1\",\"cheap\",\"4\",\"kg\",\"active\",\"{cat}\"\n\
             \"Kolekole\",\"\",\"15000\",\"3\",\"\",\"discontinued\",\"{cat}\"\n",
            HEADER,
            cat = category
        );

        let parsed = parse(&text);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.skipped.iter().map(|s| s.line).collect::<Vec<_>>(), vec![3, 4, 5]);

        let kolekole = &parsed.rows[1];
        assert_eq!(kolekole.sku, None);
        assert_eq!(kolekole.unit, "kg");
        assert_eq!(kolekole.status, ProductStatus::Active);
        assert_eq!(kolekole.category_id, category);
    }

    #[test]
    fn test_missing_category_is_skipped() {
        let text = format!("{}\n\"Dagaa\",\"DG-1\",\"8000\",\"25\",\"kg\",\"active\"\n", HEADER);
        let parsed = parse(&text);
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.skipped[0].reason, "invalid category id \"\"");
    }
}
