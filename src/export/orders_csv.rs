use rust_decimal::Decimal;

use crate::domain::order::Order;
use super::{quoted_line, split_line};

pub const HEADER: &str =
    "Order Number,Customer Name,Customer Email,Date,Status,Payment Status,Subtotal,Shipping,Total,Items Count";

/// One quoted row per order, in the order given
pub fn render(orders: &[Order]) -> String {
    let mut out = String::from(HEADER);
    for order in orders {
        out.push('\n');
        out.push_str(&quoted_line([
            order.order_number.clone(),
            order.contact.name.clone(),
            order.contact.email.clone(),
            order.created_at.format("%Y-%m-%d").to_string(),
            order.status.to_string(),
            order.payment_status.to_string(),
            order.totals.subtotal.to_string(),
            order.totals.shipping_fee.to_string(),
            order.totals.total.to_string(),
            order.items.len().to_string(),
        ]));
    }
    out
}

/// A row read back from an export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedOrder {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub date: String,
    pub status: String,
    pub payment_status: String,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub items_count: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

pub fn parse(text: &str) -> Result<Vec<ExportedOrder>, ParseError> {
    let mut lines = text.lines().enumerate();
    match lines.next() {
        Some((_, header)) if header.trim() == HEADER => {}
        _ => return Err(ParseError { line: 1, reason: "missing header".to_string() }),
    }

    lines
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let number = index + 1;
            let fail = |reason: String| ParseError { line: number, reason };
            let fields = split_line(line);
            if fields.len() != 10 {
                return Err(fail(format!("expected 10 fields, got {}", fields.len())));
            }
            let money = |i: usize| fields[i].parse::<Decimal>().map_err(|e| fail(e.to_string()));

            Ok(ExportedOrder {
                order_number: fields[0].clone(),
                customer_name: fields[1].clone(),
                customer_email: fields[2].clone(),
                date: fields[3].clone(),
                status: fields[4].clone(),
                payment_status: fields[5].clone(),
                subtotal: money(6)?,
                shipping: money(7)?,
                total: money(8)?,
                items_count: fields[9].parse().map_err(|_| fail("bad items count".to_string()))?,
            })
        })
        .collect()
}
