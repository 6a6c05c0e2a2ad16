use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::Product;
use crate::domain::order::{CustomerContact, OrderLine, PaymentMethod, PlaceOrder, ShippingAddress};

// ============================================================================
// Cart
// ============================================================================
//
// The customer's basket lives client-side and is handed to checkout as an
// explicit value. Prices are captured when a line is added.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("{0} is not available for purchase")]
    Unavailable(String),

    #[error("Only {available} of {name} in stock, {requested} requested")]
    InsufficientStock { name: String, available: u32, requested: u32 },

    #[error("Product {0} is not in the cart")]
    NotInCart(Uuid),

    #[error("Cart is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Everything checkout needs besides the lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub contact: CustomerContact,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: Uuid,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new(customer_id: Uuid) -> Self {
        Self { customer_id, lines: Vec::new() }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if !product.is_purchasable() {
            return Err(CartError::Unavailable(product.name.clone()));
        }

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let requested = existing.map_or(0, |i| self.lines[i].quantity) + quantity;
        if requested > product.stock {
            return Err(CartError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested,
            });
        }

        match existing {
            Some(i) => self.lines[i].quantity = requested,
            None => self.lines.push(CartLine {
                product_id: product.id,
                seller_id: product.seller_id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Zero removes the line
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CartError::NotInCart(product_id));
        }
        Ok(())
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::total).sum()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Turn the cart into an order request, consuming it
    pub fn checkout(self, details: CheckoutDetails) -> Result<PlaceOrder, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        Ok(PlaceOrder {
            order_id: Uuid::new_v4(),
            customer_id: self.customer_id,
            contact: details.contact,
            lines: self
                .lines
                .into_iter()
                .map(|l| OrderLine {
                    product_id: l.product_id,
                    seller_id: l.seller_id,
                    name: l.name,
                    quantity: l.quantity,
                    unit_price: l.unit_price,
                })
                .collect(),
            shipping_address: details.shipping_address,
            payment_method: details.payment_method,
            notes: details.notes,
            discount: details.discount,
        })
    }
}
