use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::cart::{Cart, CheckoutDetails};
use crate::domain::order::{OrderStatus, PaymentStatus, ShipmentDetails};
use crate::errors::ServiceError;
use crate::projections::OrderFilter;
use crate::state::AppState;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    pub details: CheckoutDetails,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub note: Option<String>,
    pub shipment: Option<ShipmentDetails>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
}

/// Price the submitted lines from the catalog and place the order
pub async fn checkout(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ServiceError> {
    let CheckoutRequest { lines, details } = body.into_inner();

    let mut cart = Cart::new(actor.id);
    for line in lines {
        let product = state.catalog.get_product(line.product_id).await?;
        cart.add(&product, line.quantity)?;
    }

    let order = state.orders.create_order(actor, cart.checkout(details)?).await?;
    Ok(HttpResponse::Created().json(order))
}

pub async fn list_orders(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    filter: web::Query<OrderFilter>,
) -> Result<HttpResponse, ServiceError> {
    let orders = state.orders.list_orders(actor, filter.into_inner()).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn export_orders(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    filter: web::Query<OrderFilter>,
) -> Result<HttpResponse, ServiceError> {
    let csv = state.orders.export_orders(actor, filter.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=\"orders.csv\""))
        .body(csv))
}

pub async fn get_order(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let order = state.orders.get_order(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn order_history(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let history = state.orders.order_history(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn update_status(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let StatusUpdate { status, note, shipment } = body.into_inner();
    let order = state
        .orders
        .update_order_status(actor, path.into_inner(), status, note, shipment)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn cancel(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<CancelRequest>,
) -> Result<HttpResponse, ServiceError> {
    let order = state
        .orders
        .cancel_order(actor, path.into_inner(), body.into_inner().reason)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_item_status(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<ItemStatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let (order_id, item_id) = path.into_inner();
    let order = state
        .orders
        .update_item_status(actor, order_id, item_id, body.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn update_payment_status(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<PaymentStatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let order = state
        .orders
        .update_payment_status(actor, path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn order_delivery(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let order_id = path.into_inner();
    match state.deliveries.delivery_for_order(actor, order_id).await? {
        Some(delivery) => Ok(HttpResponse::Ok().json(delivery)),
        None => Err(ServiceError::not_found("delivery for order", order_id)),
    }
}
