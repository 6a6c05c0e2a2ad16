use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::delivery::{DeliveryPriority, DeliveryStatus, OpenDelivery};
use crate::errors::ServiceError;
use crate::state::AppState;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Defaults to the caller; admins may assign on a distributor's behalf
    pub distributor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: DeliveryStatus,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateUpdate {
    pub estimated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PriorityUpdate {
    pub priority: DeliveryPriority,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<DeliveryStatus>,
}

pub async fn create(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    body: web::Json<OpenDelivery>,
) -> Result<HttpResponse, ServiceError> {
    let delivery = state.deliveries.create_delivery(actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(delivery))
}

pub async fn pending(
    state: web::Data<AppState>,
    Identity(actor): Identity,
) -> Result<HttpResponse, ServiceError> {
    let queue = state.deliveries.list_pending_deliveries(actor).await?;
    Ok(HttpResponse::Ok().json(queue))
}

pub async fn for_distributor(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ServiceError> {
    let deliveries = state
        .deliveries
        .get_distributor_deliveries(actor, path.into_inner(), query.status)
        .await?;
    Ok(HttpResponse::Ok().json(deliveries))
}

pub async fn get(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let delivery = state.deliveries.get_delivery(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(delivery))
}

pub async fn assign(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<AssignRequest>,
) -> Result<HttpResponse, ServiceError> {
    let distributor_id = body.distributor_id.unwrap_or(actor.id);
    let delivery = state
        .deliveries
        .assign_delivery(actor, path.into_inner(), distributor_id)
        .await?;
    Ok(HttpResponse::Ok().json(delivery))
}

pub async fn update_status(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let StatusUpdate { status, note } = body.into_inner();
    let delivery = state
        .deliveries
        .update_delivery_status(actor, path.into_inner(), status, note)
        .await?;
    Ok(HttpResponse::Ok().json(delivery))
}

pub async fn update_estimate(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<EstimateUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let delivery = state
        .deliveries
        .update_estimate(actor, path.into_inner(), body.estimated_time)
        .await?;
    Ok(HttpResponse::Ok().json(delivery))
}

pub async fn reprioritize(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<PriorityUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let delivery = state
        .deliveries
        .reprioritize(actor, path.into_inner(), body.priority)
        .await?;
    Ok(HttpResponse::Ok().json(delivery))
}
