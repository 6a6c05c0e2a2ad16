use actix_web::{http::header, web, HttpResponse};
use uuid::Uuid;

use crate::domain::catalog::ProductRow;
use crate::errors::ServiceError;
use crate::state::AppState;
use super::identity::Identity;

pub async fn add(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<ProductRow>,
) -> Result<HttpResponse, ServiceError> {
    let product = state
        .catalog
        .add_product(actor, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(product))
}

pub async fn list_for_seller(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let products = state.catalog.seller_products(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let product = state.catalog.get_product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn export_csv(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let csv = state.catalog.export_products_csv(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=\"products.csv\""))
        .body(csv))
}

/// Body is the CSV text itself
pub async fn import_csv(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: String,
) -> Result<HttpResponse, ServiceError> {
    let summary = state
        .catalog
        .import_products_csv(actor, path.into_inner(), &body)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}
