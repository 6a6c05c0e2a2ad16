use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::review::{ReviewStatus, SubmitReview};
use crate::errors::ServiceError;
use crate::state::AppState;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct ResponseRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub status: Option<ReviewStatus>,
}

pub async fn create(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    body: web::Json<SubmitReview>,
) -> Result<HttpResponse, ServiceError> {
    let review = state.reviews.create_review(actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

pub async fn respond(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<ResponseRequest>,
) -> Result<HttpResponse, ServiceError> {
    let review = state
        .reviews
        .add_seller_response(actor, path.into_inner(), body.into_inner().text)
        .await?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn publish(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let review = state.reviews.publish_review(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

pub async fn for_seller(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    query: web::Query<ReviewQuery>,
) -> Result<HttpResponse, ServiceError> {
    let reviews = state
        .reviews
        .get_seller_reviews(actor, path.into_inner(), query.status)
        .await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn seller_rating(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let summary = state.reviews.seller_rating(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

pub async fn for_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let reviews = state.reviews.product_reviews(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub async fn product_rating(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let summary = state.reviews.product_rating(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
