use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::seller::{CertificationKind, ProfileDetails};
use crate::errors::ServiceError;
use crate::media::MediaUpload;
use crate::state::AppState;
use super::identity::Identity;

#[derive(Debug, Deserialize)]
pub struct CertificationFlag {
    pub certified: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogoQuery {
    pub file_name: String,
}

pub async fn get_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let profile = state.sellers.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn save_profile(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    body: web::Json<ProfileDetails>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = state
        .sellers
        .save_profile(actor, path.into_inner(), body.into_inner(), None)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Raw image body; re-saves the current profile with the new logo
pub async fn upload_logo(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<Uuid>,
    query: web::Query<LogoQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    let seller_id = path.into_inner();
    let current = state.sellers.get_profile(seller_id).await?;
    let details = ProfileDetails {
        business_name: current.business_name,
        location: current.location,
        description: current.description,
    };
    let upload = MediaUpload {
        file_name: query.into_inner().file_name,
        bytes: body.to_vec(),
    };

    let outcome = state
        .sellers
        .save_profile(actor, seller_id, details, Some(upload))
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn set_certification(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<(Uuid, String)>,
    body: web::Json<CertificationFlag>,
) -> Result<HttpResponse, ServiceError> {
    let (seller_id, kind) = path.into_inner();
    let kind: CertificationKind = kind.parse()?;
    let profile = state
        .sellers
        .set_certification(actor, seller_id, kind, body.certified)
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn approve_certification(
    state: web::Data<AppState>,
    Identity(actor): Identity,
    path: web::Path<(Uuid, String)>,
) -> Result<HttpResponse, ServiceError> {
    let (seller_id, kind) = path.into_inner();
    let kind: CertificationKind = kind.parse()?;
    let profile = state.sellers.approve_certification(actor, seller_id, kind).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn pending_certifications(
    state: web::Data<AppState>,
    Identity(actor): Identity,
) -> Result<HttpResponse, ServiceError> {
    let profiles = state.sellers.pending_certifications(actor).await?;
    Ok(HttpResponse::Ok().json(profiles))
}
