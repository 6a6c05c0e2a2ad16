use actix_web::{web, HttpResponse};

use crate::domain::access::Role;
use crate::errors::ServiceError;
use crate::projections::{AdminDashboard, CustomerDashboard, DistributorDashboard, SellerDashboard};
use crate::state::AppState;
use super::identity::Identity;

/// The caller's own dashboard, shaped by role
pub async fn dashboard(
    state: web::Data<AppState>,
    Identity(actor): Identity,
) -> Result<HttpResponse, ServiceError> {
    let response = match actor.role {
        Role::Customer => {
            let orders = state.orders.all_orders().await?;
            HttpResponse::Ok().json(CustomerDashboard::build(actor.id, orders))
        }
        Role::Seller => {
            let orders = state.orders.all_orders().await?;
            let rating = state.reviews.seller_rating(actor.id).await?;
            HttpResponse::Ok().json(SellerDashboard::build(actor.id, orders, rating))
        }
        Role::Distributor => {
            let deliveries = state.deliveries.all_deliveries().await?;
            HttpResponse::Ok().json(DistributorDashboard::build(actor.id, deliveries))
        }
        Role::Admin => {
            let orders = state.orders.all_orders().await?;
            let deliveries = state.deliveries.all_deliveries().await?;
            let pending = state.sellers.pending_certifications(actor).await?.len();
            HttpResponse::Ok().json(AdminDashboard::build(&orders, &deliveries, pending))
        }
    };
    Ok(response)
}
