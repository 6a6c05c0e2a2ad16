// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer over the command handlers. Identity arrives in the
// X-User-Id / X-User-Role headers set by the auth gateway; every capability
// check happens below this layer.
//
// ============================================================================

mod dashboards;
mod deliveries;
mod identity;
mod orders;
mod products;
mod reviews;
mod sellers;

pub use identity::{Identity, USER_ID_HEADER, USER_ROLE_HEADER};

use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics))
        .service(
            web::scope("/api/v1")
                .route("/dashboard", web::get().to(dashboards::dashboard))
                // Orders
                .route("/orders", web::post().to(orders::checkout))
                .route("/orders", web::get().to(orders::list_orders))
                .route("/orders/export", web::get().to(orders::export_orders))
                .route("/orders/{id}", web::get().to(orders::get_order))
                .route("/orders/{id}/history", web::get().to(orders::order_history))
                .route("/orders/{id}/delivery", web::get().to(orders::order_delivery))
                .route("/orders/{id}/status", web::put().to(orders::update_status))
                .route("/orders/{id}/cancel", web::post().to(orders::cancel))
                .route("/orders/{id}/payment-status", web::put().to(orders::update_payment_status))
                .route("/orders/{id}/items/{item_id}/status", web::put().to(orders::update_item_status))
                // Deliveries
                .route("/deliveries", web::post().to(deliveries::create))
                .route("/deliveries/pending", web::get().to(deliveries::pending))
                .route("/deliveries/{id}", web::get().to(deliveries::get))
                .route("/deliveries/{id}/assign", web::post().to(deliveries::assign))
                .route("/deliveries/{id}/status", web::put().to(deliveries::update_status))
                .route("/deliveries/{id}/estimate", web::put().to(deliveries::update_estimate))
                .route("/deliveries/{id}/priority", web::put().to(deliveries::reprioritize))
                .route("/distributors/{id}/deliveries", web::get().to(deliveries::for_distributor))
                // Reviews
                .route("/reviews", web::post().to(reviews::create))
                .route("/reviews/{id}/response", web::post().to(reviews::respond))
                .route("/reviews/{id}/publish", web::post().to(reviews::publish))
                // Sellers, certifications and catalog
                .route("/certifications/pending", web::get().to(sellers::pending_certifications))
                .route("/sellers/{id}/profile", web::get().to(sellers::get_profile))
                .route("/sellers/{id}/profile", web::put().to(sellers::save_profile))
                .route("/sellers/{id}/logo", web::put().to(sellers::upload_logo))
                .route("/sellers/{id}/certifications/{kind}", web::put().to(sellers::set_certification))
                .route(
                    "/sellers/{id}/certifications/{kind}/approve",
                    web::post().to(sellers::approve_certification),
                )
                .route("/sellers/{id}/reviews", web::get().to(reviews::for_seller))
                .route("/sellers/{id}/rating", web::get().to(reviews::seller_rating))
                .route("/sellers/{id}/products", web::get().to(products::list_for_seller))
                .route("/sellers/{id}/products", web::post().to(products::add))
                .route("/sellers/{id}/products/export", web::get().to(products::export_csv))
                .route("/sellers/{id}/products/import", web::post().to(products::import_csv))
                .route("/products/{id}", web::get().to(products::get))
                .route("/products/{id}/reviews", web::get().to(reviews::for_product))
                .route("/products/{id}/rating", web::get().to(reviews::product_rating)),
        );
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "fishhappy-lifecycle"
    }))
}

async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    match state.metrics.render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}
