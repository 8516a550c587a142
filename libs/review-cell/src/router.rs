// libs/review-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::ReviewCell;

pub fn review_routes(cell: Arc<ReviewCell>, config: Arc<AppConfig>) -> Router {
    // Token-gated endpoints are public; the opaque token is the credential.
    let public_routes = Router::new()
        .route("/tokens/{token}", get(handlers::resolve_token))
        .route("/tokens/{token}/submit", post(handlers::submit_review));

    // Coupon handling is a front-desk operation.
    let staff_routes = Router::new()
        .route("/coupons/{coupon_id}/redeem", post(handlers::redeem_coupon))
        .route("/coupons/by-code/{code}", get(handlers::get_coupon_by_code))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .with_state(cell)
}
