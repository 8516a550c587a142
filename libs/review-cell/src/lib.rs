pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::ClinicConfig;
use shared_database::ClinicStore;

use services::coupon::CouponService;
use services::review::ReviewService;
use services::token::ReviewTokenService;

/// Review cell wiring: token-gated review submission and the reward coupon
/// pipeline behind it.
pub struct ReviewCell {
    pub tokens: ReviewTokenService,
    pub reviews: ReviewService,
    pub coupons: CouponService,
}

impl ReviewCell {
    pub fn new(store: Arc<ClinicStore>, clinic: ClinicConfig) -> Self {
        let tokens = ReviewTokenService::new(Arc::clone(&store), clinic.review_token_ttl_days)
            .with_grace_minutes(clinic.duplicate_submission_grace_minutes);
        let coupons = CouponService::new(Arc::clone(&store));
        let reviews = ReviewService::new(
            Arc::clone(&store),
            clinic.duplicate_submission_grace_minutes,
        );

        Self {
            tokens,
            reviews,
            coupons,
        }
    }
}
