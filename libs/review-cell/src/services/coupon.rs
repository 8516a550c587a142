// libs/review-cell/src/services/coupon.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::distributions::Uniform;
use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use shared_database::{ClinicStore, StoreError};
use shared_models::auth::Caller;
use shared_models::clinic::{CouponType, CustomerType, RewardCoupon};

use crate::models::ReviewError;

const CODE_PREFIX: &str = "SC-";
const CODE_LENGTH: usize = 10;
// Unambiguous uppercase alphanumerics (no O/0, I/1 confusion).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Mints reward coupons for submitted reviews and guards their single
/// redemption. Codes are generated here, collision-checked, never left to a
/// storage default.
pub struct CouponService {
    store: Arc<ClinicStore>,
}

impl CouponService {
    pub fn new(store: Arc<ClinicStore>) -> Self {
        Self { store }
    }

    /// Build the coupon a review earns, if any. Prospective patients get the
    /// stem-cell incentive; any other recorded classification gets the free
    /// item; no classification, no coupon.
    pub fn mint_for_review(
        &self,
        review_id: Uuid,
        customer_type: Option<CustomerType>,
        now: DateTime<Utc>,
    ) -> Option<RewardCoupon> {
        let coupon_type = match customer_type? {
            CustomerType::PotentialCustomer => CouponType::FreeStemcells,
            _ => CouponType::FreeItem,
        };

        let coupon = RewardCoupon {
            id: Uuid::new_v4(),
            code: self.generate_code(),
            review_id,
            coupon_type,
            is_redeemed: false,
            redeemed_at: None,
            created_at: now,
        };
        info!(
            "Minted {:?} coupon {} for review {}",
            coupon.coupon_type, coupon.code, review_id
        );
        Some(coupon)
    }

    /// Redeem exactly once; the flip is a conditional update in the store.
    pub fn redeem(&self, coupon_id: Uuid, caller: &Caller) -> Result<RewardCoupon, ReviewError> {
        if !caller.is_staff() {
            return Err(ReviewError::Unauthorized);
        }

        match self.store.redeem_coupon(coupon_id, Utc::now()) {
            Ok(coupon) => {
                info!("Coupon {} redeemed by {}", coupon.code, caller.id);
                Ok(coupon)
            }
            Err(StoreError::AlreadyRedeemed) => {
                warn!("Rejected duplicate redemption of coupon {}", coupon_id);
                Err(ReviewError::DuplicateRedemption)
            }
            Err(_) => Err(ReviewError::CouponNotFound),
        }
    }

    pub fn find_by_code(&self, code: &str) -> Result<RewardCoupon, ReviewError> {
        self.store
            .find_coupon_by_code(code)
            .ok_or(ReviewError::CouponNotFound)
    }

    pub fn generate_code(&self) -> String {
        loop {
            let mut rng = rand::thread_rng();
            let picker = Uniform::from(0..CODE_ALPHABET.len());
            let body: String = (0..CODE_LENGTH)
                .map(|_| CODE_ALPHABET[rng.sample(picker)] as char)
                .collect();
            let candidate = format!("{}{}", CODE_PREFIX, body);
            if !self.store.coupon_code_exists(&candidate) {
                return candidate;
            }
        }
    }
}
