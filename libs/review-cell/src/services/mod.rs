pub mod coupon;
pub mod review;
pub mod token;
