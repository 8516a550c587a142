pub mod availability;
pub mod quota;
