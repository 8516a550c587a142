pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::ClinicConfig;
use shared_database::ClinicStore;

use services::availability::AvailabilityService;
use services::quota::QuotaLedger;

/// Scheduling cell wiring: availability reads plus the quota ledger that
/// admission control leans on.
pub struct SchedulingCell {
    pub availability: AvailabilityService,
    pub quota: QuotaLedger,
}

impl SchedulingCell {
    pub fn new(store: Arc<ClinicStore>, clinic: ClinicConfig) -> Self {
        Self {
            availability: AvailabilityService::new(Arc::clone(&store), clinic),
            quota: QuotaLedger::new(store),
        }
    }
}
