use std::sync::Arc;
use freight_core::ShipmentService;
use freight_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ShipmentService>,
    pub business_rules: BusinessRules,
}

impl AppState {
    pub fn new(service: Arc<ShipmentService>, business_rules: BusinessRules) -> Self {
        Self {
            service,
            business_rules,
        }
    }
}
