use std::sync::Arc;

use elevator_broker::Broker;
use elevator_store::StateStore;

/// Shared application state: the two process-wide adapters plus the static
/// building configuration, injected once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub broker: Arc<dyn Broker>,
    pub num_floors: u32,
    pub num_elevators: u32,
}
