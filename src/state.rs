use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::controller::{OrderSubmitted, WizardSession};
use crate::geo::Geocoder;
use crate::observability::metrics::Metrics;
use crate::storage::KeyValueStore;

pub struct AppState {
    pub config: Config,
    pub wizards: DashMap<Uuid, WizardSession>,
    pub session_storage: KeyValueStore,
    pub local_storage: KeyValueStore,
    pub geocoder: Arc<dyn Geocoder>,
    pub order_events_tx: broadcast::Sender<OrderSubmitted>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, geocoder: Arc<dyn Geocoder>) -> Self {
        let (order_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            config,
            wizards: DashMap::new(),
            session_storage: KeyValueStore::new("session"),
            local_storage: KeyValueStore::new("local"),
            geocoder,
            order_events_tx,
            metrics: Metrics::new(),
        }
    }
}
