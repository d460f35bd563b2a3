use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub wizard_actions_total: IntCounterVec,
    pub orders_submitted_total: IntCounterVec,
    pub geocode_requests_total: IntCounterVec,
    pub active_wizards: IntGauge,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let wizard_actions_total = IntCounterVec::new(
            Opts::new("wizard_actions_total", "Wizard actions by type and outcome"),
            &["action", "outcome"],
        )
        .expect("valid wizard_actions_total metric");

        let orders_submitted_total = IntCounterVec::new(
            Opts::new("orders_submitted_total", "Orders handed to the summary screen"),
            &["transport_type"],
        )
        .expect("valid orders_submitted_total metric");

        let geocode_requests_total = IntCounterVec::new(
            Opts::new("geocode_requests_total", "Reverse-geocode requests by outcome"),
            &["outcome"],
        )
        .expect("valid geocode_requests_total metric");

        let active_wizards = IntGauge::new("active_wizards", "Currently open order wizards")
            .expect("valid active_wizards metric");

        registry
            .register(Box::new(wizard_actions_total.clone()))
            .expect("register wizard_actions_total");
        registry
            .register(Box::new(orders_submitted_total.clone()))
            .expect("register orders_submitted_total");
        registry
            .register(Box::new(geocode_requests_total.clone()))
            .expect("register geocode_requests_total");
        registry
            .register(Box::new(active_wizards.clone()))
            .expect("register active_wizards");

        Self {
            registry,
            wizard_actions_total,
            orders_submitted_total,
            geocode_requests_total,
            active_wizards,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
