use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub searches_total: IntCounter,
    pub search_latency_seconds: HistogramVec,
    pub bookings_total: IntCounterVec,
    pub active_bookings: IntGauge,
    pub assistant_fallbacks_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let searches_total = IntCounter::new("searches_total", "Total fare searches served")
            .expect("valid searches_total metric");

        let search_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "search_latency_seconds",
                "Latency of fare searches in seconds",
            ),
            &["outcome"],
        )
        .expect("valid search_latency_seconds metric");

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Booking attempts by outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let active_bookings = IntGauge::new("active_bookings", "Bookings currently being tracked")
            .expect("valid active_bookings metric");

        let assistant_fallbacks_total = IntCounterVec::new(
            Opts::new(
                "assistant_fallbacks_total",
                "Collaborator calls answered by the static fallback",
            ),
            &["client"],
        )
        .expect("valid assistant_fallbacks_total metric");

        registry
            .register(Box::new(searches_total.clone()))
            .expect("register searches_total");
        registry
            .register(Box::new(search_latency_seconds.clone()))
            .expect("register search_latency_seconds");
        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(active_bookings.clone()))
            .expect("register active_bookings");
        registry
            .register(Box::new(assistant_fallbacks_total.clone()))
            .expect("register assistant_fallbacks_total");

        Self {
            registry,
            searches_total,
            search_latency_seconds,
            bookings_total,
            active_bookings,
            assistant_fallbacks_total,
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
