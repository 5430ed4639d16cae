//! Prometheus metrics registry and instruments.
//!
//! Instruments work whether or not they are registered; `init_metrics`
//! only makes them visible through [`REGISTRY`].

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Inbound Metrics
    pub static ref ENTITIES_PROCESSED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fedbridge_entities_processed_total", "Total number of inbound entities processed"),
        &["kind", "outcome"]
    ).expect("metric can be created");
    pub static ref PROFILE_FETCHES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fedbridge_profile_fetches_total", "Total number of remote profile fetches"),
        &["result"]
    ).expect("metric can be created");

    // Outbound Metrics
    pub static ref OUTBOUND_CONVERSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("fedbridge_outbound_conversions_total", "Total number of local content conversions for federation"),
        &["entity_type", "status"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(ENTITIES_PROCESSED_TOTAL.clone()))
        .expect("ENTITIES_PROCESSED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(PROFILE_FETCHES_TOTAL.clone()))
        .expect("PROFILE_FETCHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(OUTBOUND_CONVERSIONS_TOTAL.clone()))
        .expect("OUTBOUND_CONVERSIONS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
