//! OpenTelemetry instruments for the batch engine
//!
//! # Metrics Collected
//!
//! - **requests.total**: logical calls completed, by method and status (counter)
//! - **request.duration**: call latency in seconds (histogram)
//! - **errors.total**: faults by class (counter)
//! - **batch.size**: calls per round trip (histogram)
//! - **round_trips.total**: round trips attempted (counter)
//!
//! Instruments are created from the global meter provider, so they are
//! no-ops until `init_observability` installs an exporter.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cmdb_rpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("inventory-sync");
//! metrics.record_batch(12);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instruments recorded by [`BatchEngine`](crate::BatchEngine)
pub struct ClientMetrics {
    /// Logical calls completed
    pub requests_total: Counter<u64>,
    /// Call latency in seconds
    pub request_duration: Histogram<f64>,
    /// Faults by class
    pub errors_total: Counter<u64>,
    /// Number of calls carried by one batch
    pub batch_size: Histogram<u64>,
    /// Round trips attempted, single or batch
    pub round_trips_total: Counter<u64>,
}

impl ClientMetrics {
    /// Instruments on a meter named after `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        // global::meter wants a 'static scope name
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Instruments on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("cmdb_rpc.client.requests.total")
                .with_description("Total number of calls completed")
                .build(),
            request_duration: meter
                .f64_histogram("cmdb_rpc.client.request.duration")
                .with_description("Call duration in seconds")
                .with_unit("s")
                .build(),
            errors_total: meter
                .u64_counter("cmdb_rpc.client.errors.total")
                .with_description("Total number of faults by class")
                .build(),
            batch_size: meter
                .u64_histogram("cmdb_rpc.client.batch.size")
                .with_description("Number of calls per batch round trip")
                .build(),
            round_trips_total: meter
                .u64_counter("cmdb_rpc.client.round_trips.total")
                .with_description("Total number of round trips attempted")
                .build(),
        }
    }

    /// Record one completed call
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record a fault; `kind` is one of the labels from `Error::kind`
    pub fn record_error(&self, kind: &str) {
        let attributes = &[KeyValue::new("kind", kind.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a batch round trip carrying `size` calls
    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
        self.record_round_trip("batch");
    }

    /// Record a round trip of the given shape (`single` or `batch`)
    pub fn record_round_trip(&self, shape: &'static str) {
        self.round_trips_total.add(1, &[KeyValue::new("shape", shape)]);
    }
}
