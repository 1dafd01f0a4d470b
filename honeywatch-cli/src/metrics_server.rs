//! Prometheus exporter for `honeywatch monitor`.
//!
//! Pass and detection latencies are histograms with buckets sized for batch
//! analysis, from tens of milliseconds up to a minute. Every series carries
//! the configured `analysis.region` as a `region` label.

use std::net::SocketAddr;

use anyhow::{Result, anyhow};
use honeywatch_core::config::{HoneywatchConfig, MetricsConfig};
use honeywatch_core::metrics::{DETECTION_DURATION_SECONDS, PASS_DURATION_SECONDS, describe_all};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

/// Histogram buckets (seconds) for pass and detection latency.
const LATENCY_BUCKETS: [f64; 10] = [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0];

/// Parse `listen_addr:port` into a socket address.
pub fn listen_addr(config: &MetricsConfig) -> Result<SocketAddr> {
    format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .map_err(|e| anyhow!("invalid metrics listen address: {e}"))
}

/// Exporter configured for honeywatch, not yet installed.
pub fn exporter(config: &HoneywatchConfig) -> Result<(PrometheusBuilder, SocketAddr)> {
    let addr = listen_addr(&config.metrics)?;

    let mut builder = PrometheusBuilder::new().with_http_listener(addr);
    for name in [PASS_DURATION_SECONDS, DETECTION_DURATION_SECONDS] {
        builder = builder
            .set_buckets_for_metric(Matcher::Full(name.to_owned()), &LATENCY_BUCKETS)
            .map_err(|e| anyhow!("invalid buckets for {name}: {e}"))?;
    }
    if !config.analysis.region.is_empty() {
        builder = builder.add_global_label("region", config.analysis.region.as_str());
    }
    Ok((builder, addr))
}

/// Installs the global recorder and starts the scrape listener.
///
/// Call once per process, inside the tokio runtime.
pub fn install_metrics_recorder(config: &HoneywatchConfig) -> Result<()> {
    let (builder, addr) = exporter(config)?;

    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces; restrict listen_addr in untrusted networks"
        );
    }

    builder
        .install()
        .map_err(|e| anyhow!("failed to install Prometheus recorder: {e}"))?;
    describe_all();

    tracing::info!(
        listen_addr = %addr,
        region = %config.analysis.region,
        "serving honeywatch metrics"
    );
    Ok(())
}
