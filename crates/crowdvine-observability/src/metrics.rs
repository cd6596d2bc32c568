//! Metrics collection with Prometheus
//!
//! This module provides Prometheus metrics for the storefront edge:
//! - Tenant resolution counts by tenant
//! - Cookies issued by cookie name
//! - Content lookups by tenant and outcome
//! - Settings reloads
//! - Request latency by route

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;

/// Outcome label for content lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
    Error,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Error => "error",
        }
    }
}

/// Metrics collector for Crowdvine
#[derive(Clone)]
pub struct Metrics {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Requests classified per tenant
    pub tenant_resolutions_total: CounterVec,
    /// Cookies written, by cookie name
    pub cookies_issued_total: CounterVec,
    /// Content lookups, by tenant and outcome
    pub content_lookups_total: CounterVec,
    /// Settings changes picked up from the settings store
    pub settings_reloads_total: Counter,
    /// End-to-end request duration
    pub request_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let tenant_resolutions_total = CounterVec::new(
            Opts::new(
                "crowdvine_tenant_resolutions_total",
                "Total number of requests resolved to a tenant",
            ),
            &["tenant"],
        )?;

        let cookies_issued_total = CounterVec::new(
            Opts::new(
                "crowdvine_cookies_issued_total",
                "Total number of cookies written to responses",
            ),
            &["cookie"],
        )?;

        let content_lookups_total = CounterVec::new(
            Opts::new(
                "crowdvine_content_lookups_total",
                "Total number of content store lookups",
            ),
            &["tenant", "outcome"],
        )?;

        let settings_reloads_total = Counter::with_opts(Opts::new(
            "crowdvine_settings_reloads_total",
            "Total number of settings changes observed",
        ))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "crowdvine_request_duration_seconds",
                "Request duration in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["route"],
        )?;

        registry.register(Box::new(tenant_resolutions_total.clone()))?;
        registry.register(Box::new(cookies_issued_total.clone()))?;
        registry.register(Box::new(content_lookups_total.clone()))?;
        registry.register(Box::new(settings_reloads_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            tenant_resolutions_total,
            cookies_issued_total,
            content_lookups_total,
            settings_reloads_total,
            request_duration_seconds,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_tenant(&self, tenant: &str) {
        self.tenant_resolutions_total
            .with_label_values(&[tenant])
            .inc();
    }

    pub fn record_cookie_issued(&self, cookie: &str) {
        self.cookies_issued_total.with_label_values(&[cookie]).inc();
    }

    pub fn record_content_lookup(&self, tenant: &str, outcome: LookupOutcome) {
        self.content_lookups_total
            .with_label_values(&[tenant, outcome.as_str()])
            .inc();
    }

    pub fn record_settings_reload(&self) {
        self.settings_reloads_total.inc();
    }

    pub fn record_request_duration(&self, route: &str, seconds: f64) {
        self.request_duration_seconds
            .with_label_values(&[route])
            .observe(seconds);
    }
}
