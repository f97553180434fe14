//! Prometheus Step Metrics - Execution Observability
//!
//! Counts dispatched, skipped and failed steps and records wallet
//! latency per modality. Implements the `StepObserver` port so the
//! sequencer reports into it without knowing about Prometheus.

use std::time::Duration;

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::domain::classifier::Modality;
use crate::domain::step::StepKind;
use crate::ports::telemetry::StepObserver;

/// Prometheus metrics for step execution.
///
/// All metrics follow the naming convention `trade_steps_*`. The `kind`
/// label is the wire tag, so unrecognized kinds show up verbatim.
pub struct StepMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Steps whose wallet interaction succeeded.
    pub dispatched: IntCounterVec,
    /// Steps skipped by the approval policy.
    pub skipped: IntCounterVec,
    /// Steps that failed, by error reason.
    pub failed: IntCounterVec,
    /// Wallet round-trip latency (milliseconds).
    pub wallet_latency_ms: HistogramVec,
}

impl StepMetrics {
    /// Create and register all step metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let dispatched = IntCounterVec::new(
            Opts::new(
                "trade_steps_dispatched_total",
                "Steps dispatched to the wallet successfully",
            ),
            &["kind", "modality"],
        )?;

        let skipped = IntCounterVec::new(
            Opts::new(
                "trade_steps_skipped_total",
                "Steps skipped because the wallet has implicit allowance",
            ),
            &["kind"],
        )?;

        let failed = IntCounterVec::new(
            Opts::new("trade_steps_failed_total", "Steps that failed"),
            &["kind", "reason"],
        )?;

        // Human-in-the-loop wallets dominate the upper buckets
        let wallet_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "trade_steps_wallet_latency_ms",
                "Wallet round-trip latency in milliseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0, 15_000.0, 60_000.0,
            ]),
            &["modality"],
        )?;

        registry.register(Box::new(dispatched.clone()))?;
        registry.register(Box::new(skipped.clone()))?;
        registry.register(Box::new(failed.clone()))?;
        registry.register(Box::new(wallet_latency_ms.clone()))?;

        Ok(Self {
            registry,
            dispatched,
            skipped,
            failed,
            wallet_latency_ms,
        })
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl StepObserver for StepMetrics {
    fn step_dispatched(&self, kind: &StepKind, modality: Modality, wallet_latency: Duration) {
        self.dispatched
            .with_label_values(&[kind.as_tag(), modality.as_str()])
            .inc();
        self.wallet_latency_ms
            .with_label_values(&[modality.as_str()])
            .observe(wallet_latency.as_secs_f64() * 1_000.0);
    }

    fn step_skipped(&self, kind: &StepKind) {
        self.skipped.with_label_values(&[kind.as_tag()]).inc();
    }

    fn step_failed(&self, kind: &StepKind, reason: &'static str) {
        self.failed.with_label_values(&[kind.as_tag(), reason]).inc();
    }
}
