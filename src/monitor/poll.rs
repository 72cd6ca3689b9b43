// src/monitor/poll.rs
// =============================================================================
// The poll loop.
//
// How one cycle works:
// 1. Re-read the target list
// 2. For each URL, in file order:
//    fetch -> fingerprint -> discover endpoints -> classify
//    -> (on change) write a report -> (if warranted) build + deliver alert
// 3. After the first complete pass, clear the first-cycle flag
//
// Everything runs strictly one target at a time: an alert for target N is
// delivered (or given up on) before target N+1 is fetched.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use super::shutdown::Shutdown;
use crate::config::MonitorConfig;
use crate::detect::{
    classify, Classification, EndpointExtractor, Fingerprint, KnownEndpoints, TargetStateStore,
};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::notify::{AlertBuilder, AlertKind, DeliveryOutcome, NotificationDispatcher, WebhookTransport};
use crate::store::{load_targets, ChangeReport, EndpointLog, ReportSink};

/// What happened to one target during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// Skipped for this cycle; no state was touched.
    FetchFailed { reason: String },
    /// Classified, nothing worth an alert.
    Quiet { classification: &'static str },
    Alerted {
        classification: &'static str,
        kind: AlertKind,
        delivery: DeliveryOutcome,
    },
}

/// Per-target outcomes of one cycle, in target order.
#[derive(Debug, Default)]
pub struct CycleSummary {
    pub results: Vec<(String, TargetOutcome)>,
    /// Shutdown was requested before every target was processed.
    pub interrupted: bool,
}

impl CycleSummary {
    pub fn alerts(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TargetOutcome::Alerted { .. }))
            .count()
    }

    pub fn fetch_failures(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TargetOutcome::FetchFailed { .. }))
            .count()
    }

    pub fn undelivered(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, outcome)| {
                matches!(
                    outcome,
                    TargetOutcome::Alerted {
                        delivery: DeliveryOutcome::Failed(_),
                        ..
                    }
                )
            })
            .count()
    }
}

pub struct Monitor<F, W, R> {
    fetcher: F,
    dispatcher: NotificationDispatcher<W>,
    reports: R,
    extractor: EndpointExtractor,
    alerts: AlertBuilder,
    endpoint_log: EndpointLog,
    known: KnownEndpoints,
    store: TargetStateStore,
    targets: PathBuf,
    interval: Duration,
    first_cycle: bool,
}

impl<F, W, R> Monitor<F, W, R>
where
    F: Fetcher,
    W: WebhookTransport,
    R: ReportSink,
{
    /// Builds a monitor and seeds the endpoint dedup set from the log.
    pub fn new(
        config: &MonitorConfig,
        fetcher: F,
        dispatcher: NotificationDispatcher<W>,
        reports: R,
    ) -> Result<Self> {
        let endpoint_log = EndpointLog::new(&config.endpoint_log);
        let known = KnownEndpoints::from_lines(endpoint_log.load()?);
        tracing::info!(
            count = known.len(),
            log = %endpoint_log.path().display(),
            "loaded known endpoint log lines"
        );

        Ok(Self {
            fetcher,
            dispatcher,
            reports,
            extractor: EndpointExtractor::new(),
            alerts: AlertBuilder::new(config.alerts, config.endpoint_log.display().to_string()),
            endpoint_log,
            known,
            store: TargetStateStore::new(),
            targets: config.targets.clone(),
            interval: config.interval,
            first_cycle: true,
        })
    }

    /// Polls forever until shutdown is requested. Errors inside a cycle are
    /// logged and the next cycle runs as usual.
    pub async fn run(&mut self, shutdown: &Shutdown) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            alerts_enabled = self.dispatcher.is_enabled(),
            "monitor started"
        );

        while !shutdown.is_requested() {
            match self.run_cycle(shutdown).await {
                Ok(summary) => tracing::info!(
                    targets = summary.results.len(),
                    alerts = summary.alerts(),
                    fetch_failures = summary.fetch_failures(),
                    undelivered = summary.undelivered(),
                    "cycle finished"
                ),
                Err(e) => tracing::error!(error = %e, "cycle aborted, retrying next interval"),
            }

            if shutdown.is_requested() {
                break;
            }
            tracing::info!(secs = self.interval.as_secs(), "sleeping until next cycle");
            shutdown.sleep(self.interval).await;
        }

        tracing::info!("monitor stopped");
    }

    /// One pass over the target list.
    ///
    /// A missing target file aborts the cycle with an error; an empty one
    /// ends it early. Neither counts as the first complete pass.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> Result<CycleSummary> {
        let targets = load_targets(&self.targets)?;
        let mut summary = CycleSummary::default();

        if targets.is_empty() {
            tracing::info!(file = %self.targets.display(), "no valid http(s) targets, waiting for next check");
            return Ok(summary);
        }
        if self.first_cycle {
            tracing::info!(count = targets.len(), "initial scan of targets for content and endpoints");
        }

        for url in targets {
            if shutdown.is_requested() {
                summary.interrupted = true;
                return Ok(summary);
            }
            let outcome = self.process_target(&url).await;
            summary.results.push((url, outcome));
        }

        if self.first_cycle {
            tracing::info!("initial scan complete, now watching for changes and new endpoints");
            self.first_cycle = false;
        }
        Ok(summary)
    }

    async fn process_target(&mut self, url: &str) -> TargetOutcome {
        tracing::debug!(url = %url, "processing");

        let content = match self.fetcher.fetch(url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "fetch failed, skipping target this cycle");
                return TargetOutcome::FetchFailed { reason: e.to_string() };
            }
        };

        let fingerprint = Fingerprint::of(&content);
        let new_endpoints = self
            .extractor
            .discover(&content, url, &mut self.known, &self.endpoint_log);
        let verdict = classify(
            &mut self.store,
            url,
            fingerprint,
            content,
            new_endpoints,
            self.first_cycle,
        );
        let classification = verdict.classification.label();

        if !verdict.should_alert {
            return TargetOutcome::Quiet { classification };
        }

        let report = match &verdict.classification {
            Classification::Changed { .. } => self.store_report(url, &verdict.classification),
            _ => None,
        };

        let alert = self.alerts.build(url, &verdict.classification, report);
        let message = self.alerts.to_message(&alert);
        let delivery = self.dispatcher.deliver(&message, &alert.target_url).await;
        if let DeliveryOutcome::Failed(reason) = &delivery {
            tracing::error!(url = %url, error = %reason, "notification not delivered");
        }

        TargetOutcome::Alerted {
            classification,
            kind: alert.kind,
            delivery,
        }
    }

    /// Writes the change report; a failure only costs the alert its
    /// report reference.
    fn store_report(&self, url: &str, classification: &Classification) -> Option<String> {
        let Classification::Changed {
            old,
            new_fingerprint,
            diff,
            ..
        } = classification
        else {
            return None;
        };
        let new_content = self.store.get(url).map(|record| record.content.as_str())?;

        let report = ChangeReport {
            url,
            detected_at: Local::now(),
            old_fingerprint: old.fingerprint,
            new_fingerprint: *new_fingerprint,
            diff,
            old_content: &old.content,
            new_content,
        };
        match self.reports.store(&report) {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "could not save change report");
                None
            }
        }
    }
}
