//! Audit orchestration split into focused submodules.
//!
//! The `Auditor` holds the validated configuration and its collaborators;
//! one call to [`Auditor::run`] drives one [`AuditRun`]:
//! - [`acquisition`] - normalize, html, css, js and ssl, strictly in sequence
//! - [`generators`] - report slices in render order
//! - [`cookies`] - cookie collection with the third-party probe fan-in
//! - [`finalize`] - the `nfz` and `audit` summaries

mod acquisition;
mod cookies;
mod finalize;
mod generators;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use acquisition::Acquired;

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::certificate::{CertificateProvider, TlsCertificateProvider};
use crate::config::{AuditConfig, AuditPlan};
use crate::dns::{DnsResolver, SystemResolver};
use crate::error::Result;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::output::ReportSink;
use crate::recommendations::RecommendationCollection;
use crate::render::Section;
use crate::report::Report;
use crate::tasks::{DependencyGraph, EndOutcome, TaskKind, TaskList};

/// Runs website audits
///
/// Collaborators default to the network-backed implementations and can be
/// swapped with the `with_*` builders.
#[derive(Clone)]
pub struct Auditor {
    config: Arc<AuditConfig>,
    plan: AuditPlan,
    graph: DependencyGraph,
    fetcher: Arc<dyn Fetcher>,
    certificates: Arc<dyn CertificateProvider>,
    resolver: Arc<dyn DnsResolver>,
}

impl Auditor {
    /// Validate `config` and set up the default collaborators
    ///
    /// Nothing is requested yet.
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) for an invalid
    /// configuration and [`Error::Network`](crate::Error::Network) when the
    /// HTTP client cannot be built.
    pub fn new(config: AuditConfig) -> Result<Self> {
        let plan = config.validate()?;
        let graph = DependencyGraph::from_registry()?;
        let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout)?;

        let mut certificates = TlsCertificateProvider::new();
        if let Some(timeout) = config.request_timeout {
            certificates = certificates.with_timeout(timeout);
        }

        tracing::debug!(
            url = %plan.start,
            tasks = ?plan.selection,
            cookie_threshold_months = plan.cookie_threshold_months,
            "auditor configured"
        );

        Ok(Self {
            config: Arc::new(config),
            plan,
            graph,
            fetcher: Arc::new(fetcher),
            certificates: Arc::new(certificates),
            resolver: Arc::new(SystemResolver::default()),
        })
    }

    /// Replace the HTTP fetcher
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    /// Replace the certificate provider
    pub fn with_certificate_provider(mut self, provider: impl CertificateProvider + 'static) -> Self {
        self.certificates = Arc::new(provider);
        self
    }

    /// Replace the DNS resolver
    pub fn with_resolver(mut self, resolver: impl DnsResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Configuration this auditor was built from
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Validated form of the configuration
    pub fn plan(&self) -> &AuditPlan {
        &self.plan
    }

    /// Audit the configured site, sending each section to `sink` as its
    /// task ends
    ///
    /// # Errors
    /// Returns [`Error::Certificate`](crate::Error::Certificate) when the
    /// site is served over `https` but its certificate cannot be retrieved.
    /// Unreachable resources are reported, not raised.
    pub async fn run(&self, sink: &mut dyn ReportSink) -> Result<Report> {
        let mut run = AuditRun::new(self, sink);
        tracing::info!(url = %self.plan.input, tasks = ?run.tasks.active(), "audit started");

        let acquired = run.acquire().await?;
        run.generate(&acquired).await;

        tracing::info!(
            url = %acquired.url,
            recommendations = run.recommendations.topics().count(),
            "audit finished"
        );
        Ok(run.report)
    }
}

/// State of one audit: task list, report under construction and
/// recommendations
///
/// Everything is owned by the single future driving the run, so no
/// locking is involved.
pub(crate) struct AuditRun<'a> {
    auditor: &'a Auditor,
    sink: &'a mut dyn ReportSink,
    tasks: TaskList,
    report: Report,
    recommendations: RecommendationCollection,
    started: DateTime<Utc>,
}

impl<'a> AuditRun<'a> {
    fn new(auditor: &'a Auditor, sink: &'a mut dyn ReportSink) -> Self {
        Self {
            auditor,
            sink,
            tasks: TaskList::for_selection(auditor.graph.clone(), &auditor.plan.selection),
            report: Report::default(),
            recommendations: RecommendationCollection::new(),
            started: Utc::now(),
        }
    }

    /// End `task`, emitting its section, and run the finalizers when they are due
    async fn end(&mut self, task: TaskKind, section: Option<Section>) {
        if let Some(section) = &section {
            self.sink.section(task, section);
        }
        tracing::debug!(%task, "task ended");

        if self.tasks.end(task) == EndOutcome::Finalize {
            self.finalize().await;
        }
    }

    /// End a finalizer; finalizers never trigger finalization themselves
    fn end_finalizer(&mut self, task: TaskKind, section: Section) {
        self.sink.section(task, &section);
        tracing::debug!(%task, "finalizer ended");
        self.tasks.end(task);
    }
}
