//! # privacy-audit
//!
//! Website privacy and compliance auditor.
//!
//! Given a site URL, privacy-audit fetches the page with its stylesheets and
//! scripts, then reports what a GDPR reviewer needs to look at: analytics
//! trackers, web fonts, CDNs, social widgets, embedded videos, forms, DNS
//! prefetching, the TLS certificate and every cookie set by the page and the
//! third parties it loads. A run ends with NF Z67-147 audit metadata and a
//! list of recommendations for further human audit.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - the `privacy-audit` binary is a thin CLI over [`Auditor`]
//! - **Selectable tasks** - run everything or only the checks you name; dependencies follow automatically
//! - **Pluggable collaborators** - HTTP, certificates and DNS sit behind traits
//! - **Typed output** - a serializable [`Report`] plus human-readable sections pushed to a [`ReportSink`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use privacy_audit::{AuditConfig, Auditor, TerminalSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuditConfig {
//!         url: "https://example.com".to_string(),
//!         tasks: vec!["cookies".to_string(), "analytics".to_string()],
//!         ..Default::default()
//!     };
//!
//!     let auditor = Auditor::new(config)?;
//!     let report = auditor.run(&mut TerminalSink::stdout()).await?;
//!
//!     println!("{}", report.to_json()?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Audit orchestration
pub mod auditor;
/// Fan-in barrier for concurrent probes
pub mod barrier;
/// TLS certificate retrieval
pub mod certificate;
/// Configuration types
pub mod config;
/// Cookie parsing and expiry policy
pub mod cookies;
/// Content detectors
pub mod detect;
/// Address lookups
pub mod dns;
/// Error types
pub mod error;
/// HTTP retrieval
pub mod fetcher;
/// Section sinks
pub mod output;
/// HTML content extraction
pub mod parser;
/// Recommendations for further human audit
pub mod recommendations;
/// Section rendering
pub mod render;
/// Audit report
pub mod report;
/// Task registry, dependency graph and task list
pub mod tasks;
/// Core fetch types
pub mod types;

// Re-export commonly used types
pub use auditor::{Acquired, Auditor};
pub use certificate::{Certificate, CertificateProvider, TlsCertificateProvider};
pub use config::{AuditConfig, AuditPlan};
pub use dns::{Addresses, DnsResolver, SystemResolver};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, HttpFetcher};
pub use output::{MemorySink, ReportSink, TerminalSink};
pub use recommendations::{Recommendation, RecommendationCollection};
pub use render::{Line, Section};
pub use report::Report;
pub use tasks::{TaskKind, TaskList};
pub use types::{FetchBatch, FetchResult, Headers, ResourceSet};
