//! Summary tasks run once every analysis task has ended.

use chrono::Local;
use tracing::info;

use crate::dns::Addresses;
use crate::render;
use crate::report::NfzReport;
use crate::tasks::TaskKind;

use super::AuditRun;

/// Describe the audit environment
pub(crate) fn environment(user_agent: &str, auditor: Addresses, website: Addresses) -> NfzReport {
    let os = std::env::consts::OS;
    NfzReport {
        operating_system: format!("{os} {}", std::env::consts::ARCH),
        software: format!(
            "{}-{} - {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION")
        ),
        user_agent: user_agent.to_string(),
        web_cache: "Empty".into(),
        web_cookies: "Empty".into(),
        web_proxy: "Null".into(),
        viruses: if os == "linux" {
            "Unix system up-to-date and not corrupted".into()
        } else {
            "Unverified".into()
        },
        date_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        auditor,
        website,
    }
}

impl AuditRun<'_> {
    /// Run `nfz` then `audit`, each only when scheduled
    pub(super) async fn finalize(&mut self) {
        info!(remaining = ?self.tasks.active(), "finalizing audit");

        if self.tasks.has(TaskKind::Nfz) {
            self.tasks.start(TaskKind::Nfz);
            let host = self
                .report
                .url
                .as_ref()
                .and_then(|u| u.host_str())
                .unwrap_or_default()
                .to_string();

            let resolver = self.auditor.resolver.as_ref();
            let (website, auditor) =
                tokio::join!(resolver.website_addresses(&host), resolver.auditor_addresses());

            let nfz = environment(self.auditor.fetcher.user_agent(), auditor, website);
            let section = render::nfz(&nfz);
            self.report.nfz = Some(nfz);
            self.end_finalizer(TaskKind::Nfz, section);
        }

        if self.tasks.has(TaskKind::Audit) {
            self.tasks.start(TaskKind::Audit);
            let recommendations = self.recommendations.to_vec();
            let section = render::audit(&recommendations);
            self.report.audit = Some(recommendations);
            self.end_finalizer(TaskKind::Audit, section);
        }
    }
}
