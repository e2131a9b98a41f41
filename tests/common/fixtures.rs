//! Collaborator doubles and site fixtures

use async_trait::async_trait;
use privacy_audit::{
    Addresses, AuditConfig, Auditor, Certificate, CertificateProvider, DnsResolver, Error,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Google Analytics snippet with IP anonymization
pub const GA_SNIPPET: &str = r#"(function(i,s,o,g,r,a,m){i['GoogleAnalyticsObject']=r;})(window,document,'script','https://www.google-analytics.com/analytics.js','ga');
ga('create', 'UA-12345-6', 'auto');
ga('set', 'anonymizeIp', true);
ga('send', 'pageview');"#;

/// Certificate provider that refuses every host and counts calls
#[derive(Clone, Default)]
pub struct RefusingCertificates {
    pub calls: Arc<AtomicUsize>,
}

impl RefusingCertificates {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateProvider for RefusingCertificates {
    async fn certificate(&self, host: &str) -> privacy_audit::Result<Certificate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Certificate {
            host: host.to_string(),
            reason: "refused by test double".to_string(),
        })
    }
}

/// Resolver answering fixed documentation addresses
pub struct FixedResolver;

#[async_trait]
impl DnsResolver for FixedResolver {
    async fn website_addresses(&self, _host: &str) -> Addresses {
        Addresses::from_resolved(["198.51.100.7".parse::<IpAddr>().unwrap()])
    }

    async fn auditor_addresses(&self) -> Addresses {
        Addresses::from_resolved(["203.0.113.9".parse::<IpAddr>().unwrap()])
    }
}

/// Auditor for `url` with network-free certificate and DNS doubles
pub fn auditor(url: &str, tasks: &[&str]) -> (Auditor, RefusingCertificates) {
    let certificates = RefusingCertificates::default();
    let config = AuditConfig {
        url: url.to_string(),
        tasks: tasks.iter().map(|t| t.to_string()).collect(),
        request_timeout: Some(std::time::Duration::from_secs(10)),
        ..Default::default()
    };
    let auditor = Auditor::new(config)
        .unwrap()
        .with_certificate_provider(certificates.clone())
        .with_resolver(FixedResolver);
    (auditor, certificates)
}

/// Serve `body` as the home page
pub async fn mount_page(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}

/// Serve `body` at `at` for GET requests
pub async fn mount_asset(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// The same mock server addressed by name instead of IP
pub fn by_name(server: &MockServer) -> String {
    format!("http://localhost:{}", server.address().port())
}
