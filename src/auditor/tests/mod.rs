use super::*;
use crate::certificate::Certificate;
use crate::cookies::CookieStatus;
use crate::dns::Addresses;
use crate::error::Error;
use crate::output::MemorySink;
use crate::report::SslReport;
use crate::types::{FetchBatch, FetchResult, Headers};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned responses; anything else is a transport failure
#[derive(Default)]
struct StaticFetcher {
    responses: HashMap<(Method, String), FetchResult>,
}

impl StaticFetcher {
    fn respond(self, method: Method, url: &str, body: &str, cookies: &[&str]) -> Self {
        self.respond_at(method, url, url, body, cookies)
    }

    /// Answer `requested` as if redirected to `landed`
    fn respond_at(
        mut self,
        method: Method,
        requested: &str,
        landed: &str,
        body: &str,
        cookies: &[&str],
    ) -> Self {
        let url = Url::parse(landed).unwrap();
        let mut headers = Headers::new();
        headers.append("content-type", "text/html");
        for cookie in cookies {
            headers.append("set-cookie", *cookie);
        }
        self.responses.insert(
            (method, Url::parse(requested).unwrap().to_string()),
            FetchResult {
                url,
                content: Some(body.to_string()),
                headers: Some(headers),
                status_code: 200,
                status_message: "OK".into(),
            },
        );
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &Url, method: Method) -> FetchResult {
        self.responses
            .get(&(method, url.to_string()))
            .cloned()
            .unwrap_or_else(|| FetchResult::transport_failure(url.clone(), "connection refused"))
    }

    fn user_agent(&self) -> &str {
        "static-fetcher"
    }
}

/// Counts calls and hands out a fixed certificate or a failure
struct CountingProvider {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingProvider {
    fn new(fail: bool) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                fail,
            },
            calls,
        )
    }
}

fn sample_certificate() -> Certificate {
    Certificate {
        subject_cn: "secure.test".into(),
        issuer_country: "US".into(),
        issuer_organization: "Test CA".into(),
        issuer_cn: "Test CA R1".into(),
        valid_from: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        valid_to: chrono::DateTime::from_timestamp(1_800_000_000, 0).unwrap(),
        serial_number: "0A1B".into(),
        fingerprint: "AA:BB".into(),
        fingerprint256: "CC:DD".into(),
    }
}

#[async_trait]
impl CertificateProvider for CountingProvider {
    async fn certificate(&self, host: &str) -> Result<Certificate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Certificate {
                host: host.to_string(),
                reason: "handshake refused".into(),
            });
        }
        Ok(sample_certificate())
    }
}

struct StubResolver;

#[async_trait]
impl DnsResolver for StubResolver {
    async fn website_addresses(&self, _host: &str) -> Addresses {
        Addresses::from_resolved(["192.0.2.10".parse::<IpAddr>().unwrap()])
    }

    async fn auditor_addresses(&self) -> Addresses {
        Addresses::from_resolved(["2001:db8::1".parse::<IpAddr>().unwrap()])
    }
}

fn auditor(url: &str, tasks: &[&str]) -> Auditor {
    let mut config = AuditConfig::for_url(url);
    config.tasks = tasks.iter().map(|t| t.to_string()).collect();
    let (provider, _) = CountingProvider::new(true);
    Auditor::new(config)
        .unwrap()
        .with_certificate_provider(provider)
        .with_resolver(StubResolver)
}

async fn site_with_page(body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_new_rejects_unknown_task_before_any_request() {
    let mut config = AuditConfig::for_url("example.com");
    config.tasks = vec!["trackers".into()];
    let err = Auditor::new(config).err().unwrap();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_process_multiple_items_keeps_list_order() {
    let fetcher = StaticFetcher::default()
        .respond(Method::GET, "http://a.test/1.js", "one", &[])
        .respond(Method::GET, "http://a.test/2.js", "two", &[]);
    let auditor = auditor("a.test", &[]).with_fetcher(fetcher);

    assert_eq!(auditor.process_multiple_items(&[]).await, FetchBatch::Empty);

    let urls = [
        Url::parse("http://a.test/2.js").unwrap(),
        Url::parse("http://a.test/missing.js").unwrap(),
        Url::parse("http://a.test/1.js").unwrap(),
    ];
    let results = auditor.process_multiple_items(&urls).await.into_vec();
    let seen: Vec<_> = results.iter().map(|r| (r.text(), r.status_code)).collect();
    assert_eq!(seen, vec![("two", 200), ("", 0), ("one", 200)]);
}

#[tokio::test]
async fn test_full_run_emits_sections_in_render_order() {
    let server = site_with_page("<html><head><title>Home</title></head><body>hi</body></html>").await;
    let auditor = auditor(&server.uri(), &[]);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(
        sink.order(),
        vec![
            TaskKind::General,
            TaskKind::Ssl,
            TaskKind::Fonts,
            TaskKind::Social,
            TaskKind::Prefetching,
            TaskKind::Analytics,
            TaskKind::Externals,
            TaskKind::Cdn,
            TaskKind::Videos,
            TaskKind::Forms,
            TaskKind::Cookies,
            TaskKind::Nfz,
            TaskKind::Audit,
        ]
    );
    assert_eq!(report.general.unwrap().title, "Home");
    assert_eq!(report.ssl, Some(SslReport::Unavailable));
    assert!(report.nfz.is_some());
}

#[tokio::test]
async fn test_finalizers_run_once_without_nfz() {
    let server = site_with_page("<html><body><form action=\"/send\"></form></body></html>").await;
    let auditor = auditor(&server.uri(), &["forms", "audit"]);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(
        sink.order(),
        vec![TaskKind::General, TaskKind::Forms, TaskKind::Audit]
    );
    assert_eq!(sink.count(TaskKind::Audit), 1);
    assert!(report.nfz.is_none());
    let audit = report.audit.unwrap();
    assert_eq!(audit[0].topic, "Forms");
}

#[tokio::test]
async fn test_nfz_reports_both_parties() {
    let server = site_with_page("<html></html>").await;
    let auditor = auditor(&server.uri(), &["nfz"]);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(sink.order(), vec![TaskKind::General, TaskKind::Nfz]);
    let nfz = report.nfz.unwrap();
    assert_eq!(nfz.website.v4, Some(vec!["192.0.2.10".parse::<IpAddr>().unwrap()]));
    assert_eq!(nfz.auditor.v6, Some(vec!["2001:db8::1".parse::<IpAddr>().unwrap()]));
    assert_eq!(nfz.user_agent, crate::fetcher::DEFAULT_USER_AGENT);
    assert!(sink.get(TaskKind::Nfz).unwrap().text().contains("Website IPv4"));
    assert!(report.audit.is_none());
}

#[tokio::test]
async fn test_ssl_is_skipped_for_plain_http() {
    let server = site_with_page("<html></html>").await;
    let (provider, calls) = CountingProvider::new(false);
    let auditor = auditor(&server.uri(), &["ssl", "audit"]).with_certificate_provider(provider);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.ssl, Some(SslReport::Unavailable));
    assert_eq!(report.audit.unwrap()[0].topic, "Security");
}

#[tokio::test]
async fn test_https_site_reports_certificate() {
    let fetcher = StaticFetcher::default()
        .respond_at(Method::GET, "http://secure.test/", "https://secure.test/", "", &[])
        .respond(Method::GET, "https://secure.test/", "<html></html>", &[]);

    let (provider, calls) = CountingProvider::new(false);
    let auditor = auditor("secure.test", &["ssl"])
        .with_fetcher(fetcher)
        .with_certificate_provider(provider);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.url.unwrap().as_str(), "https://secure.test/");
    assert_eq!(report.ssl, Some(SslReport::Available(sample_certificate())));
    assert!(sink.get(TaskKind::Ssl).unwrap().text().contains("Test CA R1"));
}

#[tokio::test]
async fn test_certificate_failure_aborts_run() {
    let fetcher = StaticFetcher::default().respond_at(
        Method::GET,
        "http://secure.test/",
        "https://secure.test/",
        "",
        &[],
    );
    let auditor = auditor("secure.test", &["ssl"]).with_fetcher(fetcher);

    let mut sink = MemorySink::new();
    let err = auditor.run(&mut sink).await.unwrap_err();
    assert!(matches!(err, Error::Certificate { ref host, .. } if host == "secure.test"));
    assert!(sink.get(TaskKind::Ssl).is_none());
}

#[tokio::test]
async fn test_unreachable_site_keeps_input_url() {
    let auditor = auditor("offline.test/", &["forms"]).with_fetcher(StaticFetcher::default());

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    assert_eq!(report.url.unwrap().as_str(), "http://offline.test/");
    assert_eq!(report.forms, Some(Vec::new()));
}

#[tokio::test]
async fn test_cookies_from_page_and_video_probe() {
    let page = r#"<html><body>
<iframe width="560" src="https://www.youtube.com/embed/abc123" allowfullscreen></iframe>
</body></html>"#;
    let fetcher = StaticFetcher::default()
        .respond(
            Method::GET,
            "http://cookies.test/",
            page,
            &["session=1; Path=/", "pref=2; Max-Age=600"],
        )
        .respond(
            Method::HEAD,
            "https://www.youtube.com/embed/abc123",
            "",
            &["VISITOR=x; Expires=Fri, 01 Jan 2100 00:00:00 GMT; Secure"],
        );
    let auditor = auditor("cookies.test", &["videos", "cookies", "audit"]).with_fetcher(fetcher);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    let cookies = report.cookies.unwrap();
    assert_eq!(cookies.probes, 1);
    let seen: Vec<_> = cookies
        .cookies
        .iter()
        .map(|c| (c.host.as_str(), c.name.as_str(), c.status))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("cookies.test", "session", CookieStatus::Session),
            ("cookies.test", "pref", CookieStatus::Compliant),
            ("www.youtube.com", "VISITOR", CookieStatus::Flagged),
        ]
    );

    let topics: Vec<_> = report.audit.unwrap().into_iter().map(|r| r.topic).collect();
    assert_eq!(topics, vec!["External videos".to_string(), "Cookies".to_string()]);
    assert_eq!(sink.count(TaskKind::Cookies), 1);
}

#[tokio::test]
async fn test_cookie_threshold_is_configurable() {
    let fetcher = StaticFetcher::default().respond(
        Method::GET,
        "http://cookies.test/",
        "<html></html>",
        // about two months
        &["uid=1; Max-Age=5184000"],
    );
    let mut config = AuditConfig::for_url("cookies.test");
    config.tasks = vec!["cookies".into()];
    config.cookie_threshold_months = 1;
    let auditor = Auditor::new(config)
        .unwrap()
        .with_fetcher(fetcher)
        .with_resolver(StubResolver);

    let report = auditor.run(&mut MemorySink::new()).await.unwrap();
    let cookies = report.cookies.unwrap();
    assert_eq!(cookies.threshold_months, 1);
    assert_eq!(cookies.cookies[0].status, CookieStatus::Flagged);
}

#[tokio::test]
async fn test_error_responses_contribute_no_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><head><script src="/broken.js"></script></head></html>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.js"))
        .respond_with(ResponseTemplate::new(500).append_header("Set-Cookie", "err=1"))
        .mount(&server)
        .await;

    let auditor = auditor(&server.uri(), &["cookies"]);
    let report = auditor.run(&mut MemorySink::new()).await.unwrap();
    assert!(report.cookies.unwrap().cookies.is_empty());
}

#[tokio::test]
async fn test_analytics_with_unreachable_protocol_relative_script() {
    let page = r#"<html><head>
<script src="//cdn.example.com/a.js"></script>
<script>
(function(i,s,o,g,r,a,m){i['GoogleAnalyticsObject']=r;})(window,document,'script','https://www.google-analytics.com/analytics.js','ga');
ga('create', 'UA-12345-6', 'auto');
ga('send', 'pageview');
</script>
</head></html>"#;
    let fetcher = StaticFetcher::default().respond(Method::GET, "http://shop.test/", page, &[]);
    let auditor = auditor("shop.test", &["analytics", "externals", "audit"]).with_fetcher(fetcher);

    let mut sink = MemorySink::new();
    let report = auditor.run(&mut sink).await.unwrap();

    let ga = report.analytics.unwrap().ga.unwrap();
    assert_eq!(ga.property_id, "UA-12345-6");
    assert_eq!(report.externals.unwrap(), vec!["cdn.example.com".to_string()]);

    let topics: Vec<_> = report.audit.unwrap().into_iter().map(|r| r.topic).collect();
    assert_eq!(
        topics,
        vec!["Third party".to_string(), "External dependencies".to_string()]
    );
    assert_eq!(
        sink.order(),
        vec![
            TaskKind::General,
            TaskKind::Analytics,
            TaskKind::Externals,
            TaskKind::Audit
        ]
    );
}
