use clap::Parser;
use privacy_audit::{AuditConfig, Auditor, MemorySink, ReportSink, TerminalSink};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "privacy-audit")]
#[command(about = "Audit a website for trackers, cookies and third-party resources")]
#[command(long_about = "\
Audit a website for trackers, cookies and third-party resources

Without --task every check runs. Naming tasks runs only those, plus the
tasks they depend on.

Tasks:
  general      title, description, CMS, WordPress theme and plugins
  ssl          TLS certificate
  fonts        web fonts and their providers
  social       social media widgets
  prefetching  DNS prefetching hints
  analytics    Google Analytics, Tag Manager, Matomo, Plezi, WordPress Stats
  externals    stylesheets and scripts served from other hosts
  cdn          content delivery networks
  videos       embedded Youtube, Vimeo and Dailymotion players
  forms        forms and their destinations
  cookies      cookies set by the page and the third parties it loads
  nfz          NF Z67-147 metadata about the audit environment
  audit        recommendations for further human audit")]
#[command(version)]
struct Cli {
    /// Site to audit (https://example.com, //example.com or example.com)
    url: String,

    /// Run only this task (repeatable)
    #[arg(short, long = "task", value_name = "TASK")]
    tasks: Vec<String>,

    /// Tolerated cookie lifetime in months
    #[arg(long = "cookies", value_name = "MONTHS", default_value_t = 13)]
    cookie_threshold_months: u32,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// User agent announced to the site
    #[arg(long)]
    user_agent: Option<String>,

    /// Print the report as JSON instead of sections
    #[arg(long)]
    json: bool,

    /// Log every fetched resource (debug level)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> AuditConfig {
        let mut config = AuditConfig {
            url: self.url.clone(),
            tasks: self.tasks.clone(),
            cookie_threshold_months: self.cookie_threshold_months,
            request_timeout: self.timeout.map(Duration::from_secs),
            ..Default::default()
        };
        if let Some(agent) = &self.user_agent {
            config.user_agent = agent.clone();
        }
        config
    }
}

/// Stage progress from this crate, warnings from everything else
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,privacy_audit=debug"
    } else {
        "warn,privacy_audit=info"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(cli.verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "audit failed");
            eprintln!("Error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: &Cli) -> privacy_audit::Result<()> {
    let auditor = Auditor::new(cli.config())?;

    let mut terminal = TerminalSink::stdout();
    let mut memory = MemorySink::new();
    let sink: &mut dyn ReportSink = if cli.json { &mut memory } else { &mut terminal };

    let report = auditor.run(sink).await?;
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        println!();
    }
    Ok(())
}
