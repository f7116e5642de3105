use checkout_wizard::application::wizard::WizardController;
use checkout_wizard::config::{DEFAULT_TIMEOUT_SECS, WizardConfig};
use checkout_wizard::domain::format::Currency;
use checkout_wizard::domain::ports::PaymentServiceRef;
use checkout_wizard::infrastructure::http::HttpPaymentService;
use checkout_wizard::infrastructure::in_memory::InMemoryPaymentService;
use checkout_wizard::interfaces::csv::event_reader::{Applied, EventReader};
use checkout_wizard::logging::init_tracing;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input events CSV file (columns: action, target, value)
    input: PathBuf,

    /// Payment service base URL. If omitted, an in-memory service approves every request.
    #[arg(long, env = "CHECKOUT_BASE_URL")]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CHECKOUT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Currency used when displaying amounts (PHP, USD, EUR)
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "PHP")]
    currency: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let currency: Currency = cli.currency.parse().into_diagnostic()?;
    let mut config = WizardConfig::new()
        .with_timeout_secs(cli.timeout_secs)
        .with_currency(currency);
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    let service: PaymentServiceRef = if config.is_offline() {
        eprintln!(
            "WARNING: No payment service URL configured (--base-url). Falling back to the in-memory payment service."
        );
        Arc::new(InMemoryPaymentService::new())
    } else {
        Arc::new(HttpPaymentService::from_config(&config).into_diagnostic()?)
    };

    let mut wizard = WizardController::new(service).with_currency(config.currency);

    // Replay the collaborator's events
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event in reader.events() {
        match event {
            Ok(event) => match event.apply(&mut wizard).await {
                Applied::Edit(false) => debug!(step = %wizard.step(), "input refused"),
                Applied::Move(transition) => debug!(?transition, step = %wizard.step()),
                Applied::Edit(true) => {}
            },
            Err(e) => {
                eprintln!("Error reading event: {}", e);
            }
        }
    }

    // Output final state
    let snapshot = wizard.snapshot();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &snapshot).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;

    Ok(())
}
