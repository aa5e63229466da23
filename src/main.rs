use anyhow::Context;

use access_wizard::config::WizardConfig;
use access_wizard::script::{Script, run_script};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WizardConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let script_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ACCESS_WIZARD_SCRIPT").ok())
        .unwrap_or_else(|| {
            eprintln!("Usage: access-wizard <script.json>");
            eprintln!("  or export ACCESS_WIZARD_SCRIPT=path/to/script.json");
            std::process::exit(2);
        });

    eprintln!("🧭 Access Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Script: {}", script_path);
    eprintln!(
        "   Completion timeout: {}s\n",
        config.completion_timeout.as_secs()
    );

    let script = Script::from_path(&script_path)
        .await
        .with_context(|| format!("Failed to load script {script_path}"))?;

    let report = run_script(script, &config)
        .await
        .context("Script replay failed")?;

    if let Some(view) = &report.confirmation {
        eprintln!("{}", view.to_text());
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
