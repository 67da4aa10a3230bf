use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use radtest_client::RadtestClient;
use radtest_engine::{
    NoopExecutor, RemoteStepExecutor, RunOutcome, SequenceController, SequencePlan, StepExecutor, parse_session_file,
};
use radtest_types::{ConnectionParams, HistoryEntry, RunEvent, StepKind, StepRequest, Vendor};
use radtest_util::{AppConfig, JsonPresetStore, PresetStore, redact_secrets};
use tokio::sync::mpsc::unbounded_channel;
use tracing::Level;

#[derive(Parser)]
#[command(name = "radtest", version, about = "Console for composing and running RADIUS exchange sequences")]
struct Cli {
    /// Execution service endpoint (overrides RADTEST_ENDPOINT).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose a sequence from step names or a preset and run it.
    Run {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Steps to execute, in order: auth, start, alive, stop.
        #[arg(value_name = "STEP", required_unless_present = "preset")]
        steps: Vec<String>,

        /// Load the sequence from a named preset instead of step arguments.
        #[arg(long, conflicts_with = "steps")]
        preset: Option<String>,

        /// Echo requests without dispatching anything to the service.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a session file (name, connection settings, sequence) as YAML.
    RunSession {
        /// Path to the session YAML file.
        file: PathBuf,

        /// Echo requests without dispatching anything to the service.
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe whether the execution service can reach the RADIUS server.
    TestConnection {
        /// RADIUS server address.
        #[arg(long, default_value = "127.0.0.1")]
        server: String,

        /// Shared secret.
        #[arg(long)]
        secret: String,

        /// NAS vendor profile.
        #[arg(long, default_value = "mikrotik")]
        vendor: String,
    },

    /// Print the default attribute-value pairs for a vendor.
    Defaults {
        /// NAS vendor profile.
        vendor: String,
    },

    /// Render a packet preview for one step without sending it.
    Preview {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Step to preview.
        #[arg(value_name = "STEP")]
        step: String,
    },

    /// List known sequence presets.
    Presets,
}

/// Connection settings shared by the run and preview commands.
#[derive(Args, Clone)]
struct ConnectionOpts {
    /// RADIUS server address the execution service should target.
    #[arg(long, default_value = "127.0.0.1")]
    server: String,

    /// Shared secret between the simulated NAS and the server.
    #[arg(long)]
    secret: String,

    /// NAS vendor profile: mikrotik, cisco, or fortigate.
    #[arg(long, default_value = "mikrotik")]
    vendor: String,

    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,

    /// Attribute override as NAME=VALUE; repeatable.
    #[arg(long = "avp", value_name = "NAME=VALUE")]
    avps: Vec<String>,
}

impl ConnectionOpts {
    fn into_params(self) -> Result<ConnectionParams> {
        let vendor: Vendor = self.vendor.parse()?;
        let mut avps = IndexMap::new();
        for pair in &self.avps {
            let (name, value) = pair
                .split_once('=')
                .with_context(|| format!("invalid AVP override '{pair}'; expected NAME=VALUE"))?;
            avps.insert(name.trim().to_string(), value.trim().to_string());
        }
        Ok(ConnectionParams {
            server: self.server,
            secret: self.secret,
            vendor,
            username: self.username,
            password: self.password,
            avps,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }

    match cli.command {
        Command::Run {
            connection,
            steps,
            preset,
            dry_run,
        } => {
            let plan = compose_plan(steps, preset.as_deref())?;
            let params = connection.into_params()?;
            run_sequence(&config, plan, params, dry_run).await
        }
        Command::RunSession { file, dry_run } => {
            let session = parse_session_file(&file)?;
            println!("Session: {}", session.name);
            let plan = SequencePlan::from_steps(session.sequence);
            run_sequence(&config, plan, session.config, dry_run).await
        }
        Command::TestConnection { server, secret, vendor } => {
            let vendor: Vendor = vendor.parse()?;
            let client = build_client(&config)?;
            let probe = client.test_connection(&server, &secret, vendor).await?;
            println!("{}", probe.message);
            if let Some(elapsed) = probe.response_time_ms {
                println!("Response time: {elapsed:.2} ms");
            }
            if !probe.success {
                bail!("connection test failed");
            }
            Ok(())
        }
        Command::Defaults { vendor } => {
            let vendor: Vendor = vendor.parse()?;
            let client = build_client(&config)?;
            let defaults = client.vendor_defaults(vendor).await?;
            println!("Default AVPs for {vendor}:");
            for (name, value) in &defaults {
                println!("  {name}: {value}");
            }
            Ok(())
        }
        Command::Preview { connection, step } => {
            let command: StepKind = step.parse()?;
            let params = connection.into_params()?;
            let client = build_client(&config)?;
            let preview = client.preview_packet(&StepRequest::new(&params, command)).await?;
            println!("{}", redact_secrets(&preview));
            Ok(())
        }
        Command::Presets => {
            let store = JsonPresetStore::with_defaults()?;
            for (name, sequence) in &store.all()? {
                let rendered: Vec<String> = sequence
                    .iter()
                    .map(|step| format!("{} {}", step.meta().glyph, step))
                    .collect();
                println!("{name}: {}", rendered.join(" → "));
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_client(config: &AppConfig) -> Result<RadtestClient> {
    RadtestClient::with_timeout(config.endpoint.clone(), config.timeout)
}

/// Build the plan from positional step names, or load a named preset.
fn compose_plan(steps: Vec<String>, preset: Option<&str>) -> Result<SequencePlan> {
    let store = JsonPresetStore::with_defaults()?;

    if let Some(name) = preset {
        let sequence = store
            .get(name)?
            .with_context(|| format!("unknown preset '{name}'; see `radtest presets`"))?;
        let mut plan = SequencePlan::new();
        plan.replace_all(sequence);
        return Ok(plan);
    }

    let mut plan = SequencePlan::new();
    for step in &steps {
        plan.append(step.parse()?);
    }
    if let Some(name) = plan.match_preset(&store.all()?) {
        println!("Sequence matches preset '{name}'");
    }
    Ok(plan)
}

/// Drive one run, streaming the transcript to stdout. Ctrl-C requests a
/// cooperative stop; the in-flight step finishes before the run halts.
async fn run_sequence(config: &AppConfig, plan: SequencePlan, params: ConnectionParams, dry_run: bool) -> Result<()> {
    let executor: Arc<dyn StepExecutor> = if dry_run {
        Arc::new(NoopExecutor)
    } else {
        Arc::new(RemoteStepExecutor::new(build_client(config)?))
    };
    let controller = Arc::new(SequenceController::new(executor).with_step_delay(config.step_delay));

    let (event_tx, mut event_rx) = unbounded_channel();
    let run_handle = tokio::spawn({
        let controller = Arc::clone(&controller);
        let plan = plan.clone();
        let params = params.clone();
        async move { controller.run(&plan, &params, &event_tx).await }
    });

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => match maybe_event {
                Some(RunEvent::Transcript { text }) => print!("{}", redact_secrets(&text)),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if controller.request_stop() {
                    eprintln!("Stop requested; waiting for the in-flight step to finish...");
                }
            }
        }
    }

    let outcome = run_handle.await.context("run task panicked")??;
    print_history(&controller.history());

    match outcome {
        RunOutcome::Completed(summary) if summary.failed > 0 => {
            bail!("sequence completed with {} failed step(s)", summary.failed)
        }
        _ => Ok(()),
    }
}

/// Print the history rows for this process, oldest first.
fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        return;
    }
    println!("\nExecution history:");
    for (index, entry) in entries.iter().rev().enumerate() {
        let mark = if entry.success { "✅" } else { "❌" };
        let duration = entry
            .duration_ms
            .map(|ms| format!("{ms} ms"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>2}. {} {} {:<16} {:>8}  {}",
            index + 1,
            mark,
            entry.command.meta().glyph,
            entry.command.meta().label,
            duration,
            entry.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }
}
