use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use shopfloor::workflow::{
    ConsumptionPhase, EngineEvent, EnginePhase, ExpectedInput, OperatorInput, ProcessEngine,
    ProcessSelector, TestVerdict, WorkflowCatalog, WorkflowOutcome,
};
use shopfloor::{
    config, init_config, init_telemetry, HttpBackend, InMemoryBackend, ShopFloorBackend,
    ShopfloorConfig,
};

#[derive(Parser)]
#[command(name = "shopfloor")]
#[command(about = "Shop-floor operator terminal: scan assembly units through station workflows")]
#[command(
    long_about = "Shopfloor drives operators through per-station process steps (scanning, \
                  raw-material consumption, testing, packing) against a manufacturing \
                  execution backend. Start with 'shopfloor stations' to see the workflows."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter shopfloor.toml with the default settings
    Init {
        /// Overwrite an existing shopfloor.toml
        #[arg(long)]
        force: bool,
    },
    /// List operator stations and their step sequences
    Stations,
    /// List open work orders (Released or InProgress) from the backend
    WorkOrders,
    /// Run a station process for a work order
    Run {
        /// Station id, e.g. station-assembly
        #[arg(long)]
        station: String,
        /// Work order id or number
        #[arg(long)]
        work_order: String,
        /// Use a seeded in-memory backend instead of the configured one
        #[arg(long)]
        demo: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    ShopfloorConfig::load_env_file()?;
    init_config()?;
    let cfg = config()?;
    init_telemetry(&cfg.observability)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { force } => init_command(force),
        Commands::Stations => stations_command(),
        Commands::WorkOrders => {
            let backend = HttpBackend::from_config(&cfg.backend)?;
            work_orders_command(Arc::new(backend), cfg).await
        }
        Commands::Run {
            station,
            work_order,
            demo,
        } => {
            if demo {
                let backend = Arc::new(InMemoryBackend::seeded_demo());
                run_command(backend, &station, &work_order, cfg).await
            } else {
                let backend = Arc::new(HttpBackend::from_config(&cfg.backend)?);
                run_command(backend, &station, &work_order, cfg).await
            }
        }
    }
}

fn init_command(force: bool) -> Result<()> {
    if Path::new("shopfloor.toml").exists() && !force {
        bail!("shopfloor.toml already exists (use --force to overwrite)");
    }
    ShopfloorConfig::default().save_to_file("shopfloor.toml")?;
    println!("Wrote shopfloor.toml");
    Ok(())
}

fn stations_command() -> Result<()> {
    let catalog = WorkflowCatalog::builtin();
    for station in shopfloor::workflow::STATIONS {
        println!("{} ({})", station.name, station.id);
        println!("  {}", station.description);
        for step in catalog.lookup(station.id) {
            println!("  {}. {} [{:?}]", step.step_number, step.name, step.kind);
        }
        println!();
    }
    Ok(())
}

async fn work_orders_command<B: ShopFloorBackend>(
    backend: Arc<B>,
    cfg: &ShopfloorConfig,
) -> Result<()> {
    let selector = ProcessSelector::new(backend, WorkflowCatalog::builtin(), cfg.process.clone());
    let work_orders = selector.open_work_orders().await?;
    if work_orders.is_empty() {
        println!("No open work orders.");
        return Ok(());
    }
    for wo in work_orders {
        println!(
            "{}  {} - {} ({} units) [{:?}]",
            wo.id, wo.work_order_no, wo.product_name, wo.quantity, wo.status
        );
    }
    Ok(())
}

async fn run_command<B: ShopFloorBackend>(
    backend: Arc<B>,
    station_id: &str,
    work_order: &str,
    cfg: &ShopfloorConfig,
) -> Result<()> {
    let selector = ProcessSelector::new(backend, WorkflowCatalog::builtin(), cfg.process.clone());

    let open = selector.open_work_orders().await?;
    let Some(order) = open
        .iter()
        .find(|wo| wo.id == work_order || wo.work_order_no == work_order)
    else {
        bail!(
            "work order '{work_order}' is not open; available: {}",
            open.iter()
                .map(|wo| wo.work_order_no.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let mut engine = selector.start(station_id, &order.id);
    println!(
        "Running {} for work order {} ({})",
        station_id, order.work_order_no, order.product_name
    );
    for step in engine.steps() {
        println!("  {}. {}", step.step_number, step.name);
    }
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let step = match engine.phase() {
            EnginePhase::Running { .. } => match engine.current_step() {
                Some(step) => step.clone(),
                None => break,
            },
            EnginePhase::Completed { outcome } => {
                match outcome {
                    WorkflowOutcome::Finished => println!("Workflow completed successfully."),
                    WorkflowOutcome::TestFailed => {
                        println!("Test failed. Assembly unit marked as failed; run ended.")
                    }
                }
                break;
            }
            EnginePhase::Cancelled => {
                println!("Workflow cancelled.");
                break;
            }
        };

        let done = engine.state().completed_steps.len();
        let total = engine.steps().len();
        println!("[{done}/{total}] Step {}: {}", step.step_number, step.name);
        print_prompt(&engine)?;

        let Some(line) = lines.next_line().await? else {
            println!();
            println!("Input closed; leaving workflow.");
            break;
        };
        let input = parse_operator_line(&engine, line.trim());

        match engine.handle_input(input).await {
            Ok(EngineEvent::Advanced { .. }) => {}
            Ok(EngineEvent::MaterialScanned) => println!("Material scanned. Accept or reject?"),
            Ok(EngineEvent::MaterialAccepted) => println!("Material accepted."),
            Ok(EngineEvent::MaterialRejected) => println!("Material rejected; scan a replacement."),
            Ok(EngineEvent::Completed { .. }) | Ok(EngineEvent::Cancelled) => {}
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}

fn print_prompt<B: ShopFloorBackend>(engine: &ProcessEngine<B>) -> Result<()> {
    let Some(step) = engine.current_step() else {
        return Ok(());
    };
    let prompt = match step.kind.expected_input() {
        ExpectedInput::Barcode => {
            if matches!(
                engine.consumption_phase(),
                ConsumptionPhase::MaterialScanned { .. }
            ) {
                "accept/reject/cancel> "
            } else {
                "scan (Code:SerialNumber) or cancel> "
            }
        }
        ExpectedInput::TestResult => "pass/fail/cancel> ",
        ExpectedInput::Confirmation => "ok/cancel> ",
    };
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(())
}

/// Maps a terminal line onto an operator action. Anything that is not a
/// keyword is treated as a barcode scan.
fn parse_operator_line<B: ShopFloorBackend>(
    engine: &ProcessEngine<B>,
    line: &str,
) -> OperatorInput {
    match line.to_ascii_lowercase().as_str() {
        "cancel" => OperatorInput::Cancel,
        "accept" => OperatorInput::Accept,
        "reject" => OperatorInput::Reject,
        "pass" => OperatorInput::Test(TestVerdict::Pass),
        "fail" => OperatorInput::Test(TestVerdict::Fail),
        "ok" | "confirm" => OperatorInput::Confirm,
        "" => {
            // Bare enter confirms on confirmation steps, otherwise scans
            // an empty (invalid) barcode and surfaces the format error.
            match engine.current_step().map(|s| s.kind.expected_input()) {
                Some(ExpectedInput::Confirmation) => OperatorInput::Confirm,
                _ => OperatorInput::Scan(String::new()),
            }
        }
        _ => OperatorInput::Scan(line.to_string()),
    }
}
