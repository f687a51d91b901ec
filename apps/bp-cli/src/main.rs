use bp_app::{
    AppError, AppResult, AutoManipulator, ControllerRole, MENU, ModeSource, OperatorCommand,
    PlantConfig, ProcessRole, SimOptions, SimOutcome, SimulationMode, TickDriver, read_mode_file,
    write_mode_file,
};
use bp_controls::ControllerId;
use bp_core::{FileTagStore, TagStore, TickStats, read_state};
use bp_coord::{FileTurnStore, TurnStore};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bplant")]
#[command(about = "Bottling plant simulation: process, controllers and operator", long_about = None)]
struct Cli {
    /// Plant configuration YAML (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Mode file overriding the one named in the configuration
    #[arg(long, global = true)]
    mode_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write initial tags and reset the coordination record
    Init {
        /// Also write this mode to the mode file
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
    /// Run the physical process loop
    Process {
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Run one controller loop
    Controller {
        #[arg(long, value_enum)]
        role: RoleArg,
        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print every tag in the shared store
    Status,
    /// Apply one operator command
    Operator {
        /// Menu choice (1-6)
        choice: i64,
        /// Setpoint for 1-3, mode code for 4-6
        value: f64,
    },
    /// Run the unattended operator
    AutoOperator {
        /// Stop after this many commands
        #[arg(long)]
        count: Option<u64>,
    },
    /// Run process and both controllers offline and print a summary
    Simulate {
        /// End time in seconds
        #[arg(long, default_value_t = 60.0)]
        t_end: f64,
        /// Tick length in seconds
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
        /// Run in fault mode regardless of the mode file
        #[arg(long)]
        faults: bool,
        /// Write recorded snapshots to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Normal,
    Faults,
}

impl From<ModeArg> for SimulationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => SimulationMode::Normal,
            ModeArg::Faults => SimulationMode::Faults,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    A,
    B,
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PlantConfig::load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.mode_file {
        config.mode.file = path;
    }

    match cli.command {
        Commands::Init { mode } => cmd_init(&config, mode.map(Into::into)),
        Commands::Process { ticks } => cmd_process(&config, ticks),
        Commands::Controller { role, ticks } => {
            let id = match role {
                RoleArg::A => ControllerId::A,
                RoleArg::B => ControllerId::B,
            };
            cmd_controller(&config, id, ticks)
        }
        Commands::Status => cmd_status(&config),
        Commands::Operator { choice, value } => cmd_operator(&config, choice, value),
        Commands::AutoOperator { count } => cmd_auto_operator(&config, count),
        Commands::Simulate {
            t_end,
            dt,
            faults,
            csv,
        } => cmd_simulate(&config, t_end, dt, faults, csv.as_deref()),
    }
}

fn tag_store(config: &PlantConfig) -> Arc<dyn TagStore> {
    Arc::new(FileTagStore::new(&config.tag_store))
}

fn turn_store(config: &PlantConfig) -> Arc<dyn TurnStore> {
    Arc::new(FileTurnStore::new(
        &config.coordination.file,
        config.coordination.initial_record(),
    ))
}

fn driver(config: &PlantConfig, ticks: Option<u64>) -> AppResult<TickDriver> {
    let mode = ModeSource::from_file(&config.mode.file, config.mode.policy);
    let driver = TickDriver::new(config.sample_config()?, mode);
    Ok(match ticks {
        Some(max) => driver.with_max_ticks(max),
        None => driver,
    })
}

fn cmd_init(config: &PlantConfig, mode: Option<SimulationMode>) -> AppResult<()> {
    config.validate()?;
    tag_store(config).initialize(&config.initial_values())?;
    turn_store(config).reset(config.coordination.initial_record())?;
    println!("✓ Tags written to {}", config.tag_store.display());
    println!(
        "✓ Coordination record reset in {} (first turn: {})",
        config.coordination.file.display(),
        config.coordination.first
    );
    if let Some(mode) = mode {
        write_mode_file(&config.mode.file, mode)?;
        println!("✓ Mode file {} set to {mode}", config.mode.file.display());
    }
    Ok(())
}

fn cmd_process(config: &PlantConfig, ticks: Option<u64>) -> AppResult<()> {
    config.validate()?;
    let mut role = ProcessRole::from_config(config, tag_store(config))?;
    let stats = driver(config, ticks)?.run(&mut role);
    print_tick_summary("factory", &stats);
    Ok(())
}

fn cmd_controller(config: &PlantConfig, id: ControllerId, ticks: Option<u64>) -> AppResult<()> {
    config.validate()?;
    let turns = config.coordination.enabled.then(|| turn_store(config));
    let mut role = ControllerRole::from_config(config, id, tag_store(config), turns)?;
    let stats = driver(config, ticks)?.run(&mut role);
    print_tick_summary(&id.to_string(), &stats);
    if let Some(gate) = role.gate() {
        let gate_stats = gate.stats();
        println!("  Turn waits:   {}", gate_stats.waits);
        println!("  Turn polls:   {}", gate_stats.polls);
        println!(
            "  Longest wait: {:.3}s",
            gate_stats.longest_wait.as_secs_f64()
        );
        println!("  Timeouts:     {}", gate_stats.timeouts);
    }
    Ok(())
}

fn cmd_status(config: &PlantConfig) -> AppResult<()> {
    let state = read_state(&*tag_store(config))?;
    println!("Plant tags in {}:", config.tag_store.display());
    for (tag, value) in state.to_tag_values() {
        println!("  {:<32} {}", tag.key(), value);
    }
    Ok(())
}

fn cmd_operator(config: &PlantConfig, choice: i64, value: f64) -> AppResult<()> {
    let submitted = OperatorCommand::from_choice(choice, value)
        .map_err(AppError::from)
        .and_then(|command| command.submit(&*tag_store(config)).map(|()| command));
    match submitted {
        Ok(command) => {
            println!("✓ {command}");
            Ok(())
        }
        Err(e @ AppError::Operator(_)) => {
            eprintln!("{e}\n\n{MENU}");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

fn cmd_auto_operator(config: &PlantConfig, count: Option<u64>) -> AppResult<()> {
    let mut manipulator =
        AutoManipulator::new(config.auto_operator.clone()).map_err(AppError::Validation)?;
    let store = tag_store(config);
    let mut sent = 0u64;
    while count.is_none_or(|max| sent < max) {
        let command = manipulator.next_command();
        match command.submit(&*store) {
            Ok(()) => info!(command = %command, "operator command applied"),
            Err(AppError::Operator(e)) => {
                warn!(command = %command, error = %e, "operator command rejected")
            }
            Err(e) => return Err(e),
        }
        sent += 1;
        if count.is_some_and(|max| sent >= max) {
            break;
        }
        std::thread::sleep(manipulator.next_pause());
    }
    Ok(())
}

fn cmd_simulate(
    config: &PlantConfig,
    t_end: f64,
    dt: f64,
    faults: bool,
    csv: Option<&Path>,
) -> AppResult<()> {
    let mode = if faults {
        SimulationMode::Faults
    } else if config.mode.file.exists() {
        read_mode_file(&config.mode.file)
    } else {
        SimulationMode::Normal
    };
    println!("Running offline simulation ({mode} mode)");
    println!("  dt = {:.3} s, t_end = {:.3} s", dt, t_end);

    let opts = SimOptions {
        dt,
        t_end,
        mode,
        ..SimOptions::default()
    };
    let outcome = bp_app::simulate(config, &opts)?;
    print_sim_summary(&outcome);

    if let Some(path) = csv {
        std::fs::write(path, snapshots_csv(&outcome))?;
        println!(
            "✓ Exported {} snapshots to {}",
            outcome.record.t.len(),
            path.display()
        );
    }
    Ok(())
}

fn print_tick_summary(role: &str, stats: &TickStats) {
    println!("\n{role} stopped:");
    println!("  Ticks:        {}", stats.ticks);
    println!("  Failed:       {}", stats.failed_ticks);
    println!("  Overruns:     {}", stats.overruns);
    println!(
        "  Avg latency:  {:.4}s (max {:.4}s)",
        stats.average_latency().as_secs_f64(),
        stats.max_latency.as_secs_f64()
    );
}

fn print_sim_summary(outcome: &SimOutcome) {
    let c = &outcome.counters;
    println!("\nSimulation summary:");
    println!("  Steps:            {}", c.steps);
    println!("  Bottles shipped:  {}", c.bottles_shipped);
    println!("  Bottles filled:   {}", c.bottles_filled);
    println!("  Process events:   {}", c.process_events);
    println!("  Actuator changes: {}", c.actuator_commands);
    println!("  Faults applied:   {}", c.faults_applied);
    if !c.injected_delay.is_zero() {
        println!(
            "  Injected delay:   {:.1}s (not slept)",
            c.injected_delay.as_secs_f64()
        );
    }
    println!("  Failed ticks:     {}", c.failed_ticks);

    if let Some(last) = outcome.record.x.last() {
        println!("\nFinal state:");
        println!("  Tank level:       {:.3}", last.tank_level);
        println!("  Bottle level:     {:.3}", last.bottle_level);
        println!(
            "  Bottle distance:  {:.3}",
            last.bottle_distance_to_filler
        );
    }
}

fn snapshots_csv(outcome: &SimOutcome) -> String {
    let mut csv = String::from(
        "time_s,tank_level,tank_output_flow,bottle_level,bottle_distance_to_filler,\
         tank_input_valve,tank_output_valve,conveyor_engine\n",
    );
    for (t, x) in outcome.record.t.iter().zip(&outcome.record.x) {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            t,
            x.tank_level,
            x.tank_output_flow,
            x.bottle_level,
            x.bottle_distance_to_filler,
            u8::from(x.tank_input_valve_status),
            u8::from(x.tank_output_valve_status),
            u8::from(x.conveyor_engine_status)
        ));
    }
    csv
}
