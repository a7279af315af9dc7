use anyhow::{Context, Result};
use clap::Parser;
use sched_model::{
    Algorithm, Job, Sim, SimConfig, SimReport, SweepReport, TimelineMode,
    config::ConfigError,
    core::SchedEvent,
    sim::workload::{bernoulli_jobs, builtin_dataset, load_dataset, take_first},
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "sched_model", version, about = "CPU scheduling policy simulator")]
struct Cli {
    /// TOML config file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// rr, priority or mlfq
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Time quantum in ticks (fractions round up, non-positive becomes 1)
    #[arg(short, long)]
    quantum: Option<f64>,

    /// Number of processes to take from the workload
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// MLFQ level count
    #[arg(long)]
    levels: Option<usize>,

    /// Priority: one timeline entry per tick instead of per run
    #[arg(long)]
    per_tick: bool,

    /// JSON dataset of processes
    #[arg(short, long, conflicts_with = "generate")]
    dataset: Option<PathBuf>,

    /// Generate a random workload over this many ticks instead of a dataset
    #[arg(long)]
    generate: Option<u64>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Round Robin: also sweep the quantum range
    #[arg(long)]
    sweep: bool,

    /// Print every scheduling event
    #[arg(long)]
    trace: bool,

    #[arg(long)]
    json: bool,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    report: &'a SimReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<&'a SweepReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = build_config(&cli)?;

    let policy = match config.policy() {
        Ok(policy) => policy,
        Err(ConfigError::NoAlgorithm) => {
            eprintln!(
                "Please select an algorithm before running the simulation (--algorithm rr|priority|mlfq)."
            );
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err).context("invalid configuration"),
    };

    let jobs = match (&config.dataset, cli.generate) {
        (_, Some(ticks)) => bernoulli_jobs(ticks, 0.3, 0.3, 2, 6, 5, cli.seed),
        (Some(path), None) => load_dataset(path)?,
        (None, None) => builtin_dataset(),
    };
    let jobs = take_first(jobs, config.count);
    log::info!("{} processes, policy {:?}", jobs.len(), policy);

    let sim = Sim::new(jobs)?;
    let (report, events) = if cli.trace {
        sim.run_traced(&policy)?
    } else {
        (sim.run(&policy)?, Vec::new())
    };

    // Response-vs-quantum only makes sense for Round Robin
    let sweep = match (cli.sweep, config.algorithm) {
        (true, Some(Algorithm::RoundRobin)) => Some(sim.quantum_sweep(config.sweep_range())?),
        (true, _) => {
            log::warn!("--sweep only applies to Round Robin; ignoring");
            None
        }
        _ => None,
    };

    if cli.json {
        let output = Output {
            report: &report,
            sweep: sweep.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if cli.trace {
            print_events(sim.jobs(), &events);
        }
        print_report(&report);
        if let Some(sweep) = &sweep {
            print_sweep(sweep);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if let Some(algorithm) = cli.algorithm {
        config.algorithm = Some(algorithm);
    }
    if let Some(quantum) = cli.quantum {
        config.quantum = quantum;
    }
    if let Some(count) = cli.count {
        config.count = count;
    }
    if let Some(levels) = cli.levels {
        config.mlfq_levels = Some(levels);
    }
    if cli.per_tick {
        config.timeline_mode = TimelineMode::PerTick;
    }
    if let Some(dataset) = &cli.dataset {
        config.dataset = Some(dataset.clone());
    }
    Ok(config)
}

fn print_events(jobs: &[Job], events: &[SchedEvent]) {
    let pid = |task: usize| jobs[task].pid.as_str();
    for event in events {
        match *event {
            SchedEvent::Admitted { task, at } => println!("t={at} {} admitted", pid(task)),
            SchedEvent::Dispatched { task, at, ran } => {
                println!("t={at} {} runs for {ran}", pid(task))
            }
            SchedEvent::Preempted {
                task,
                at,
                remaining,
            } => println!("t={at} {} preempted, {remaining} left", pid(task)),
            SchedEvent::Completed { task, at } => println!("t={at} {} completed", pid(task)),
            SchedEvent::CpuIdle { from, to } => println!("t={from} idle until {to}"),
        }
    }
    println!();
}

fn print_report(report: &SimReport) {
    println!("{}", report.algorithm);
    println!();
    println!("{:>8} {:>6} {:>6}", "pid", "start", "end");
    for entry in &report.timeline {
        println!("{:>8} {:>6} {:>6}", entry.pid, entry.start, entry.end);
    }

    println!();
    println!(
        "{:>8} {:>7} {:>5} {:>4} {:>10} {:>10} {:>7} {:>8}",
        "pid", "arrival", "burst", "prio", "completion", "turnaround", "waiting", "response"
    );
    for p in &report.processes {
        println!(
            "{:>8} {:>7} {:>5} {:>4} {:>10} {:>10} {:>7} {:>8}",
            p.pid,
            p.arrival,
            p.burst,
            p.priority,
            p.completion_time,
            p.turnaround_time,
            p.waiting_time,
            p.response_time
        );
    }

    let m = &report.metrics;
    println!();
    println!("Average waiting time:    {:.2} ticks", m.avg_waiting_time);
    println!("Average turnaround time: {:.2} ticks", m.avg_turnaround_time);
    println!("Average response time:   {:.2} ticks", m.avg_response_time);
    println!("Throughput:              {:.2} processes/tick", m.throughput);
    println!("Context switches:        {}", m.context_switches);
}

fn print_sweep(sweep: &SweepReport) {
    println!();
    println!("{:>7} {:>13}", "quantum", "avg response");
    for point in &sweep.points {
        println!("{:>7} {:>13.2}", point.quantum, point.response_time);
    }
    println!(
        "Best quantum: {} (mean response across sweep {:.2})",
        sweep.best_quantum, sweep.mean_response_time
    );
}
