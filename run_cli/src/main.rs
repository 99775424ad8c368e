use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use run_core::export::{self, ExportFormat};
use run_core::stats;
use run_core::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "runlog")]
#[command(about = "Running log with training stats and live tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a completed run
    Add {
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Distance in km
        #[arg(long)]
        distance: f64,

        /// Duration in minutes
        #[arg(long)]
        duration: f64,

        /// Free-text type, e.g. "Easy Run" or "Tempo"
        #[arg(long = "type")]
        workout_type: Option<String>,
    },

    /// List logged runs, most recent first
    List,

    /// Change fields of a logged run
    Edit {
        index: usize,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        distance: Option<f64>,

        #[arg(long)]
        duration: Option<f64>,

        #[arg(long = "type")]
        workout_type: Option<String>,
    },

    /// Delete a logged run
    Delete { index: usize },

    /// Give kudos to a run
    Kudos { index: usize },

    /// Totals, best pace and the suggested next workout (default)
    Stats,

    /// Personal records
    Records,

    /// Suggest the next workout type
    Suggest {
        /// Number of recent runs to balance over
        #[arg(long)]
        window: Option<usize>,
    },

    /// Daily distance for the last few days
    Chart {
        #[arg(long)]
        days: Option<u32>,

        /// Last day of the chart (defaults to today)
        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Weekly distance totals
    Weeks {
        #[arg(long)]
        count: Option<u32>,

        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Training calendar of active days
    Calendar {
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        until: Option<NaiveDate>,
    },

    /// Track a run live (distance estimated from time)
    Live {
        /// Stop automatically after this many seconds
        #[arg(long)]
        stop_after: Option<u64>,
    },

    /// Export all runs
    Export {
        /// json or csv
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Output file ("-" for stdout); defaults to running-tracker-<date>.<ext>
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show or change display settings
    Settings {
        /// Switch between light and dark theme
        #[arg(long)]
        toggle_theme: bool,

        /// metric or imperial
        #[arg(long)]
        units: Option<Units>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    run_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let backend = FileStore::new(&data_dir);

    let mut ctx = AppContext::open(config, backend, SystemClock);
    let today = Utc::now().date_naive();

    match cli.command.unwrap_or(Commands::Stats) {
        Commands::Add {
            date,
            distance,
            duration,
            workout_type,
        } => {
            let date = date.unwrap_or_else(|| stats::date_key(today));
            let mut workout = Workout::new(date, distance, duration);
            workout.workout_type = workout_type.filter(|t| !t.trim().is_empty());
            let status = ctx.workouts.append(workout)?;
            report_save(&status);
            println!("✓ Run logged!");
            Ok(())
        }
        Commands::List => cmd_list(&ctx),
        Commands::Edit {
            index,
            date,
            distance,
            duration,
            workout_type,
        } => {
            let patch = WorkoutPatch {
                date,
                distance,
                duration,
                workout_type,
                kudos: None,
            };
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let status = ctx.workouts.update_at(index, &patch)?;
            report_save(&status);
            println!("✓ Run #{} updated", index);
            Ok(())
        }
        Commands::Delete { index } => {
            let (removed, status) = ctx.workouts.remove_at(index)?;
            report_save(&status);
            println!("✓ Deleted run from {} ({} km)", removed.date, removed.distance);
            Ok(())
        }
        Commands::Kudos { index } => {
            let (kudos, status) = ctx.workouts.increment_kudos(index)?;
            report_save(&status);
            println!("♥ Run #{} has {} kudos", index, kudos);
            Ok(())
        }
        Commands::Stats => cmd_stats(&ctx),
        Commands::Records => cmd_records(&ctx),
        Commands::Suggest { window } => {
            let window = window.unwrap_or(ctx.config.stats.recent_window);
            let suggestion = stats::suggest_next_workout(ctx.workouts.get_all(), window);
            println!("Suggested workout: {}", suggestion);
            Ok(())
        }
        Commands::Chart { days, until } => {
            let days = days.unwrap_or(ctx.config.stats.chart_days);
            cmd_chart(&ctx, days, until.unwrap_or(today))
        }
        Commands::Weeks { count, until } => {
            let count = count.unwrap_or(ctx.config.stats.chart_weeks);
            cmd_weeks(&ctx, count, until.unwrap_or(today))
        }
        Commands::Calendar { days, until } => {
            let days = days.unwrap_or(ctx.config.stats.calendar_days);
            cmd_calendar(&ctx, days, until.unwrap_or(today))
        }
        Commands::Export { format, out } => cmd_export(&ctx, format, out, today),
        Commands::Settings {
            toggle_theme,
            units,
        } => {
            if toggle_theme {
                ctx.toggle_theme()?;
            }
            if let Some(units) = units {
                ctx.set_units(units)?;
            }
            println!("Theme: {}", ctx.settings.theme);
            println!("Units: {}", ctx.settings.units);
            Ok(())
        }
        Commands::Live { stop_after } => cmd_live(&mut ctx, stop_after),
    }
}

fn report_save(status: &SaveStatus) {
    if let SaveStatus::Unsaved(e) = status {
        eprintln!("Warning: change kept for this run but not saved: {}", e);
    }
}

fn cmd_list<S: KeyValueStore + Clone, C: Clock>(ctx: &AppContext<S, C>) -> Result<()> {
    let units = ctx.settings.units;
    let workouts = ctx.workouts.get_all();
    if workouts.is_empty() {
        println!("No runs logged yet.");
        return Ok(());
    }

    for (index, w) in workouts.iter().enumerate().rev() {
        let pace = w
            .pace()
            .map(stats::format_pace)
            .unwrap_or_else(|| "--:--".into());
        let label = match &w.workout_type {
            Some(t) if !t.is_empty() => format!("  {} [{}]", t, w.classify()),
            _ => String::new(),
        };
        println!(
            "[{}] {}  {}  {} min  {} /km  ♥ {}{}",
            index,
            w.date,
            units.format_distance(w.distance),
            w.duration,
            pace,
            w.kudos,
            label
        );
    }
    Ok(())
}

fn cmd_stats<S: KeyValueStore + Clone, C: Clock>(ctx: &AppContext<S, C>) -> Result<()> {
    let workouts = ctx.workouts.get_all();
    let summary = stats::compute_summary(workouts);
    let suggestion = stats::suggest_next_workout(workouts, ctx.config.stats.recent_window);

    println!("Total distance: {}", ctx.settings.units.format_distance(summary.total_distance));
    println!("Total runs:     {}", summary.total_runs);
    if summary.best_pace == "N/A" {
        println!("Best pace:      N/A");
    } else {
        println!("Best pace:      {} min/km", summary.best_pace);
    }
    println!("Kudos:          {}", stats::total_kudos(workouts));
    println!("Suggested:      {}", suggestion);
    Ok(())
}

fn cmd_records<S: KeyValueStore + Clone, C: Clock>(ctx: &AppContext<S, C>) -> Result<()> {
    let records = stats::compute_personal_records(ctx.workouts.get_all());
    if records.is_empty() {
        println!("Complete more runs to see your personal records!");
        return Ok(());
    }
    for (label, value) in records.entries(ctx.settings.units) {
        println!("{:<18}{}", label, value);
    }
    Ok(())
}

fn bar(value: f64, max: f64) -> String {
    let width = if max > 0.0 {
        ((value / max) * 30.0).round() as usize
    } else {
        0
    };
    "█".repeat(width)
}

fn cmd_chart<S: KeyValueStore + Clone, C: Clock>(
    ctx: &AppContext<S, C>,
    days: u32,
    until: NaiveDate,
) -> Result<()> {
    let units = ctx.settings.units;
    let totals = stats::aggregate_by_day(ctx.workouts.get_all(), days, until);
    let max = totals.iter().map(|d| d.distance).fold(1.0_f64, f64::max);
    for day in &totals {
        println!(
            "{}  {:>10}  {}",
            stats::date_key(day.date),
            units.format_distance(day.distance),
            bar(day.distance, max)
        );
    }
    Ok(())
}

fn cmd_weeks<S: KeyValueStore + Clone, C: Clock>(
    ctx: &AppContext<S, C>,
    count: u32,
    until: NaiveDate,
) -> Result<()> {
    let units = ctx.settings.units;
    let totals = stats::aggregate_by_week(ctx.workouts.get_all(), count, until);
    let max = totals.iter().map(|w| w.distance).fold(1.0_f64, f64::max);
    for week in &totals {
        println!(
            "{:<7} {:>10}  {}",
            week.label(),
            units.format_distance(week.distance),
            bar(week.distance, max)
        );
    }
    Ok(())
}

fn cmd_calendar<S: KeyValueStore + Clone, C: Clock>(
    ctx: &AppContext<S, C>,
    days: u32,
    until: NaiveDate,
) -> Result<()> {
    for day in stats::calendar(ctx.workouts.get_all(), days, until) {
        match day.representative {
            Some(kind) => println!(
                "{}  {} {}",
                stats::date_key(day.date),
                "●".repeat(day.workouts),
                kind
            ),
            None => println!("{}  ·", stats::date_key(day.date)),
        }
    }
    Ok(())
}

fn cmd_export<S: KeyValueStore + Clone, C: Clock>(
    ctx: &AppContext<S, C>,
    format: ExportFormat,
    out: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    let rendered = export::render(format, ctx.workouts.get_all(), Utc::now())?;
    let path = out.unwrap_or_else(|| PathBuf::from(export::default_file_name(format, today)));

    if path.as_os_str() == "-" {
        println!("{}", rendered);
        return Ok(());
    }

    std::fs::write(&path, rendered)?;
    println!(
        "✓ Exported {} runs to {}",
        ctx.workouts.len(),
        path.display()
    );
    Ok(())
}

fn cmd_live<S: KeyValueStore + Clone, C: Clock>(
    ctx: &mut AppContext<S, C>,
    stop_after: Option<u64>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let outcome = runtime.block_on(async {
        let period = Duration::from_millis(ctx.config.live.tick_interval_ms);
        let units = ctx.settings.units;

        let (tx, rx) = mpsc::unbounded_channel();
        spawn_input_reader(tx.clone());

        let timer = async move {
            if let Some(secs) = stop_after {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                let _ = tx.send(LiveCommand::Stop);
            } else {
                drop(tx);
            }
            std::future::pending::<Result<StopOutcome>>().await
        };

        ctx.live.start()?;
        println!("Live tracking started.");
        println!("  Enter to pause/resume, 's' + Enter to stop");

        let (live, store) = ctx.live_parts();
        let drive = drive_session(live, store, period, rx, |snapshot| {
            print!(
                "\r{}  {}  {} /km  ({})   ",
                snapshot.elapsed_display(),
                units.format_distance(snapshot.distance_km),
                snapshot.pace_display(),
                snapshot.state
            );
            let _ = io::stdout().flush();
        });

        tokio::select! {
            outcome = drive => outcome,
            outcome = timer => outcome,
        }
    })?;

    println!();
    match outcome.commit {
        Commit::Skipped => println!("No distance covered - nothing saved."),
        Commit::Saved(workout, status) => {
            report_save(&status);
            println!(
                "✓ Run saved! Distance: {} km, Time: {} min",
                workout.distance, workout.duration
            );
        }
        Commit::Rejected(workout, e) => {
            eprintln!(
                "Run not saved ({} km in {} min): {}",
                workout.distance, workout.duration, e
            );
        }
    }
    Ok(())
}

/// Forward stdin lines as live commands from a plain thread
fn spawn_input_reader(tx: mpsc::UnboundedSender<LiveCommand>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim().to_lowercase().as_str() {
                "" | "p" => LiveCommand::Pause,
                "s" | "q" => LiveCommand::Stop,
                other => {
                    eprintln!("Unknown command: {}", other);
                    continue;
                }
            };
            if tx.send(command).is_err() {
                return;
            }
        }
        // EOF ends the run
        let _ = tx.send(LiveCommand::Stop);
    });
}
