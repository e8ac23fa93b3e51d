use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use lunacal_core::export::{export_cycles_csv, export_symptoms_csv};
use lunacal_core::insights::history;
use lunacal_core::stats::days_since_last_cycle;
use lunacal_core::symptoms::group_by_date;
use lunacal_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lunacal")]
#[command(about = "Menstrual cycle tracking and calendar insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the user whose records are read and written
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record, list or delete cycles
    #[command(subcommand)]
    Cycle(CycleCommand),

    /// Record, list or delete symptoms
    #[command(subcommand)]
    Symptom(SymptomCommand),

    /// Show cycle length statistics
    Stats {
        /// Reference day for "days since last period" (default: today)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Predict the next cycle start and ovulation window
    Predict,

    /// Print a month calendar with phases marked (default)
    Calendar(CalendarArgs),

    /// Summarize statistics, prediction and common symptoms
    Insights {
        /// Reference day for the report (default: today)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,

        /// Show the report without adding it to the history
        #[arg(long)]
        no_save: bool,

        /// List previously generated reports instead, newest first
        #[arg(long, conflicts_with_all = ["today", "no_save"])]
        history: bool,
    },

    /// Export cycle and symptom history as CSV
    Export {
        /// Directory to write cycles.csv and symptoms.csv into
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum CycleCommand {
    /// Record a cycle
    Add {
        /// First day of flow (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,

        /// Last day of flow; omit while the cycle is ongoing
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,
    },
    /// List recorded cycles, newest first
    List,
    /// Delete a cycle by id
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum SymptomCommand {
    /// Log a symptom; it is linked to the cycle containing its date
    Add {
        /// Symptom name, e.g. Cramps
        #[arg(long = "type")]
        symptom_type: String,

        /// Severity from 1 (very mild) to 5 (very severe)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        intensity: Option<u8>,

        /// Day the symptom occurred (default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        description: Option<String>,
    },
    /// List symptoms grouped by day, newest first
    List,
    /// Delete a symptom by id
    Delete { id: Uuid },
}

#[derive(Args, Default)]
struct CalendarArgs {
    /// Month to show (YYYY-MM, default: current month)
    #[arg(long, value_parser = parse_month)]
    month: Option<(i32, u32)>,
}

fn main() -> Result<()> {
    lunacal_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let user = cli.user.unwrap_or_else(|| config.data.user_id.clone());
    tracing::debug!("Using data dir {:?} for user {}", data_dir, user);
    let store = RecordStore::new(data_dir, user);
    let analytics = &config.analytics;

    match cli.command {
        Some(Commands::Cycle(cmd)) => cmd_cycle(&store, cmd),
        Some(Commands::Symptom(cmd)) => cmd_symptom(&store, cmd),
        Some(Commands::Stats { today }) => {
            cmd_stats(&store, today.unwrap_or_else(today_local), analytics)
        }
        Some(Commands::Predict) => cmd_predict(&store, analytics),
        Some(Commands::Calendar(args)) => cmd_calendar(&store, args, analytics),
        Some(Commands::Insights {
            history: true, ..
        }) => cmd_insight_history(&store),
        Some(Commands::Insights { today, no_save, .. }) => cmd_insights(
            &store,
            today.unwrap_or_else(today_local),
            !no_save,
            analytics,
        ),
        Some(Commands::Export { out }) => cmd_export(&store, out),
        None => cmd_calendar(&store, CalendarArgs::default(), analytics),
    }
}

fn cmd_cycle(store: &RecordStore, cmd: CycleCommand) -> Result<()> {
    match cmd {
        CycleCommand::Add { start, end } => {
            let cycle = CycleRecord::new(store.user_id(), start, end)?;
            store.append_cycle(&cycle)?;
            println!("✓ Cycle recorded ({})", cycle.id);
            println!("  {}", describe_cycle(&cycle));
        }
        CycleCommand::List => {
            let mut cycles = store.load_cycles()?;
            if cycles.is_empty() {
                println!("No cycles recorded yet.");
                return Ok(());
            }
            cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            for cycle in &cycles {
                println!("{}  {}", cycle.id, describe_cycle(cycle));
            }
        }
        CycleCommand::Delete { id } => {
            if store.delete_cycle(id)? {
                println!("✓ Deleted cycle {}", id);
            } else {
                println!("No cycle with id {}", id);
            }
        }
    }
    Ok(())
}

fn cmd_symptom(store: &RecordStore, cmd: SymptomCommand) -> Result<()> {
    match cmd {
        SymptomCommand::Add {
            symptom_type,
            intensity,
            date,
            description,
        } => {
            let intensity = intensity.map(Intensity::new).transpose()?;
            let recorded_date = date.unwrap_or_else(today_local);
            let mut symptom =
                SymptomRecord::new(store.user_id(), symptom_type, intensity, recorded_date);
            symptom.description = description;

            let cycles = store.load_cycles()?;
            link_symptom(&mut symptom, &cycles);
            store.append_symptom(&symptom)?;

            println!("✓ Symptom logged ({})", symptom.id);
            match symptom.cycle_id {
                Some(cycle_id) => println!("  Linked to cycle {}", cycle_id),
                None => println!("  Not within any recorded cycle"),
            }
        }
        SymptomCommand::List => {
            let symptoms = store.load_symptoms()?;
            if symptoms.is_empty() {
                println!("No symptoms logged yet.");
                return Ok(());
            }
            for (date, entries) in group_by_date(&symptoms) {
                println!("{}", date);
                for s in entries {
                    let intensity = s
                        .intensity
                        .map(|i| i.label().to_string())
                        .unwrap_or_else(|| "N/A".into());
                    println!("  {} ({})  {}", s.symptom_type, intensity, s.id);
                    if let Some(ref description) = s.description {
                        println!("    {}", description);
                    }
                }
            }
        }
        SymptomCommand::Delete { id } => {
            if store.delete_symptom(id)? {
                println!("✓ Deleted symptom {}", id);
            } else {
                println!("No symptom with id {}", id);
            }
        }
    }
    Ok(())
}

fn cmd_stats(store: &RecordStore, today: NaiveDate, config: &AnalyticsConfig) -> Result<()> {
    let cycles = store.load_cycles()?;
    let stats = compute_statistics(&cycles, config)?;

    println!("Total cycles:      {}", stats.total_cycle_count);
    println!("Completed cycles:  {}", stats.completed_cycle_count);
    println!("Avg cycle length:  {} days", stats.average_cycle_length_days);
    if stats.completed_cycle_count == 0 {
        println!("  (default, no completed cycles yet)");
    }
    if let Some(days) = days_since_last_cycle(&cycles, today) {
        println!("Days since last:   {}", days);
    }
    Ok(())
}

fn cmd_predict(store: &RecordStore, config: &AnalyticsConfig) -> Result<()> {
    let cycles = store.load_cycles()?;

    match predict(&cycles, config) {
        Ok(prediction) => {
            let window = prediction.ovulation_window;
            println!("Predicted next period:  {}", prediction.predicted_next_cycle_start);
            println!("Predicted ovulation:    {}", prediction.predicted_ovulation_date);
            if let Some(end) = window.end {
                println!("Ovulation window:       {} to {}", window.start, end);
            }
            println!(
                "Based on a {} day average over {} completed cycles",
                prediction.basis_average_length, prediction.basis_cycle_count
            );
            Ok(())
        }
        Err(Error::InsufficientData { required, found }) => {
            println!(
                "Need more data: record at least {} cycles to predict ({} so far).",
                required, found
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_calendar(store: &RecordStore, args: CalendarArgs, config: &AnalyticsConfig) -> Result<()> {
    let cycles = store.load_cycles()?;
    let (year, month) = args.month.unwrap_or_else(|| {
        let today = today_local();
        (today.year(), today.month())
    });

    let classifier = PhaseClassifier::new(&cycles, config)?;
    let grid = classifier.month_grid(year, month)?;
    display_month(&grid);
    Ok(())
}

fn cmd_insights(
    store: &RecordStore,
    today: NaiveDate,
    save: bool,
    config: &AnalyticsConfig,
) -> Result<()> {
    let cycles = store.load_cycles()?;
    let symptoms = store.load_symptoms()?;

    match InsightReport::build(&cycles, &symptoms, today, config) {
        Ok(report) => {
            print!("{}", report.render());
            if save {
                store.append_insight(&report.to_record(store.user_id()))?;
            }
            Ok(())
        }
        Err(Error::InsufficientData { required, .. }) => {
            println!(
                "You need at least {} recorded cycles to generate insights.",
                required
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_insight_history(store: &RecordStore) -> Result<()> {
    let saved = store.load_insights()?;
    if saved.is_empty() {
        println!("No insights generated yet.");
        return Ok(());
    }
    for insight in history(&saved) {
        println!(
            "{}  next period {}, ovulation {}, avg {} days",
            insight.generated_on,
            insight.predicted_next_cycle_start,
            insight.predicted_ovulation_date,
            insight.cycle_length_avg
        );
    }
    Ok(())
}

fn cmd_export(store: &RecordStore, out: PathBuf) -> Result<()> {
    let cycles = store.load_cycles()?;
    let symptoms = store.load_symptoms()?;

    let cycles_path = out.join("cycles.csv");
    let symptoms_path = out.join("symptoms.csv");
    let cycle_count = export_cycles_csv(&cycles, &cycles_path)?;
    let symptom_count = export_symptoms_csv(&symptoms, &symptoms_path)?;

    println!("✓ Exported {} cycles to {}", cycle_count, cycles_path.display());
    println!("✓ Exported {} symptoms to {}", symptom_count, symptoms_path.display());
    Ok(())
}

fn describe_cycle(cycle: &CycleRecord) -> String {
    match cycle.end_date {
        Some(end) => {
            let length = (end - cycle.start_date).num_days();
            format!("{} to {} ({} days)", cycle.start_date, end, length)
        }
        None => format!("{} (ongoing)", cycle.start_date),
    }
}

fn display_month(grid: &MonthGrid) {
    let title = NaiveDate::from_ymd_opt(grid.year, grid.month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();

    println!("\n  {}", title);
    println!("  Sun  Mon  Tue  Wed  Thu  Fri  Sat");
    for week in grid.weeks() {
        if week.iter().all(Option::is_none) {
            continue;
        }
        let row: String = week
            .iter()
            .map(|cell| match cell {
                None => "     ".to_string(),
                Some(c) => match c.phase {
                    PhaseTag::Menstrual => format!(" [{:>2}]", c.date.day()),
                    PhaseTag::Ovulation => format!(" ({:>2})", c.date.day()),
                    PhaseTag::Neutral => format!("  {:>2} ", c.date.day()),
                },
            })
            .collect();
        println!(" {}", row);
    }
    println!();
    println!("  [ ] Menstrual period   ( ) Ovulation window");
}

fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got {:?}: {}", s, e))
}

fn parse_month(s: &str) -> std::result::Result<(i32, u32), String> {
    let first = format!("{}-01", s);
    NaiveDate::parse_from_str(&first, "%Y-%m-%d")
        .map(|d| (d.year(), d.month()))
        .map_err(|_| format!("expected YYYY-MM, got {:?}", s))
}
