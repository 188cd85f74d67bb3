use clap::{ArgAction, Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::{Context, Result, eyre};
use shadowwatch::filter::{Filter, SearchMode, crime_types_present, filter_by_types};
use shadowwatch::seed::{self, SeedOutcome};
use shadowwatch::transfer;
use shadowwatch::{Backend, CrimeRecord, CrimeType, NewReport, ReportStatus, Store, StoreConfig};
use std::fs;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "shadowwatch")]
#[command(about = "ShadowWatch CLI - report, search, import and export crime records")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the store (default: platform data dir)
    #[arg(short, long, global = true)]
    store_path: Option<PathBuf>,

    /// Storage backend: file or sqlite
    #[arg(short, long, global = true, default_value = "file")]
    backend: Backend,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List reports, optionally only some crime types
    List {
        /// Crime type to include (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<CrimeType>,
    },

    /// Show one report as JSON
    Show { id: i64 },

    /// Search by id or by report details
    Search {
        term: String,

        /// Match mode: id or details
        #[arg(long, default_value = "details")]
        by: SearchMode,
    },

    /// Submit a new report
    Report {
        /// What happened (at least 10 characters)
        #[arg(long)]
        details: String,

        #[arg(long = "type", value_name = "TYPE")]
        crime_type: CrimeType,

        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Change the status of a report
    Status { id: i64, status: ReportStatus },

    /// Delete a report
    Delete { id: i64 },

    /// Export all reports as JSON
    Export {
        /// Output file (default: shadow-watch-crimes-<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write to stdout instead of a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Replace all reports with the contents of a JSON export
    Import { file: PathBuf },

    /// Delete all reports
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Load the bundled sample reports
    Seed {
        /// Replace existing reports
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing; stderr keeps `export --stdout` clean
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = StoreConfig::new(cli.store_path, cli.backend);
    let mut store = config.open()?;

    match cli.command {
        Commands::List { types } => {
            let mut records = store.get_all();
            if !types.is_empty() {
                records = filter_by_types(records, &types);
            }
            print_table(&records);
            if !records.is_empty() {
                let present: Vec<&str> = crime_types_present(&records).iter().map(|t| t.as_str()).collect();
                println!("\n{} records; types: {}", records.len(), present.join(", "));
            }
        }
        Commands::Show { id } => println!("{}", show(&store, id)?),
        Commands::Search { term, by } => {
            let records = store.search(&Filter { mode: by, term });
            print_table(&records);
        }
        Commands::Report {
            details,
            crime_type,
            lat,
            lon,
        } => {
            let report = NewReport {
                report_details: details,
                crime_type,
                latitude: lat,
                longitude: lon,
            };
            let record = store
                .submit(report)?
                .ok_or_else(|| eyre!("Report could not be saved; storage unavailable"))?;
            println!("{} report {} ({})", "Submitted".green(), record.id, record.report_date_time);
        }
        Commands::Status { id, status } => {
            if !store.set_status(id, status) {
                return Err(eyre!("Status of crime {} was not updated", id));
            }
            println!("Crime {} is now {}", id, status_label(status, status.as_str()));
        }
        Commands::Delete { id } => {
            if !store.delete_by_id(id) {
                return Err(eyre!("Crime {} was not deleted", id));
            }
            println!("{} crime {}", "Deleted".green(), id);
        }
        Commands::Export { output, stdout } => export(&store, output, stdout)?,
        Commands::Import { file } => {
            if file.extension().and_then(|s| s.to_str()) != Some("json") {
                return Err(eyre!("Please select a JSON file: {:?}", file));
            }
            let text = fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let count = transfer::import_document(&mut store, &text).wrap_err("Import failed")?;
            println!("{} imported {} crime records", "Successfully".green(), count);
        }
        Commands::Reset { yes } => {
            if !yes {
                println!(
                    "{} this permanently deletes all crime data; rerun with --yes to continue",
                    "Warning:".red().bold()
                );
                return Ok(());
            }
            if !store.clear() {
                return Err(eyre!("Failed to clear crime data"));
            }
            println!("All crime data has been cleared");
        }
        Commands::Seed { force } => match seed::seed(&mut store, force)? {
            SeedOutcome::Seeded(count) => println!("Seeded {} sample crime records", count),
            SeedOutcome::Skipped { existing } => {
                println!("Store already holds {} records; use --force to replace them", existing)
            }
        },
    }

    Ok(())
}

// Not-found is a normal answer, not a failure
fn show(store: &Store, id: i64) -> Result<String> {
    match store.get_by_id(id) {
        Some(record) => Ok(serde_json::to_string_pretty(&record)?),
        None => Ok(format!("Crime {} not found", id)),
    }
}

fn export(store: &Store, output: Option<PathBuf>, stdout: bool) -> Result<()> {
    let json = transfer::export_document(store)?;
    if stdout {
        println!("{}", json);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| PathBuf::from(transfer::default_export_file_name()));
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Data exported to {}", path.display());
    Ok(())
}

fn status_label(status: ReportStatus, text: &str) -> ColoredString {
    match status {
        ReportStatus::Pending => text.yellow(),
        ReportStatus::EnRoute => text.blue(),
        ReportStatus::OnScene => text.magenta(),
        ReportStatus::UnderInvestigation => text.red(),
        ReportStatus::Resolved => text.green(),
    }
}

fn print_table(records: &[CrimeRecord]) {
    if records.is_empty() {
        println!("No crime records");
        return;
    }

    println!(
        "{:>4}  {:<10}  {:<19}  {:<16}  {:>9}  {:>10}  {}",
        "ID", "TYPE", "STATUS", "REPORTED", "LAT", "LON", "DETAILS"
    );
    for r in records {
        let status = status_label(r.report_status, &format!("{:<19}", r.report_status.as_str()));
        println!(
            "{:>4}  {:<10}  {}  {:<16}  {:>9.4}  {:>10.4}  {}",
            r.id, r.crime_type.as_str(), status, r.report_date_time, r.latitude, r.longitude, r.report_details
        );
    }
}
