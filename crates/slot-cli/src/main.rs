//! `slots` CLI: compute bookable times, check a requested time, and convert
//! provider-local times to UTC from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Bookable start times for the date in a day request (one HH:MM per line)
//! slots available -i day.json
//!
//! # Same, as a JSON array, with business policy and a pinned "now"
//! slots available -i day.json --config policy.json --now 2024-01-15T14:00:00Z --json
//!
//! # Would a booking at 10:30 be accepted? Exit code 2 when rejected.
//! slots check -i day.json --time 10:30
//!
//! # Local wall-clock time to UTC
//! slots to-utc --date 2024-03-10 --time 02:30 --tz America/New_York
//! slots to-utc --date 2024-03-10 --time 03:30 --tz America/New_York --exact
//!
//! # Working windows a schedule yields for one date
//! slots windows -i schedule.json --date 2024-01-15
//! ```

mod request;

use anyhow::{Context, Result};
use booking_core::{BookingError, BookingPolicy, BookingRequest, Customer};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use request::{DayRequest, SERVICE_ID, STAFF_ID};
use slot_engine::schedule::{Schedule, WallClock};
use slot_engine::DstPolicy;
use std::io::{self, Read};
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status for a time the booking rules reject.
const EXIT_REJECTED: i32 = 2;

#[derive(Parser)]
#[command(name = "slots", version, about = "Appointment availability CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable start times for a day request
    Available {
        /// Day request JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[command(flatten)]
        policy: PolicyArgs,
        /// Print a JSON array instead of one time per line
        #[arg(long)]
        json: bool,
    },
    /// Check whether a booking at the given local time would be accepted
    Check {
        /// Day request JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Requested local start time (HH:MM)
        #[arg(long)]
        time: WallClock,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Convert a local wall-clock time to UTC
    ToUtc {
        /// Local date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Local time (HH:MM)
        #[arg(long)]
        time: WallClock,
        /// IANA timezone, e.g. America/New_York
        #[arg(long)]
        tz: String,
        /// Resolve through the zone database instead of the single-step estimate
        #[arg(long)]
        exact: bool,
    },
    /// Show the working windows a schedule yields for a date
    Windows {
        /// Schedule JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
}

/// Booking policy from `--config`, with per-flag overrides.
#[derive(Args)]
struct PolicyArgs {
    /// Booking policy JSON file
    #[arg(long)]
    config: Option<String>,
    /// Override slotStepMinutes
    #[arg(long)]
    step_minutes: Option<i64>,
    /// Override minLeadMinutes
    #[arg(long)]
    lead_minutes: Option<i64>,
    /// Use zone-database DST resolution
    #[arg(long)]
    exact_dst: bool,
    /// Evaluate as of this instant (RFC 3339) instead of the request's `now`
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl PolicyArgs {
    fn load(&self) -> Result<BookingPolicy> {
        let mut policy = match &self.config {
            Some(path) => {
                let json = read_input(Some(path))?;
                BookingPolicy::from_json_str(&json)
                    .with_context(|| format!("Invalid booking policy in {}", path))?
            }
            None => BookingPolicy::default(),
        };
        if let Some(step) = self.step_minutes {
            policy.slot_step_minutes = Some(step);
        }
        if let Some(lead) = self.lead_minutes {
            policy.min_lead_minutes = lead;
        }
        if self.exact_dst {
            policy.dst_policy = DstPolicy::ZoneDatabase;
        }
        policy.validate().context("Invalid booking policy")?;
        Ok(policy)
    }

    /// `--now`, else the request's `now`, else the system clock.
    fn now(&self, request: &DayRequest) -> DateTime<Utc> {
        self.now.or(request.now).unwrap_or_else(Utc::now)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Available { input, policy, json } => {
            let request = DayRequest::from_json_str(&read_input(input.as_deref())?)?;
            let now = policy.now(&request);
            let date = request.date;
            let service = request.into_service(policy.load()?).await?;

            let times = service
                .available_times(STAFF_ID, SERVICE_ID, date, now)
                .await
                .context("Failed to compute available times")?;
            debug!(count = times.len(), %date, "computed available times");

            if json {
                println!("{}", serde_json::to_string(&times)?);
            } else {
                for time in &times {
                    println!("{}", time);
                }
            }
        }
        Commands::Check { input, time, policy } => {
            let request = DayRequest::from_json_str(&read_input(input.as_deref())?)?;
            let now = policy.now(&request);
            let date = request.date;
            let service = request.into_service(policy.load()?).await?;

            let booking_request = BookingRequest {
                staff_id: STAFF_ID.to_string(),
                service_id: SERVICE_ID.to_string(),
                date,
                time,
                customer: Customer::default(),
            };
            match service.create(booking_request, now).await {
                Ok(booking) => {
                    println!(
                        "OK {}",
                        booking.start_time_utc.to_rfc3339_opts(SecondsFormat::Secs, true)
                    );
                }
                Err(err) if is_rejection(&err) => {
                    println!("REJECTED {}: {}", err.kind(), err);
                    process::exit(EXIT_REJECTED);
                }
                Err(err) => return Err(err).context("Failed to check requested time"),
            }
        }
        Commands::ToUtc {
            date,
            time,
            tz,
            exact,
        } => {
            let policy = if exact {
                DstPolicy::ZoneDatabase
            } else {
                DstPolicy::Approximate
            };
            let instant = policy
                .to_utc(date, time.hour(), time.minute(), &tz)
                .with_context(|| format!("Failed to convert {} {} in {}", date, time, tz))?;
            println!("{}", instant.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        Commands::Windows { input, date } => {
            let json = read_input(input.as_deref())?;
            let schedule: Schedule =
                serde_json::from_str(&json).context("Failed to parse schedule JSON")?;
            let plan = schedule.working_windows(date);
            if plan.is_open() {
                for window in &plan.windows {
                    println!("{}-{}", window.start, window.end);
                }
            } else {
                println!("closed");
            }
        }
    }

    Ok(())
}

/// Errors that mean "the rules say no" rather than "the input is broken".
fn is_rejection(err: &BookingError) -> bool {
    matches!(
        err,
        BookingError::Unavailable { .. }
            | BookingError::OutOfSchedule { .. }
            | BookingError::Conflict { .. }
            | BookingError::PastTime { .. }
            | BookingError::AlreadyTerminal(_)
    )
}

/// Log to stderr. `RUST_LOG` wins over `-v` when set.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
