//! Main sumo robot executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop, one cycle every 10 ms:
//!         - Simulation advance
//!         - Sensing (encoders, line sensors, opponent bearing)
//!         - Match signal gating
//!         - Strategy processing
//!         - Drive supervisor processing
//!         - Archiving
//!     - Stop the motors and save a summary of the run
//!
//! # Modules
//!
//! All cyclic modules (e.g. `drive_sup`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait
//!        or a `step` function called once per cycle.
//!     2. Implement `util::archive::Archived` to record their state each cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use sumo_lib::exec::{ExecParams, SumoExec};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    session::{get_elapsed_seconds, Session},
    time::seconds_to_millis
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Number of consecutive cycle overruns after which a warning is raised.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 100;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "sumo_exec", about = "Sumo robot control executable")]
struct Opts {
    /// Simulated duration of the run in seconds
    #[structopt(long, default_value = "30")]
    duration_s: f64,

    /// Pace the cycles in real time rather than running as fast as possible
    #[structopt(long)]
    realtime: bool,

    /// Minimum log level, one of `info`, `debug` or `trace`
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "sumo_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sumo Robot Executable\n");
    info!("Session directory: {:?}", session.session_root);
    info!("Options: {:?}\n", opts);

    // ---- LOAD PARAMETERS ----

    let params = ExecParams::load();

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let cycle_period_ms = seconds_to_millis(CYCLE_PERIOD_S);
    let mut exec = SumoExec::new(&params, cycle_period_ms);

    exec.init_archives(&session)
        .wrap_err("Failed to initialise the archives")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let end_time_ms = seconds_to_millis(opts.duration_s.max(0.0));
    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);

    info!("Begining main loop, running for {} ms\n", end_time_ms);

    while exec.ds.sim_time_ms < end_time_ms {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        exec.cycle().wrap_err("Error during cycle processing")?;

        // ---- CYCLE MANAGEMENT ----

        if !opts.realtime {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                exec.ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                exec.ds.num_consec_cycle_overruns += 1;
                exec.ds.num_cycle_overruns += 1;

                if exec.ds.num_consec_cycle_overruns == MAX_CONSEC_CYCLE_OVERRUNS {
                    warn!(
                        "{} consecutive cycle overruns, the simulation is running slower than \
                        real time",
                        MAX_CONSEC_CYCLE_OVERRUNS
                    );
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    if let Err(e) = exec.stop() {
        error!("Failed to stop the motors: {}", e);
    }

    let summary = exec.summary();
    info!(
        "Run summary:\n{}",
        serde_json::to_string_pretty(&summary).wrap_err("Failed to serialise the summary")?
    );
    session.save_json("summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution after {:.3} s", get_elapsed_seconds());

    Ok(())
}
