use clap::Parser;

use smile_match::cli::{self, Args, Command, RunArgs};
use smile_match::event_loop::{self, LoopExit, LoopOptions};
use smile_match::services::{LogReporter, NullReporter, Reporter, SystemNavigator};
use smile_match::session::Session;

/// Load .env file. Existing environment variables win.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn run_experience(args: RunArgs) -> Result<LoopExit, Box<dyn std::error::Error>> {
    let cfg = cli::resolve_config(&args)?;

    let reporter: Box<dyn Reporter> = if cfg.analytics.enabled {
        Box::new(LogReporter)
    } else {
        Box::new(NullReporter)
    };
    let device = cli::build_camera(&cfg.camera);
    log::info!(
        "Starting with camera '{}', booking at {}",
        device.name(),
        cfg.assets.booking_url
    );

    let mut session = Session::from_config(&cfg, device, reporter, Box::new(SystemNavigator));
    let options = LoopOptions {
        tick_ms: session.timing().tick_ms,
        save_capture: args.save_capture.clone(),
        assets: cfg.assets.clone(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    let exit = rt.block_on(async {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        event_loop::run(&mut session, stdin, &mut stdout, &options).await
    })?;

    log::info!("Exited: {:?}", exit);
    Ok(exit)
}

fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let args = Args::parse();

    match args.command {
        Some(Command::Config { config, action }) => {
            if let Err(e) = cli::handle_config_action(action, config.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Command::Run(run)) => {
            if let Err(e) = run_experience(run) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            if let Err(e) = run_experience(args.run) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_env_var_accessible_after_dotenv() {
        // Existing env vars are not overridden by dotenv
        std::env::set_var("SMILE_MATCH_TEST_EXISTING", "kept");
        super::load_env();
        assert_eq!(
            std::env::var("SMILE_MATCH_TEST_EXISTING").as_deref(),
            Ok("kept")
        );
    }
}
