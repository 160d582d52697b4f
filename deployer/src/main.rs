//! deploy-pages - Entry Point
//!
//! Publishes an uploaded build artifact to GitHub Pages and waits for the
//! deployment to finish.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use deploy_pages::app::run::run;
use deploy_pages::app::settings::Settings;
use deploy_pages::logs::init_logging;
use deploy_pages::report::{Reporter, TracingReporter};
use deploy_pages::utils::{parse_cli_args, version_info};

use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_cli_args(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Unable to print version: {e}"),
        }
        return ExitCode::SUCCESS;
    }

    let env_vars: HashMap<String, String> = env::vars().collect();
    let settings = match Settings::load(&env_vars, &cli_args).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let _log_guard = match init_logging(&settings.log_options()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let options = match settings.into_options() {
        Ok(options) => options,
        Err(e) => {
            TracingReporter::default().set_failed(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter::new(options.output_file.clone()));

    match run(options, reporter).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(outcome) => {
            debug!("Deployment ended with {:?}", outcome);
            ExitCode::FAILURE
        }
        Err(e) => {
            debug!("Deployment aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}
