//! Main application orchestration and execution

use crate::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, ValidationLevel},
    error::{AppError, Result},
    executor::{LoadTest, LoadTestOutcome},
    logging::LoggerFactory,
    models::Config,
    output::{OutputCoordinator, OutputFormatterFactory},
};

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance, rejecting conflicting arguments
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Load configuration, run the load test and print the summary
    pub async fn run(self) -> Result<LoadTestOutcome> {
        let config = load_config(self.cli.clone())?;
        colored::control::set_override(config.enable_color);

        if config.debug {
            eprintln!("{} v{}", crate::PKG_NAME, crate::VERSION);
            eprintln!("Configuration Summary:");
            eprintln!("{}", display_config_summary(&config));
            eprintln!();
        }

        let output = OutputCoordinator::for_config(&config);
        report_warnings(&config, &output)?;

        let progress = OutputFormatterFactory::create_progress(&config);
        let logger = LoggerFactory::new(config.clone())
            .create_run_logger()
            .await
            .with_progress_bar(progress.bar());

        output.display_run_start(&config)?;

        let outcome = LoadTest::new(config)?
            .with_progress(progress)
            .with_logger(logger)
            .run()
            .await?;

        output.display_summary(&outcome.stats)?;
        Ok(outcome)
    }
}

fn report_warnings(config: &Config, output: &OutputCoordinator) -> Result<()> {
    for warning in validate_config(config)? {
        match warning.level {
            ValidationLevel::Warning => output.display_warning(&warning.message)?,
            ValidationLevel::Info if config.verbose || config.debug => {
                eprintln!("{}", warning.format(config.enable_color));
            }
            ValidationLevel::Info => {}
        }
    }
    Ok(())
}
