//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::{env::EnvManager, suffixes::read_suffix_file},
    error::Result,
    models::{config::outlier_threshold_from_ms, Config},
};

/// Builds the run configuration from defaults, environment and CLI arguments
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and validate the complete configuration.
    ///
    /// Layers, lowest precedence first: defaults, `.env`, process
    /// environment, CLI arguments. The suffix file is read last.
    pub fn parse(&self) -> Result<Config> {
        EnvManager::load_env_file(self.cli.debug)?;
        self.parse_with(|key| std::env::var(key).ok())
    }

    /// Same as `parse`, reading environment variables through `lookup`
    pub fn parse_with<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.merge_from_lookup(lookup)?;
        self.apply_cli_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        let cli = &self.cli;

        if let Some(url) = &cli.url {
            config.base_url = url.trim().to_string();
        }
        if let Some(concurrency) = cli.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(requests) = cli.requests {
            config.requests = requests;
        }
        if let Some(timeout) = cli.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(threshold) = cli.tcp_outlier_ms {
            config.tcp_outlier_threshold_ms = outlier_threshold_from_ms(threshold);
        }
        if cli.disable_keep_alive {
            config.disable_keep_alive = true;
        }

        config.enable_color = match cli.color_override() {
            Some(forced) => forced,
            None => config.enable_color && cli.use_colors(),
        };
        config.json_output = cli.json;
        config.show_progress = !cli.no_progress;
        config.verbose = cli.verbose;
        config.debug = cli.debug;

        if let Some(path) = &cli.file {
            config.url_suffixes = Some(read_suffix_file(path)?);
            config.suffix_file = Some(path.display().to_string());
        }

        if config.debug {
            eprintln!("Applied CLI overrides to configuration");
            eprintln!("{}", display_config_summary(config));
        }

        Ok(())
    }
}

/// Load the complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Configuration summary for debug output
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Target URL: {}", config.base_url));
    summary.push(format!("Mode: {}", config.mode().as_str()));
    match &config.suffix_file {
        Some(path) => summary.push(format!(
            "Suffix File: {} ({} entries)",
            path,
            config.total_requests()
        )),
        None => summary.push(format!("Requests: {}", config.requests)),
    }
    summary.push(format!("Concurrency: {}", config.concurrency));
    summary.push(format!("Timeout: {}s", config.timeout_seconds));
    summary.push(format!(
        "TCP Outlier Threshold: {}",
        config
            .tcp_outlier_threshold_ms
            .map_or_else(|| "disabled".to_string(), |ms| format!("{}ms", ms))
    ));
    summary.push(format!("Keep-Alive: {}", !config.disable_keep_alive));
    summary.push(format!(
        "Connection Pool: {} idle, {} idle/host, {} max/host",
        config.pool.max_idle, config.pool.max_idle_per_host, config.pool.max_per_host
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("JSON Output: {}", config.json_output));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
