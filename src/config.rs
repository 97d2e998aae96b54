use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::{
    display_id::DEFAULT_ORGANIZATION_CODE,
    stats::{StatsOptions, DEFAULT_MONTHLY_WINDOW, DEFAULT_RECENT_ADMISSIONS},
    store::StoreOptions,
};

#[derive(Parser, Debug)]
#[command(name = "schooldesk", about = "SchoolDesk - school administration state store")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "schooldesk.toml")]
    pub config: String,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Print output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the sample records
    Seed,
    /// Load the sample records and print the dashboard
    Dashboard,
    /// Load the sample records and print the next invoice code for a class
    NextId {
        #[arg(long)]
        class: String,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub invoices: InvoiceConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvoiceConfig {
    /// Leading part of every invoice display id, e.g. `APS` in `APSPR004`.
    #[serde(default = "default_organization_code")]
    pub organization_code: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_recent_admissions")]
    pub recent_admissions: usize,

    #[serde(default = "default_monthly_window")]
    pub monthly_window: usize,
}

/// Account the CLI signs up before seeding.
#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_organization_code() -> String {
    DEFAULT_ORGANIZATION_CODE.to_string()
}

fn default_recent_admissions() -> usize {
    DEFAULT_RECENT_ADMISSIONS
}

fn default_monthly_window() -> usize {
    DEFAULT_MONTHLY_WINDOW
}

fn default_admin_email() -> String {
    "admin@school.test".to_string()
}

fn default_admin_password() -> String {
    "changeme".to_string()
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        InvoiceConfig {
            organization_code: default_organization_code(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            recent_admissions: default_recent_admissions(),
            monthly_window: default_monthly_window(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig {
            admin_email: default_admin_email(),
            admin_password: default_admin_password(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            logging: default_logging(),
            invoices: InvoiceConfig::default(),
            dashboard: DashboardConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Config::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            organization_code: self.invoices.organization_code.clone(),
            stats: StatsOptions {
                recent_admissions: self.dashboard.recent_admissions,
                monthly_window: self.dashboard.monthly_window,
            },
        }
    }
}
