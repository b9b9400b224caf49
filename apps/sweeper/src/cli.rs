use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use cfgsweep_application::SweepSettings;
use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{ObjectKind, RetentionPolicy};
use cfgsweep_infrastructure::KubeConnectOptions;
use clap::{ArgAction, Parser, ValueEnum};

/// Report rendering format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    Text,
    /// Pretty-printed JSON report.
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "cfgsweep",
    version,
    about = "Deletes stale ConfigMaps and Secrets that no pod references"
)]
pub struct Cli {
    #[arg(
        short = 'n',
        long,
        env = "CFGSWEEP_NAMESPACE",
        default_value = "default",
        help = "Namespace scoping every list and delete"
    )]
    pub namespace: String,
    #[arg(
        long,
        visible_alias = "delete-period",
        env = "CFGSWEEP_AGE",
        default_value = "30d",
        value_parser = humantime::parse_duration,
        help = "Minimum object age before it may be deleted (e.g. 12h, 30d)"
    )]
    pub age: Duration,
    #[arg(
        long,
        env = "KUBECONFIG",
        help = "Kubeconfig path; in-cluster credentials are used when omitted"
    )]
    pub kubeconfig: Option<PathBuf>,
    #[arg(long, env = "CFGSWEEP_CONTEXT", help = "Kubeconfig context to use")]
    pub context: Option<String>,
    #[arg(
        long,
        visible_alias = "dryrun",
        env = "CFGSWEEP_DRY_RUN",
        help = "Submit deletes as server-side dry runs"
    )]
    pub dry_run: bool,
    #[arg(long, env = "CFGSWEEP_DISABLE_CONFIG_MAPS", help = "Skip ConfigMaps entirely")]
    pub disable_config_maps: bool,
    #[arg(long, env = "CFGSWEEP_DISABLE_SECRETS", help = "Skip Secrets entirely")]
    pub disable_secrets: bool,
    #[arg(
        long,
        env = "CFGSWEEP_MAX_CONCURRENT_DELETES",
        default_value_t = 10,
        help = "Maximum delete requests in flight"
    )]
    pub max_concurrent_deletes: usize,
    #[arg(
        long,
        env = "CFGSWEEP_TIMEOUT",
        default_value = "5m",
        value_parser = humantime::parse_duration,
        help = "Deadline for the whole run"
    )]
    pub timeout: Duration,
    #[arg(
        long,
        env = "CFGSWEEP_PAGE_SIZE",
        default_value_t = 500,
        help = "Items requested per list page"
    )]
    pub page_size: u32,
    #[arg(long, value_enum, env = "CFGSWEEP_OUTPUT", default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
}

impl Cli {
    /// Builds validated run settings from parsed flags.
    pub fn sweep_settings(&self) -> AppResult<SweepSettings> {
        let namespace = Namespace::new(self.namespace.trim())?;
        let retention = RetentionPolicy::from_std(self.age)?;

        let mut enabled_kinds = BTreeSet::new();
        if !self.disable_config_maps {
            enabled_kinds.insert(ObjectKind::ConfigMap);
        }
        if !self.disable_secrets {
            enabled_kinds.insert(ObjectKind::Secret);
        }

        if enabled_kinds.is_empty() {
            return Err(AppError::Configuration(
                "--disable-config-maps and --disable-secrets leave nothing to sweep".to_owned(),
            ));
        }

        if self.page_size == 0 {
            return Err(AppError::Configuration(
                "--page-size must be greater than zero".to_owned(),
            ));
        }

        Ok(SweepSettings {
            namespace,
            retention,
            enabled_kinds,
            dry_run: self.dry_run,
            max_concurrent_deletes: self.max_concurrent_deletes,
            timeout: self.timeout,
        })
    }

    /// Returns credential lookup options.
    ///
    /// `KUBECONFIG` may hold a path list; the first entry is used.
    pub fn connect_options(&self) -> KubeConnectOptions {
        let kubeconfig = self
            .kubeconfig
            .as_ref()
            .and_then(|paths| std::env::split_paths(paths.as_os_str()).next())
            .filter(|path| !path.as_os_str().is_empty());

        KubeConnectOptions {
            kubeconfig,
            context: self
                .context
                .as_ref()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
        }
    }

    /// Returns the default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
