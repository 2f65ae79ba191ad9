use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use kubecron_core::KubecronConfig;
use kubecron_history::RangePreset;

mod catalog;
mod jobs;
mod reports;
mod serve;

#[derive(Parser)]
#[command(name = "kubecron", version, about = "Scheduled command runner with per-day execution history")]
struct Cli {
    /// Config file (defaults to $KUBECRON_CONFIG, then ~/.kubecron/kubecron.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the predefined and user command files and list the catalog
    Catalog {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the configured jobs and run them until Ctrl-C
    Serve,
    /// List report groups and days, and print the first report
    Reports,
    /// Print every day file within a date range, newest first
    History {
        /// today, this-week, this-month, this-year or all
        #[arg(long, conflicts_with_all = ["from", "to"])]
        preset: Option<RangePreset>,

        /// First day (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Only include this job's reports
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Print one report
    Show {
        /// Job folder name
        group: String,
        /// Day (YYYY-MM-DD)
        label: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "kubecron=info,kubecron_scheduler=info,kubecron_history=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // explicit --config > KUBECRON_CONFIG env > ~/.kubecron/kubecron.toml
    let config_path = cli.config.or_else(|| std::env::var("KUBECRON_CONFIG").ok());
    let config = KubecronConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        KubecronConfig::default()
    });

    match cli.command {
        Commands::Catalog { json } => catalog::run(&config, json)?,
        Commands::Serve => serve::run(config).await?,
        Commands::Reports => reports::list(&config),
        Commands::History {
            preset,
            from,
            to,
            group,
        } => {
            let today = chrono::Local::now().date_naive();
            let (from, to) = match (from, to) {
                (Some(from), Some(to)) => (from, to),
                _ => preset.unwrap_or(RangePreset::Today).bounds(today),
            };
            reports::history(&config, from, to, group.as_deref());
        }
        Commands::Show { group, label } => reports::show(&config, &group, &label)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_accepts_preset_or_explicit_range() {
        let cli = Cli::try_parse_from(["kubecron", "history", "--preset", "this-week"]).expect("parse");
        assert!(matches!(
            cli.command,
            Commands::History { preset: Some(RangePreset::ThisWeek), .. }
        ));

        let cli = Cli::try_parse_from([
            "kubecron", "history", "--from", "2024-01-01", "--to", "2024-01-31", "-g", "backup",
        ])
        .expect("parse");
        let Commands::History { from, to, group, .. } = cli.command else {
            panic!("expected history");
        };
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 1, 31));
        assert_eq!(group.as_deref(), Some("backup"));
    }

    #[test]
    fn history_rejects_mixed_or_partial_ranges() {
        assert!(Cli::try_parse_from(["kubecron", "history", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from([
            "kubecron", "history", "--preset", "all", "--from", "2024-01-01", "--to", "2024-01-02",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["kubecron", "history", "--preset", "fortnight"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["kubecron", "show", "pods", "2024-01-01", "-c", "/etc/k.toml"])
            .expect("parse");
        assert_eq!(cli.config.as_deref(), Some("/etc/k.toml"));
    }
}
