use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "formstore")]
#[command(about = "Formstore - Storage and export of form submissions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database URL, overrides `database.url` from the configuration
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Configuration file (defaults to ./formstore.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start API server
    Serve {
        /// Port to listen on, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Initialize database
    InitDb,

    /// List storage identifiers
    Identifiers,

    /// Show one page of entries
    Show {
        /// Storage identifier
        identifier: String,

        /// Page number
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Export all entries of an identifier to a file
    Export {
        /// Storage identifier
        identifier: String,

        /// Output format (xls, xlsx, ods, csv, html)
        #[arg(long, default_value = "xlsx")]
        format: String,

        /// Append a DateTime column
        #[arg(long)]
        include_date_time: bool,

        /// Output file, defaults to the download file name
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Delete entries of an identifier, optionally within a date range
    Purge {
        /// Storage identifier
        identifier: String,

        /// Earliest creation time to delete (RFC 3339)
        #[arg(long, value_parser = parse_timestamp)]
        from: Option<DateTime<Utc>>,

        /// Latest creation time to delete (RFC 3339)
        #[arg(long, value_parser = parse_timestamp)]
        to: Option<DateTime<Utc>>,

        /// Also delete uploaded files of the removed entries
        #[arg(long)]
        remove_attached_resources: bool,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "formstore",
            "export",
            "contact",
            "--format",
            "csv",
            "--include-date-time",
            "-o",
            "out.csv",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                identifier,
                format,
                include_date_time,
                output,
            } => {
                assert_eq!(identifier, "contact");
                assert_eq!(format, "csv");
                assert!(include_date_time);
                assert_eq!(output, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_parse_purge_range() {
        let cli = Cli::try_parse_from([
            "formstore",
            "purge",
            "contact",
            "--from",
            "2024-01-01T00:00:00Z",
            "--to",
            "2024-01-31T23:59:59+01:00",
            "--database-url",
            "sqlite::memory:",
        ])
        .unwrap();

        assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
        match cli.command {
            Commands::Purge { from, to, remove_attached_resources, .. } => {
                assert_eq!(from, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
                assert_eq!(to, Some(Utc.with_ymd_and_hms(2024, 1, 31, 22, 59, 59).unwrap()));
                assert!(!remove_attached_resources);
            }
            _ => panic!("expected purge command"),
        }
    }

    #[test]
    fn test_rejects_bad_timestamp() {
        let result = Cli::try_parse_from(["formstore", "purge", "contact", "--from", "yesterday"]);
        assert!(result.is_err());
    }
}
