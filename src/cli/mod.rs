//! CLI module for ticketflow
//!
//! Provides the command-line interface using clap.

pub mod commands;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::PathBuf;

use crate::schemas::EntityId;

lazy_static::lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(r"^\s*(?P<amount>\d+)\s*(?P<unit>[mhd])\s*$").unwrap();
}

/// Ticketflow - workflow definitions, transition checks and SLA escalation
#[derive(Parser, Debug)]
#[command(name = "ticketflow")]
#[command(version)]
#[command(about = "Define ticket workflows, query valid transitions and evaluate SLA escalation")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress info-level output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Check operations without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Override the working directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .ticketflow store in the current directory
    Init {
        /// Overwrite config.json if the store already exists
        #[arg(long)]
        force: bool,
    },

    /// List workflows
    List {
        /// Only workflows visible to this team
        #[arg(long)]
        team: Option<EntityId>,

        /// Only workflows the team can still reference or clone (requires --team)
        #[arg(long, requires = "team")]
        candidates: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a workflow with its states and transitions
    Show {
        /// Workflow ID
        id: EntityId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a workflow detail file without saving it
    Validate {
        /// Path to a workflow detail JSON file
        file: PathBuf,
    },

    /// Save a new workflow from a detail file
    Create {
        /// Path to a workflow detail JSON file
        file: PathBuf,
    },

    /// Replace a stored workflow with a detail file
    Update {
        /// Workflow ID
        id: EntityId,

        /// Path to a workflow detail JSON file
        file: PathBuf,
    },

    /// Apply a JSON list of graph commands to a stored workflow
    Edit {
        /// Workflow ID
        id: EntityId,

        /// Path to a JSON array of commands
        file: PathBuf,
    },

    /// Show the initial states of a workflow
    InitialStates {
        /// Workflow ID
        id: EntityId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the states a ticket can move to from a given state
    NextStates {
        /// Workflow ID
        id: EntityId,

        /// Current state ID
        #[arg(long)]
        from: EntityId,

        /// Offer the current state as a "stay" option
        #[arg(long)]
        include_self: bool,

        /// List each outgoing transition with its event name
        #[arg(long)]
        events: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a team workflow that shares another workflow's graph
    Reference {
        /// Source workflow ID
        id: EntityId,

        /// Team ID
        #[arg(long)]
        team: EntityId,

        /// Name of the new workflow
        #[arg(long)]
        name: Option<String>,

        /// Description of the new workflow
        #[arg(long)]
        description: Option<String>,
    },

    /// Create a team workflow with an independent copy of another workflow's graph
    Clone {
        /// Source workflow ID
        id: EntityId,

        /// Team ID
        #[arg(long)]
        team: EntityId,

        /// Name of the new workflow
        #[arg(long)]
        name: Option<String>,

        /// Description of the new workflow
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a workflow
    Delete {
        /// Workflow ID
        id: EntityId,
    },

    /// Remove a team's link to a workflow
    Unlink {
        /// Workflow ID
        id: EntityId,

        /// Team ID
        #[arg(long)]
        team: EntityId,
    },

    /// Check and apply a ticket move between two states
    Move {
        /// Workflow ID
        workflow: EntityId,

        /// Current state ID
        #[arg(long)]
        from: EntityId,

        /// Target state ID
        #[arg(long)]
        to: EntityId,

        /// Time of the move (RFC 3339, defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<DateTime<Utc>>,

        /// Accept moving to the current state without a self-loop transition
        #[arg(long)]
        allow_stay: bool,
    },

    /// Evaluate the SLA of a transition taken at a given time
    Sla {
        /// Workflow ID
        workflow: EntityId,

        /// Transition ID
        #[arg(long)]
        transition: EntityId,

        /// When the transition was taken (RFC 3339)
        #[arg(long, value_parser = parse_timestamp)]
        taken_at: DateTime<Utc>,

        /// Evaluation time (RFC 3339, defaults to now)
        #[arg(long, value_parser = parse_timestamp, conflicts_with = "after")]
        now: Option<DateTime<Utc>>,

        /// Evaluate this long after the transition, e.g. 90m, 4h, 2d
        #[arg(long, value_parser = parse_duration)]
        after: Option<Duration>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse an RFC 3339 timestamp
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e))
}

/// Parse a duration like `90m`, `4h` or `2d`
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let caps = DURATION_REGEX
        .captures(s)
        .ok_or_else(|| format!("invalid duration '{}': expected e.g. 90m, 4h or 2d", s))?;
    let amount: i64 = caps["amount"]
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", s, e))?;

    let duration = match &caps["unit"] {
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        _ => Duration::try_days(amount),
    };
    duration.ok_or_else(|| format!("invalid duration '{}': out of range", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("4h").unwrap(), Duration::hours(4));
        assert_eq!(parse_duration(" 2 d ").unwrap(), Duration::days(2));
        assert!(parse_duration("4").is_err());
        assert!(parse_duration("-4h").is_err());
        assert!(parse_duration("4w").is_err());
    }

    #[test]
    fn test_parse_duration_out_of_range() {
        let err = parse_duration("10000000000000000h").unwrap_err();
        assert!(err.contains("out of range"));
        assert!(parse_duration("99999999999999999999d").is_err());
        assert_eq!(parse_duration("36500d").unwrap(), Duration::days(36500));
    }

    #[test]
    fn test_parse_timestamp() {
        let t = parse_timestamp("2024-03-04T10:00:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_next_states() {
        let cli = Cli::parse_from([
            "ticketflow",
            "next-states",
            "4",
            "--from",
            "5",
            "--include-self",
        ]);
        match cli.command {
            Some(Commands::NextStates {
                id,
                from,
                include_self,
                events,
                ..
            }) => {
                assert_eq!((id, from), (4, 5));
                assert!(include_self);
                assert!(!events);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_sla_now_conflicts_with_after() {
        let result = Cli::try_parse_from([
            "ticketflow",
            "sla",
            "1",
            "--transition",
            "2",
            "--taken-at",
            "2024-03-04T08:00:00Z",
            "--now",
            "2024-03-04T09:00:00Z",
            "--after",
            "4h",
        ]);
        assert!(result.is_err());
    }
}
