//! Ticketflow CLI - workflow definitions, transition checks and SLA escalation

use clap::Parser;
use ticketflow::cli::commands;
use ticketflow::cli::{Cli, Commands};
use ticketflow::domain::DerivationStrategy;
use ticketflow::errors::{to_exit_code, TicketflowError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over -v/-q
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(TicketflowError::Validation(violations)) => {
            eprintln!("Validation failed:");
            for violation in &violations {
                eprintln!("  {}: {}", violation.field, violation.message);
            }
            std::process::exit(to_exit_code(&TicketflowError::Validation(violations)));
        }
        Err(e) if e.is_user_correctable() => {
            eprintln!("{}", e);
            std::process::exit(to_exit_code(&e));
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            std::process::exit(to_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> ticketflow::Result<()> {
    let cwd = cli.cwd.as_deref();
    let dry_run = cli.dry_run;
    if dry_run {
        tracing::info!("dry run: nothing will be written");
    }

    match cli.command {
        Some(Commands::Init { force }) => commands::init::run(cwd, force, dry_run).await,
        Some(Commands::List {
            team,
            candidates,
            json,
        }) => commands::list::run(cwd, team, candidates, json).await,
        Some(Commands::Show { id, json }) => commands::show::run(cwd, id, json).await,
        Some(Commands::Validate { file }) => commands::validate::run(cwd, &file).await,
        Some(Commands::Create { file }) => commands::author::create(cwd, &file, dry_run).await,
        Some(Commands::Update { id, file }) => {
            commands::author::update(cwd, id, &file, dry_run).await
        }
        Some(Commands::Edit { id, file }) => commands::author::edit(cwd, id, &file, dry_run).await,
        Some(Commands::InitialStates { id, json }) => {
            commands::states::initial(cwd, id, json).await
        }
        Some(Commands::NextStates {
            id,
            from,
            include_self,
            events,
            json,
        }) => commands::states::next(cwd, id, from, include_self, events, json).await,
        Some(Commands::Reference {
            id,
            team,
            name,
            description,
        }) => {
            commands::derive::run(
                cwd,
                DerivationStrategy::Reference,
                id,
                team,
                name,
                description,
                dry_run,
            )
            .await
        }
        Some(Commands::Clone {
            id,
            team,
            name,
            description,
        }) => {
            commands::derive::run(
                cwd,
                DerivationStrategy::Clone,
                id,
                team,
                name,
                description,
                dry_run,
            )
            .await
        }
        Some(Commands::Delete { id }) => commands::remove::delete(cwd, id, dry_run).await,
        Some(Commands::Unlink { id, team }) => {
            commands::remove::unlink(cwd, id, team, dry_run).await
        }
        Some(Commands::Move {
            workflow,
            from,
            to,
            at,
            allow_stay,
        }) => commands::ticket::move_ticket(cwd, workflow, from, to, at, allow_stay).await,
        Some(Commands::Sla {
            workflow,
            transition,
            taken_at,
            now,
            after,
            json,
        }) => commands::ticket::sla(cwd, workflow, transition, taken_at, now, after, json).await,
        None => {
            // Default to showing help - clap handles this
            println!("Use --help for usage information");
            Ok(())
        }
    }
}
