//! shiftlog CLI - punch tracking and session reconciliation from the
//! command line

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use cli::{Cli, Commands, MemberCommands, RequestCommands};
use commands::common::resolve_db_path;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shiftlog=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Init {
            name,
            utc_offset,
            cutoff,
        } => commands::init::run_init(&name, utc_offset, &cutoff, &db_path).await?,
        Commands::Member {
            command: MemberCommands::Add {
                user,
                company,
                role,
                name,
            },
        } => {
            commands::member::run_member_add(user.as_deref(), &company, role, &name, &db_path)
                .await?;
        }
        Commands::Punch {
            kind,
            user,
            company,
            at,
            note,
            lat,
            lon,
        } => {
            commands::punch::run_punch(
                kind,
                &user,
                &company,
                at.as_deref(),
                note.as_deref(),
                lat,
                lon,
                &db_path,
            )
            .await?;
        }
        Commands::Status {
            user,
            company,
            json,
        } => commands::status::run_status(&user, &company, json, &db_path).await?,
        Commands::Day {
            user,
            company,
            date,
            json,
        } => commands::day::run_day(&user, &company, &date, json, &db_path).await?,
        Commands::CloseDay {
            date,
            company,
            cutoff,
        } => {
            commands::close_day::run_close_day(
                date.as_deref(),
                company.as_deref(),
                cutoff.as_deref(),
                &db_path,
            )
            .await?;
        }
        Commands::Request { command } => match command {
            RequestCommands::Submit {
                user,
                company,
                target,
                kind,
                at,
                reason,
            } => {
                commands::request::run_request_submit(
                    &user,
                    &company,
                    target.as_deref(),
                    kind,
                    &at,
                    &reason,
                    &db_path,
                )
                .await?;
            }
            RequestCommands::Decide {
                id,
                reviewer,
                approve,
                reject,
                comments,
            } => {
                commands::request::run_request_decide(
                    &id, &reviewer, approve, reject, comments, &db_path,
                )
                .await?;
            }
            RequestCommands::List {
                company,
                status,
                limit,
                json,
            } => {
                commands::request::run_request_list(&company, status, limit, json, &db_path)
                    .await?;
            }
        },
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
