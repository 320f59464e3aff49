use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands::organization::OrganizationOptions;
use crate::commands::ticket::TicketOptions;
use crate::commands::{self, CommandReport, SidebarOptions};
use crate::env_loader::DotenvSource;
use crate::logging;
use crate::ticketfu::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(name = "ticketfu-sidebar", version, about = "TicketFu ticket and organization summaries")]
struct Cli {
    /// TicketFu server base URL (overrides TICKETFU_SERVER_URL)
    #[arg(long, global = true)]
    server_url: Option<String>,
    /// TicketFu API token (overrides TICKETFU_API_TOKEN)
    #[arg(long, global = true)]
    api_token: Option<String>,
    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct FollowArgs {
    /// Keep running and re-render on each host event name read from stdin
    #[arg(long)]
    follow: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the ticket summary, generating it on first miss
    Ticket {
        #[arg(long)]
        ticket_id: String,
        #[arg(long)]
        organization_id: Option<String>,
        /// Zendesk subdomain (overrides TICKETFU_SUBDOMAIN)
        #[arg(long)]
        subdomain: Option<String>,
        #[command(flatten)]
        follow: FollowArgs,
    },
    /// Show the organization summary
    Organization {
        #[arg(long)]
        organization_id: String,
        #[command(flatten)]
        follow: FollowArgs,
    },
    /// Show resolved settings and known environment keys
    Status,
}

fn overrides(cli: &Cli, subdomain: Option<String>) -> ConfigOverrides {
    ConfigOverrides {
        server_url: cli.server_url.clone(),
        api_token: cli.api_token.clone(),
        subdomain,
    }
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for line in &report.details {
        println!("{line}");
    }
    for line in &report.output {
        println!("{line}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
    Ok(())
}

pub fn run(dotenv: &DotenvSource) -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let DotenvSource::Invalid { path, reason } = dotenv {
        tracing::warn!(path = %path.display(), "ignoring unreadable .env: {reason}");
    }

    let report = match &cli.command {
        Command::Ticket {
            ticket_id,
            organization_id,
            subdomain,
            follow,
        } => commands::ticket::run(&TicketOptions {
            sidebar: SidebarOptions {
                overrides: overrides(&cli, subdomain.clone()),
                follow: follow.follow,
            },
            ticket_id: ticket_id.clone(),
            organization_id: organization_id.clone(),
        })?,
        Command::Organization {
            organization_id,
            follow,
        } => commands::organization::run(&OrganizationOptions {
            sidebar: SidebarOptions {
                overrides: overrides(&cli, None),
                follow: follow.follow,
            },
            organization_id: organization_id.clone(),
        })?,
        Command::Status => commands::status::run(&overrides(&cli, None), dotenv)?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        anyhow::bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
