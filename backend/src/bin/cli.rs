use anyhow::Context;
use clap::{Parser, Subcommand};
use reqwest::Client;
use shared_types::{
    AccountResponse, ActionItemsResponse, FollowupResponse, ImportTranscriptRequest, Meeting,
    PrepSummaryResponse, SyncReport, TranscriptImportResponse,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "meetline-cli")]
#[command(about = "CLI for driving the meeting intelligence API")]
#[command(
    long_about = "A command-line interface for the meeting intelligence backend.\n\n\
    Syncs calendar events into meetings, and triggers prep summaries,\n\
    transcript imports, action-item extraction, and follow-up drafts\n\
    for individual meetings."
)]
struct Cli {
    /// Backend server URL to connect to.
    ///
    /// The CLI will make HTTP requests to this server's API endpoints.
    /// Use this to connect to a remote server or a different port.
    #[arg(
        short,
        long,
        default_value = "http://localhost:3000",
        env = "MEETLINE_API_URL"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected calendar accounts
    Accounts,

    /// Sync upcoming calendar events for an account
    ///
    /// Pulls the next 30 days of events from the account's primary
    /// calendar and stores them as meetings. Prints the synced/errors
    /// counter pair.
    Sync {
        /// The UUID of the account to sync.
        /// Use 'accounts' to find the ID.
        account_id: Uuid,
    },

    /// List synced meetings
    Meetings {
        /// Maximum number of meetings to show.
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Show one meeting with its enrichments
    Show {
        /// The UUID of the meeting to show.
        /// Use 'meetings' to find the ID (shown in brackets).
        meeting_id: Uuid,
    },

    /// Generate a prep summary from recent attendee email threads
    Prep {
        /// The UUID of the meeting to prepare for.
        meeting_id: Uuid,
    },

    /// Import a transcript from the transcript provider
    Transcript {
        /// The UUID of the meeting to attach the transcript to.
        meeting_id: Uuid,

        /// The provider's recording id for the meeting.
        recording_id: String,
    },

    /// Extract action items from a meeting's stored transcript
    ActionItems {
        /// The UUID of the meeting. Import a transcript first.
        meeting_id: Uuid,
    },

    /// Draft a follow-up email from the meeting's stored metadata
    Followup {
        /// The UUID of the meeting to follow up on.
        meeting_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.base_url;

    match cli.command {
        Commands::Accounts => {
            let url = format!("{}/api/accounts", base_url);
            let accounts: Vec<AccountResponse> = client
                .get(&url)
                .send()
                .await?
                .error_for_status()
                .context("Failed to list accounts")?
                .json()
                .await?;

            if accounts.is_empty() {
                println!("No accounts connected.");
            } else {
                for account in accounts {
                    let synced = account
                        .last_synced
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "[{}] {} <{}> (last synced: {})",
                        &account.id.to_string()[..8],
                        account.account_name,
                        account.email_address,
                        synced
                    );
                }
            }
        }
        Commands::Sync { account_id } => {
            let url = format!("{}/api/accounts/{}/sync", base_url, account_id);
            let report: SyncReport = client
                .post(&url)
                .send()
                .await?
                .error_for_status()
                .context("Sync request failed")?
                .json()
                .await?;

            println!("Synced {} events, {} errors", report.synced, report.errors);
        }
        Commands::Meetings { limit } => {
            let mut url = format!("{}/api/meetings", base_url);
            if let Some(l) = limit {
                url.push_str(&format!("?limit={}", l));
            }
            let meetings: Vec<Meeting> = client
                .get(&url)
                .send()
                .await?
                .error_for_status()
                .context("Failed to list meetings")?
                .json()
                .await?;

            if meetings.is_empty() {
                println!("No meetings found.");
            } else {
                for meeting in meetings {
                    let enrichments = enrichment_flags(&meeting);
                    println!(
                        "[{}] {} — {} ({})",
                        &meeting.id.to_string()[..8],
                        meeting.start_time.to_rfc3339(),
                        meeting.title,
                        enrichments
                    );
                }
            }
        }
        Commands::Show { meeting_id } => {
            let url = format!("{}/api/meetings/{}", base_url, meeting_id);
            let meeting: Meeting = client
                .get(&url)
                .send()
                .await?
                .error_for_status()
                .context("Failed to fetch meeting")?
                .json()
                .await?;

            println!("{}", meeting.title);
            println!("  When: {} — {}", meeting.start_time, meeting.end_time);
            println!("  Attendees: {}", meeting.attendees.join(", "));
            if let Some(location) = &meeting.location {
                println!("  Location: {}", location);
            }
            if let Some(link) = &meeting.meeting_link {
                println!("  Link: {}", link);
            }
            if let Some(summary) = &meeting.prep_summary {
                println!("\nPrep summary:\n{}", summary);
            }
            if let Some(items) = &meeting.action_items {
                println!("\nAction items:");
                for item in items.iter() {
                    println!("  - {}", item);
                }
            }
            if meeting.transcript.is_some() {
                println!("\n(transcript stored)");
            }
        }
        Commands::Prep { meeting_id } => {
            let url = format!("{}/api/meetings/{}/prep", base_url, meeting_id);
            let response: PrepSummaryResponse = client
                .post(&url)
                .send()
                .await?
                .error_for_status()
                .context("Prep request failed")?
                .json()
                .await?;

            if response.summary.is_empty() {
                println!("No prep summary generated.");
            } else {
                println!("{}", response.summary);
            }
        }
        Commands::Transcript {
            meeting_id,
            recording_id,
        } => {
            let url = format!("{}/api/meetings/{}/transcript", base_url, meeting_id);
            let response: TranscriptImportResponse = client
                .post(&url)
                .json(&ImportTranscriptRequest { recording_id })
                .send()
                .await?
                .error_for_status()
                .context("Transcript import failed")?
                .json()
                .await?;

            match response.transcript {
                Some(transcript) => {
                    println!("Imported transcript ({} chars)", transcript.chars().count())
                }
                None => println!("No transcript imported."),
            }
        }
        Commands::ActionItems { meeting_id } => {
            let url = format!("{}/api/meetings/{}/action-items", base_url, meeting_id);
            let response: ActionItemsResponse = client
                .post(&url)
                .send()
                .await?
                .error_for_status()
                .context("Action item extraction failed")?
                .json()
                .await?;

            if response.action_items.is_empty() {
                println!("No action items.");
            } else {
                for item in response.action_items {
                    println!("- {}", item);
                }
            }
        }
        Commands::Followup { meeting_id } => {
            let url = format!("{}/api/meetings/{}/followup", base_url, meeting_id);
            let response: FollowupResponse = client
                .post(&url)
                .send()
                .await?
                .error_for_status()
                .context("Follow-up request failed")?
                .json()
                .await?;

            println!("{}", response.body);
        }
    }

    Ok(())
}

fn enrichment_flags(meeting: &Meeting) -> String {
    let mut flags = Vec::new();
    if meeting.prep_summary.is_some() {
        flags.push("prep");
    }
    if meeting.transcript.is_some() {
        flags.push("transcript");
    }
    if meeting.action_items.is_some() {
        flags.push("actions");
    }
    if flags.is_empty() {
        "unenriched".to_string()
    } else {
        flags.join("+")
    }
}
