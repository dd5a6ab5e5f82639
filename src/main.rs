use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_client::{ApiClient, HttpRecordStore, InterceptorChain, RequestTracing, StaticHeader};
use api_client::{BearerAuth, TokenStore};
use clinic_core::config::{api_base_url_from_env_value, edit_window_from_env_value};
use clinic_core::constants::{
    API_TOKEN_ENV, API_URL_ENV, DEFAULT_FEEDBACK_EDIT_WINDOW_SECS,
    DEFAULT_PRESCRIPTION_EDIT_WINDOW_SECS, FEEDBACK_EDIT_WINDOW_ENV, PRESCRIPTION_EDIT_WINDOW_ENV,
};
use clinic_core::{CoreConfig, EditOp, EditPolicy, EditSession, RecordStore, sanitize_all};
use records::{
    EncounterRecord, FeedbackRecord, PatientRecord, PrescriptionRecord, Record, RecordId,
    RecordKind,
};

mod render;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic record editing client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a record and print it
    Show {
        /// Record kind (patient, encounter, prescription, feedback)
        kind: RecordKind,
        /// Record identifier
        id: RecordId,
        /// Print the wire JSON instead of the field listing
        #[arg(long)]
        json: bool,
    },
    /// Report whether a record is still inside its edit window
    CanEdit {
        kind: RecordKind,
        id: RecordId,
    },
    /// Apply edits to a record and submit them
    ///
    /// Edits are `add:<collection>`, `remove:<collection>:<index>`,
    /// `<collection>.<index>.<key>=<value>`, `<nested>.<key>=<value>` or `<field>=<value>`.
    Edit {
        kind: RecordKind,
        /// Record to update; a new record is created when omitted
        #[arg(long)]
        id: Option<RecordId>,
        /// Print the sanitized payload without submitting it
        #[arg(long)]
        dry_run: bool,
        /// Edits, applied in order
        #[arg(required = true)]
        ops: Vec<EditOp>,
    },
}

/// Entry point for the `clinic` command line client.
///
/// # Environment Variables
/// - `CLINIC_API_URL`: REST API base URL (default: "http://localhost:5000/api")
/// - `CLINIC_API_TOKEN`: bearer token sent with every request
/// - `CLINIC_PRESCRIPTION_EDIT_WINDOW_SECS`: prescription edit window (default: 3600)
/// - `CLINIC_FEEDBACK_EDIT_WINDOW_SECS`: feedback edit window (default: 600)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config()?;

    let tokens = Arc::new(TokenStore::new());
    if let Some(token) = std::env::var(API_TOKEN_ENV).ok().filter(|t| !t.trim().is_empty()) {
        tokens.set(token.trim());
    }
    let chain = InterceptorChain::new()
        .with(StaticHeader::new("accept", "application/json")?)
        .with(BearerAuth::new(tokens))
        .with(RequestTracing);
    let client = Arc::new(ApiClient::new(&config, chain));
    let store = Arc::new(HttpRecordStore::new(client));

    tracing::debug!(api = config.api_base_url(), "configured");

    match cli.command {
        Commands::Show { kind, id, json } => match kind {
            RecordKind::Patient => show::<PatientRecord>(&store, &id, json).await,
            RecordKind::Encounter => show::<EncounterRecord>(&store, &id, json).await,
            RecordKind::Prescription => show::<PrescriptionRecord>(&store, &id, json).await,
            RecordKind::Feedback => show::<FeedbackRecord>(&store, &id, json).await,
        },
        Commands::CanEdit { kind, id } => match kind {
            RecordKind::Patient => can_edit::<PatientRecord>(&store, &config, &id).await,
            RecordKind::Encounter => can_edit::<EncounterRecord>(&store, &config, &id).await,
            RecordKind::Prescription => can_edit::<PrescriptionRecord>(&store, &config, &id).await,
            RecordKind::Feedback => can_edit::<FeedbackRecord>(&store, &config, &id).await,
        },
        Commands::Edit {
            kind,
            id,
            dry_run,
            ops,
        } => {
            let edit = EditRequest {
                id: id.as_ref(),
                ops: &ops,
                dry_run,
            };
            match kind {
                RecordKind::Patient => edit_record::<PatientRecord>(&store, &config, edit).await,
                RecordKind::Encounter => edit_record::<EncounterRecord>(&store, &config, edit).await,
                RecordKind::Prescription => {
                    edit_record::<PrescriptionRecord>(&store, &config, edit).await
                }
                RecordKind::Feedback => edit_record::<FeedbackRecord>(&store, &config, edit).await,
            }
        }
    }
}

/// Resolves configuration from the process environment once, at startup.
fn load_config() -> anyhow::Result<CoreConfig> {
    let prescription_window = edit_window_from_env_value(
        std::env::var(PRESCRIPTION_EDIT_WINDOW_ENV).ok(),
        chrono::Duration::seconds(DEFAULT_PRESCRIPTION_EDIT_WINDOW_SECS),
    )
    .with_context(|| format!("reading {PRESCRIPTION_EDIT_WINDOW_ENV}"))?;
    let feedback_window = edit_window_from_env_value(
        std::env::var(FEEDBACK_EDIT_WINDOW_ENV).ok(),
        chrono::Duration::seconds(DEFAULT_FEEDBACK_EDIT_WINDOW_SECS),
    )
    .with_context(|| format!("reading {FEEDBACK_EDIT_WINDOW_ENV}"))?;

    let policy = EditPolicy::default()
        .with_window(RecordKind::Prescription, prescription_window)
        .with_window(RecordKind::Feedback, feedback_window);
    let api_base_url = api_base_url_from_env_value(std::env::var(API_URL_ENV).ok());

    CoreConfig::new(api_base_url, policy).with_context(|| format!("reading {API_URL_ENV}"))
}

async fn show<R: Record>(store: &HttpRecordStore, id: &RecordId, json: bool) -> anyhow::Result<()> {
    let record: R = store.fetch(id).await?;
    if json {
        println!("{}", record.render_json()?);
    } else {
        print!("{}", render::render_record(&record));
    }
    Ok(())
}

async fn can_edit<R: Record>(
    store: &Arc<HttpRecordStore>,
    config: &CoreConfig,
    id: &RecordId,
) -> anyhow::Result<()> {
    let record: R = store.fetch(id).await?;
    let created_at = record.created_at();
    let session = EditSession::new(store.clone(), config.edit_policy(), Some(record));
    println!(
        "{} {id}: {}",
        R::KIND,
        render::describe_window(session.window(), created_at, session.time_remaining())
    );
    Ok(())
}

struct EditRequest<'a> {
    id: Option<&'a RecordId>,
    ops: &'a [EditOp],
    dry_run: bool,
}

async fn edit_record<R: Record>(
    store: &Arc<HttpRecordStore>,
    config: &CoreConfig,
    request: EditRequest<'_>,
) -> anyhow::Result<()> {
    let committed: Option<R> = match request.id {
        Some(id) => Some(store.fetch(id).await?),
        None => None,
    };
    let mut session = EditSession::new(store.clone(), config.edit_policy(), committed);

    session.begin_edit()?;
    for op in request.ops {
        session
            .apply(op)
            .with_context(|| format!("applying '{op}'"))?;
    }

    if request.dry_run {
        let draft = session
            .draft()
            .context("no draft is open after applying edits")?;
        println!("{}", sanitize_all(draft).render_json()?);
        session.cancel()?;
        return Ok(());
    }

    let saved = session.submit().await?;
    print!("{}", render::render_record(saved));
    Ok(())
}
