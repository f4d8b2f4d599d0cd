use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{load_settings, OnboardingContext, OnboardingWizard, WizardError};
use forms::{BasicInfoField, DetailsField};
use shared::{domain::AccessRole, protocol::WizardStep};
use storage::{DraftKey, DraftStore, SqliteStore};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod output;
mod photo;

#[derive(Parser, Debug)]
#[command(name = "onboard", about = "Two-step employee onboarding")]
struct Cli {
    /// TOML settings file. Defaults to ./onboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List employees, merged with their details.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Admin: basic info, then details. Omitted values come from the drafts.
    Create {
        #[command(flatten)]
        basic: BasicInfoArgs,
        #[command(flatten)]
        details: DetailsArgs,
    },
    /// Ops: details for an employee with no basic info yet.
    RegisterDetails {
        #[arg(long)]
        employee_id: Option<String>,
        #[command(flatten)]
        details: DetailsArgs,
    },
    /// Ops: complete the details of an existing employee.
    FillDetails {
        #[arg(long)]
        employee_id: String,
        #[command(flatten)]
        details: DetailsArgs,
    },
    Drafts {
        #[command(subcommand)]
        action: DraftsAction,
    },
    /// Department or location suggestions for a partial name.
    Lookup { kind: LookupKind, query: String },
}

#[derive(Subcommand, Debug)]
enum DraftsAction {
    Show {
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    Clear {
        #[arg(long, value_enum)]
        role: RoleArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Admin,
    Ops,
}

impl From<RoleArg> for AccessRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Admin => AccessRole::Admin,
            RoleArg::Ops => AccessRole::Ops,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LookupKind {
    Departments,
    Locations,
}

#[derive(Args, Debug)]
struct BasicInfoArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Also generates the employee id.
    #[arg(long)]
    department: Option<String>,
    /// Ops, Admin, Engineer or Finance.
    #[arg(long)]
    role: Option<String>,
}

impl BasicInfoArgs {
    fn values(&self) -> Vec<(BasicInfoField, &str)> {
        [
            (BasicInfoField::FullName, &self.full_name),
            (BasicInfoField::Email, &self.email),
            (BasicInfoField::Role, &self.role),
            (BasicInfoField::Department, &self.department),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[derive(Args, Debug)]
struct DetailsArgs {
    /// Full-time, Part-time, Contract or Intern.
    #[arg(long)]
    employment_type: Option<String>,
    #[arg(long)]
    office_location: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Image file, at most 5 MB.
    #[arg(long)]
    photo: Option<PathBuf>,
}

impl DetailsArgs {
    fn values(&self) -> Vec<(DetailsField, &str)> {
        [
            (DetailsField::EmploymentType, &self.employment_type),
            (DetailsField::OfficeLocation, &self.office_location),
            (DetailsField::Notes, &self.notes),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let settings = load_settings(cli.config.as_deref())?;
    debug!(?settings, "settings loaded");
    let store = SqliteStore::new(&settings.draft_database_url)
        .await
        .with_context(|| {
            format!(
                "failed to open draft store '{}'",
                settings.draft_database_url
            )
        })?;
    let ctx = OnboardingContext::http(&settings, DraftStore::new(Arc::new(store)));

    match cli.command {
        Command::List { page } => list(&ctx, page).await,
        Command::Create { basic, details } => {
            run_wizard(&ctx, AccessRole::Admin, None, Some(&basic), None, &details).await
        }
        Command::RegisterDetails {
            employee_id,
            details,
        } => {
            run_wizard(
                &ctx,
                AccessRole::Ops,
                None,
                None,
                employee_id.as_deref(),
                &details,
            )
            .await
        }
        Command::FillDetails {
            employee_id,
            details,
        } => run_wizard(&ctx, AccessRole::Ops, Some(employee_id), None, None, &details).await,
        Command::Drafts { action } => drafts(&ctx, action).await,
        Command::Lookup { kind, query } => lookup(&ctx, kind, query).await,
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn list(ctx: &OnboardingContext, page: u32) -> Result<()> {
    let page = ctx
        .directory()
        .list_page(page)
        .await
        .context("failed to load employees")?;
    output::print_page(&page);
    Ok(())
}

async fn run_wizard(
    ctx: &OnboardingContext,
    role: AccessRole,
    route_employee_id: Option<String>,
    basic: Option<&BasicInfoArgs>,
    employee_id_input: Option<&str>,
    details: &DetailsArgs,
) -> Result<()> {
    let mut wizard = OnboardingWizard::start(ctx.clone(), role, route_employee_id).await?;
    if wizard.is_fill_details_mode() {
        match wizard.existing_details() {
            Some(_) => info!("updating the employee's existing details"),
            None => info!("no details on file, a new record will be created"),
        }
    }

    if let Some(basic) = basic {
        for (field, value) in basic.values() {
            wizard.set_basic_field(field, value).await?;
        }
        if !wizard.next().await? {
            wizard.flush_drafts().await;
            eprintln!("Step 1 is incomplete:");
            if let Some(form) = wizard.basic_form() {
                output::print_form_errors(form);
            }
            bail!("step 1 was saved as a draft; rerun with the missing values");
        }
        if let Some(record) = wizard.basic_info_data() {
            println!(
                "Step 1 complete: {} ({})",
                record.full_name, record.employee_id
            );
        }
    }

    if wizard.current_step() != WizardStep::Details {
        bail!("the wizard did not reach the details step");
    }
    if let Some(employee_id) = employee_id_input {
        wizard.set_details_field(DetailsField::EmployeeId, employee_id)?;
    }
    for (field, value) in details.values() {
        wizard.set_details_field(field, value)?;
    }
    if let Some(path) = &details.photo {
        let photo = photo::encode_photo(path).await?;
        wizard.set_details_field(DetailsField::Photo, photo)?;
    }

    let mut events = wizard.orchestrator().subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(step) = event.progress {
                        println!("{step}");
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = wizard.submit().await;
    if matches!(result, Ok(None)) {
        wizard.flush_drafts().await;
        eprintln!("Step 2 is incomplete:");
        if let Some(form) = wizard.details_form() {
            output::print_form_errors(form);
        }
    }
    drop(wizard);
    let _ = printer.await;

    match result {
        Ok(Some(outcome)) => {
            output::print_outcome(&outcome);
            println!();
            list(ctx, 1).await
        }
        Ok(None) => bail!("step 2 was saved as a draft; rerun with the missing values"),
        Err(WizardError::Submission(err)) => {
            let message = err.user_message();
            Err(anyhow::Error::new(err).context(message))
        }
        Err(err) => Err(err.into()),
    }
}

async fn drafts(ctx: &OnboardingContext, action: DraftsAction) -> Result<()> {
    match action {
        DraftsAction::Show { role } => {
            let role = AccessRole::from(role);
            for step in [WizardStep::BasicInfo, WizardStep::Details] {
                let key = DraftKey::new(role, step);
                match ctx.drafts.restore::<serde_json::Value>(key).await {
                    Some(draft) => println!(
                        "{}:\n{}",
                        key.storage_key(),
                        serde_json::to_string_pretty(&output::redact_photo(draft))?
                    ),
                    None => println!("{}: (none)", key.storage_key()),
                }
            }
        }
        DraftsAction::Clear { role } => {
            let role = AccessRole::from(role);
            ctx.drafts.clear_all(role).await;
            println!("Cleared drafts for {role}.");
        }
    }
    Ok(())
}

async fn lookup(ctx: &OnboardingContext, kind: LookupKind, query: String) -> Result<()> {
    let mut autocomplete = match kind {
        LookupKind::Departments => ctx.department_autocomplete(),
        LookupKind::Locations => ctx.location_autocomplete(),
    };
    autocomplete.set_input(query);
    autocomplete.settle().await;

    let suggestions = autocomplete.suggestions();
    if suggestions.items.is_empty() {
        println!("No matches.");
    }
    for item in suggestions.items {
        println!("{}\t{}", item.id, item.name);
    }
    Ok(())
}
