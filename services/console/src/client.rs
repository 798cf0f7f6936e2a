use chrono::Local;
use clap::Args;
use hireflow::api::HttpJobBoardApi;
use hireflow::config::{ApiConfig, AppConfig, TelemetryConfig};
use hireflow::error::AppError;
use hireflow::telemetry::{self, TelemetryError};
use hireflow::workflows::applications::{
    Application, ApplicationId, ApplicationStatus, ApplicationWorkflowService,
};
use hireflow::workflows::{Credentials, UserRole};
use std::sync::Arc;

pub(crate) type Workflow = ApplicationWorkflowService<HttpJobBoardApi>;

#[derive(Args, Debug)]
pub(crate) struct ClientArgs {
    /// Account email
    #[arg(long, env = "HIREFLOW_EMAIL")]
    pub(crate) email: String,
    /// Account password
    #[arg(long, env = "HIREFLOW_PASSWORD", hide_env_values = true)]
    pub(crate) password: String,
    /// Override the configured job-board API base URL
    #[arg(long)]
    pub(crate) api_url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct TransitionArgs {
    #[command(flatten)]
    pub(crate) client: ClientArgs,
    /// Application to update
    pub(crate) application_id: i64,
    /// Target status (viewed, shortlisted, rejected, accepted)
    pub(crate) status: ApplicationStatus,
}

/// Build a workflow manager for the configured API, optionally overriding its base URL.
pub(crate) fn connect(api_url: Option<&str>) -> Result<Workflow, AppError> {
    let config = AppConfig::load()?;
    init_telemetry(&config.telemetry)?;

    let api_config = match api_url {
        Some(url) => ApiConfig::new(url, config.api.request_timeout)?,
        None => config.api,
    };
    let api = HttpJobBoardApi::new(&api_config)?;
    Ok(Workflow::new(Arc::new(api)))
}

/// Install logging once per process. The demo builds several workflows, so a subscriber
/// that is already installed is expected; a bad filter is not.
fn init_telemetry(config: &TelemetryConfig) -> Result<(), AppError> {
    match telemetry::init(config) {
        Ok(()) | Err(TelemetryError::Subscriber(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn signed_in(args: &ClientArgs) -> Result<Workflow, AppError> {
    let mut workflow = connect(args.api_url.as_deref())?;
    workflow
        .login(Credentials {
            email: args.email.clone(),
            password: args.password.clone(),
        })
        .await?;
    Ok(workflow)
}

pub(crate) async fn run_jobs(args: ClientArgs) -> Result<(), AppError> {
    let mut workflow = signed_in(&args).await?;
    let role = workflow.session().role();

    match role {
        Some(UserRole::Employee) => {
            let listing = workflow.job_listing().await?;
            println!("Open jobs ({})", listing.len());
            for row in listing {
                let badge = if row.already_applied { " [applied]" } else { "" };
                println!(
                    "  #{} {} - {} ({}){badge}",
                    row.job.id, row.job.title, row.job.location, row.job.salary
                );
            }
        }
        _ => {
            let overview = workflow
                .employer_overview(Local::now().date_naive())
                .await?;
            println!(
                "Your jobs: {} posted, {} active, {} applications ({} this month)",
                overview.total_jobs,
                overview.active_jobs,
                overview.total_applications,
                overview.applications_this_month
            );
            for job in workflow.jobs().await? {
                let state = if job.is_active { "active" } else { "inactive" };
                println!("  #{} {} - {} [{state}]", job.id, job.title, job.location);
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_applications(args: ClientArgs) -> Result<(), AppError> {
    let mut workflow = signed_in(&args).await?;
    if workflow.session().role() == Some(UserRole::Employer) {
        // Ownership of each application is checked against the employer's own postings.
        workflow.refresh_jobs().await?;
    }
    workflow.ensure_applications().await?;

    print_stats(&workflow);
    for application in workflow.applications() {
        println!("{}", describe(application));
        let actions = workflow.available_actions(application.id);
        if !actions.is_empty() {
            let labels: Vec<&str> = actions.iter().map(|status| status.label()).collect();
            println!("      actions: {}", labels.join(", "));
        }
    }
    Ok(())
}

pub(crate) async fn run_transition(args: TransitionArgs) -> Result<(), AppError> {
    let mut workflow = signed_in(&args.client).await?;
    workflow.refresh_jobs().await?;
    workflow.ensure_applications().await?;

    let outcome = workflow
        .transition(ApplicationId(args.application_id), args.status)
        .await?;
    println!(
        "Application #{} moved from {} to {}",
        outcome.plan.application_id, outcome.plan.from, outcome.plan.to
    );
    if !outcome.refreshed {
        println!("  (list could not be refreshed; it will reload on next use)");
    }
    print_stats(&workflow);
    Ok(())
}

pub(crate) fn print_stats(workflow: &Workflow) {
    let stats = workflow.stats();
    println!(
        "Stats: {} total | {} applied | {} viewed | {} shortlisted | {} rejected | {} accepted",
        stats.total,
        stats.applied,
        stats.viewed,
        stats.shortlisted,
        stats.rejected,
        stats.accepted
    );
}

pub(crate) fn describe(application: &Application) -> String {
    let title = application.job_title.as_deref().unwrap_or("(untitled job)");
    let who = application
        .employee_name
        .as_deref()
        .or(application.employer_name.as_deref())
        .unwrap_or("-");
    let resume = application
        .resume()
        .map(|resume| format!(", resume {}", resume.filename))
        .unwrap_or_default();
    format!(
        "  #{} {title} - {who} [{}] applied {}{resume}",
        application.id,
        application.status.display_name(),
        application.applied_at.format("%Y-%m-%d")
    )
}
