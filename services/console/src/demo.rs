use crate::client::{connect, describe, print_stats, Workflow};
use crate::sandbox::{self, SandboxStore};
use chrono::{Local, Utc};
use clap::Args;
use hireflow::error::AppError;
use hireflow::workflows::applications::resume::MIME_PDF;
use hireflow::workflows::applications::{ApplicationDetails, ApplicationStatus, ResumeFile};
use hireflow::workflows::jobs::JobDraft;
use hireflow::workflows::{Registration, UserRole};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Job-board API to drive. Defaults to a sandbox started for the demo.
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Resume to attach (PDF or Word). A small generated PDF is used otherwise.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { api_url, resume } = args;

    let api_url = match api_url {
        Some(url) => url,
        None => {
            let (addr, _server) = sandbox::spawn(SandboxStore::default()).await?;
            println!("Started sandbox job board on http://{addr}");
            format!("http://{addr}/api")
        }
    };

    let resume = match resume {
        Some(path) => ResumeFile::from_path(path).await?,
        None => ResumeFile::new("resume.pdf", MIME_PDF, sample_pdf()),
    };

    let suffix = Utc::now().timestamp_millis();
    let mut employer = connect(Some(&api_url))?;
    let mut employee = connect(Some(&api_url))?;

    employer
        .register(demo_account(
            &format!("hiring-{suffix}@acme.test"),
            "Acme Hiring",
            UserRole::Employer,
        ))
        .await?;
    employee
        .register(demo_account(
            &format!("casey-{suffix}@mail.test"),
            "Casey Candidate",
            UserRole::Employee,
        ))
        .await?;

    let job = employer
        .post_job(JobDraft {
            title: "Platform Engineer".to_string(),
            description: "Keep the hiring platform fast and boring.".to_string(),
            requirements: "Rust, Postgres, on-call rotation".to_string(),
            location: "Remote".to_string(),
            salary: "$140k - $165k".to_string(),
        })
        .await?;
    println!("\nEmployer posted job #{} {}", job.id, job.title);

    println!("\nEmployee job listing before applying:");
    print_listing(&mut employee).await?;

    let application = employee
        .apply(
            job.id,
            Some(resume),
            Some(ApplicationDetails {
                cover_letter: "I like boring platforms.".to_string(),
                phone_number: "555-0100".to_string(),
                location: "Lisbon".to_string(),
            }),
        )
        .await?;
    println!("\nEmployee applied: application #{}", application.id);

    println!("\nEmployee job listing after applying:");
    print_listing(&mut employee).await?;

    employer.refresh_jobs().await?;
    employer.refresh_applications().await?;
    println!("\nEmployer inbox:");
    for application in employer.applications() {
        println!("{}", describe(application));
    }

    for target in [
        ApplicationStatus::Viewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Accepted,
    ] {
        let outcome = employer.transition(application.id, target).await?;
        println!(
            "  moved #{} {} -> {}",
            outcome.plan.application_id, outcome.plan.from, outcome.plan.to
        );
    }

    match employer
        .transition(application.id, ApplicationStatus::Rejected)
        .await
    {
        Ok(_) => println!("  unexpected: accepted application was rejected"),
        Err(err) => println!("  guard held: {}", err.user_message()),
    }

    println!("\nEmployer view:");
    print_stats(&employer);
    let overview = employer
        .employer_overview(Local::now().date_naive())
        .await?;
    println!(
        "Jobs: {} posted, {} active, {} applications ({} this month)",
        overview.total_jobs,
        overview.active_jobs,
        overview.total_applications,
        overview.applications_this_month
    );

    employee.refresh_applications().await?;
    println!("\nEmployee view:");
    print_stats(&employee);
    for application in employee.applications() {
        println!("{}", describe(application));
    }

    Ok(())
}

fn demo_account(email: &str, name: &str, role: UserRole) -> Registration {
    Registration {
        email: email.to_string(),
        password: "demo-pass".to_string(),
        confirm_password: "demo-pass".to_string(),
        name: name.to_string(),
        role,
    }
}

async fn print_listing(workflow: &mut Workflow) -> Result<(), AppError> {
    for row in workflow.job_listing().await? {
        let badge = if row.already_applied { " [applied]" } else { "" };
        println!("  #{} {} - {}{badge}", row.job.id, row.job.title, row.job.location);
    }
    Ok(())
}

fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj << /Type /Catalog >> endobj\ntrailer << /Root 1 0 R >>\n%%EOF\n".to_vec()
}
