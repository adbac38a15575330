use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use client_core::{AttendanceApi, AttendanceFormController, HttpAttendanceApi, RosterPage};
use shared::domain::{AttendanceStatus, ClassId, StudentId};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::{parse_mark, parse_status, render_classes, render_roster};

#[derive(Parser, Debug)]
#[command(name = "attendance", about = "Take classroom attendance from the terminal")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the classes that can be selected.
    Classes,
    /// Show the roster of a class.
    Roster { class_id: String },
    /// Mark every student of a class and submit.
    Take {
        class_id: String,
        /// `<student id>=<present|absent>`, repeatable.
        #[arg(long = "mark", value_parser = parse_mark)]
        marks: Vec<(StudentId, AttendanceStatus)>,
        /// Status for students without an explicit mark.
        #[arg(long, value_parser = parse_status)]
        default: Option<AttendanceStatus>,
    },
    /// Show attendance already recorded for a class.
    Report {
        class_id: i64,
        /// Defaults to the server's today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let api = Arc::new(HttpAttendanceApi::new(&args.server_url)?);
    debug!(server_url = %api.base_url(), "attendance client ready");

    match args.command {
        Command::Classes => {
            let classes = api.list_classes().await?;
            print!("{}", render_classes(&classes));
        }
        Command::Roster { class_id } => {
            let controller = AttendanceFormController::new(api);
            let view = Mutex::new(RosterPage::new());
            let loaded = controller.on_class_change(&view, &class_id).await;
            let page = view.lock().await;
            if let Err(err) = loaded {
                bail!(page.message().map(str::to_string).unwrap_or_else(|| err.to_string()));
            }
            print!("{}", render_roster(&page));
        }
        Command::Take {
            class_id,
            marks,
            default,
        } => {
            take_attendance(api, &class_id, &marks, default).await?;
        }
        Command::Report { class_id, date } => {
            let report = api.attendance_report(ClassId(class_id), date).await?;
            println!("class {} on {}", report.class_id, report.date);
            if report.entries.is_empty() {
                println!("no attendance recorded");
            }
            for entry in report.entries {
                println!("{:>6}  {:<24}  {}", entry.student_id, entry.name, entry.status);
            }
        }
    }

    Ok(())
}

async fn take_attendance(
    api: Arc<HttpAttendanceApi>,
    class_id: &str,
    marks: &[(StudentId, AttendanceStatus)],
    default: Option<AttendanceStatus>,
) -> Result<()> {
    let controller = AttendanceFormController::new(api);
    let view = Mutex::new(RosterPage::new());

    if let Err(err) = controller.on_class_change(&view, class_id).await {
        let page = view.lock().await;
        bail!(page.message().map(str::to_string).unwrap_or_else(|| err.to_string()));
    }

    let mut event = {
        let mut page = view.lock().await;
        if !page.is_roster_visible() {
            bail!("no class selected");
        }
        if let Some(status) = default {
            let ids: Vec<StudentId> = page.rows().iter().map(|row| row.student_id).collect();
            for id in ids {
                page.select(id, status);
            }
        }
        for (student_id, status) in marks {
            if !page.select(*student_id, *status) {
                bail!("student {student_id} is not on the roster of class {class_id}");
            }
        }
        print!("{}", render_roster(&page));
        page.submit_event()
            .map_err(|err| anyhow!("{err}; pass --mark <id>=<status> or --default <status>"))?
    };

    let submitted = controller.on_submit(&view, &mut event).await;
    let page = view.lock().await;
    let message = page.message().unwrap_or_default().to_string();
    match submitted {
        Ok(_) => {
            println!("{message}");
            Ok(())
        }
        Err(_) => bail!(message),
    }
}
