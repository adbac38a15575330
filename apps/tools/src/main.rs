use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use shared::domain::ClassId;
use storage::Storage;
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Administer the attendance database")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/attendance.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    CreateClass {
        name: String,
    },
    AddStudent {
        class_id: i64,
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    ListClasses,
    ListStudents {
        class_id: i64,
    },
    ShowAttendance {
        class_id: i64,
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::CreateClass { name } => {
            let class_id = storage.create_class(name.trim()).await?;
            info!(class_id = class_id.0, "class created");
            println!("created class_id={class_id}");
        }
        Command::AddStudent {
            class_id,
            name,
            email,
        } => {
            let class_id = ClassId(class_id);
            if !storage.class_exists(class_id).await? {
                bail!("class {class_id} does not exist");
            }
            let student_id = storage
                .add_student(class_id, name.trim(), email.as_deref())
                .await?;
            println!("created student_id={student_id}");
        }
        Command::ListClasses => {
            for class in storage.list_classes().await? {
                println!("{}\t{}", class.id, class.name);
            }
        }
        Command::ListStudents { class_id } => {
            for student in storage.list_students_for_class(ClassId(class_id)).await? {
                println!("{}\t{}", student.id, student.name);
            }
        }
        Command::ShowAttendance { class_id, date } => {
            for row in storage.attendance_for_date(ClassId(class_id), date).await? {
                println!("{}\t{}\t{}", row.student_id, row.student_name, row.status);
            }
        }
    }

    Ok(())
}
