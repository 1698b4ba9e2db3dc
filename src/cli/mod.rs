//! Headless subcommands for scripting against the task service.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand};
use serde_json::json;
use tracing::error;

use crate::api::{ApiError, HttpTaskClient, TaskService};
use crate::types::{PendingUpload, Task, TaskDraft, TaskStatus};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Show(TaskShowArgs),
    Create(TaskCreateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    /// open, closed, or a concrete status (new, in_progress, done)
    #[arg(long, value_name = "STATE", default_value = "open")]
    pub state: String,

    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskShowArgs {
    #[arg(value_name = "ID")]
    pub id: i64,
}

#[derive(Debug, Clone, Args)]
pub struct TaskCreateArgs {
    #[arg(long, value_name = "TEXT")]
    pub title: String,

    #[arg(long, value_name = "TEXT")]
    pub description: String,

    #[arg(long, value_name = "PROJECT")]
    pub project: String,

    #[arg(long, value_name = "ORG")]
    pub organisation: String,

    #[arg(long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
}

pub async fn run(server_url: &str, command: RootCommand, json_output: bool, quiet: bool) -> i32 {
    let client = HttpTaskClient::new(server_url);
    let result = match command {
        RootCommand::Task { command } => match command {
            TaskCommand::List(args) => run_list(&client, args, json_output).await,
            TaskCommand::Show(args) => run_show(&client, args, json_output).await,
            TaskCommand::Create(args) => run_create(&client, args, json_output, quiet).await,
        },
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            error!(error = %err, "cli command failed");
            eprintln!("error: {err}");
            1
        }
    }
}

async fn run_list(
    client: &HttpTaskClient,
    args: TaskListArgs,
    json_output: bool,
) -> Result<(), ApiError> {
    let search = args.search.unwrap_or_default();
    let tasks = match args.state.trim().to_ascii_lowercase().as_str() {
        "open" => client.list_open(&search).await?,
        "closed" => client.list_closed(&search).await?,
        other => match TaskStatus::from_str(other) {
            Ok(status) => client.list_by_status(status, &search).await?,
            Err(()) => {
                return Err(ApiError::Validation(format!(
                    "unknown state '{other}' (expected open, closed, new, in_progress, or done)"
                )));
            }
        },
    };

    if json_output {
        let body = json!({ "schema": SCHEMA_VERSION, "tasks": tasks });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        for task in &tasks {
            println!(
                "{:<10} {:<12} {:<12} {}",
                task.reference(),
                task.status.as_str(),
                task.updated_at.format("%Y-%m-%d"),
                task.title
            );
        }
        if tasks.is_empty() {
            println!("no tasks");
        }
    }
    Ok(())
}

async fn run_show(
    client: &HttpTaskClient,
    args: TaskShowArgs,
    json_output: bool,
) -> Result<(), ApiError> {
    let task = client.get_task(args.id).await?;

    if json_output {
        let body = json!({ "schema": SCHEMA_VERSION, "task": task });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        print_task(&task);
    }
    Ok(())
}

async fn run_create(
    client: &HttpTaskClient,
    args: TaskCreateArgs,
    json_output: bool,
    quiet: bool,
) -> Result<(), ApiError> {
    let draft = TaskDraft {
        title: args.title.trim().to_string(),
        description: args.description.trim().to_string(),
        project: args.project.trim().to_string(),
        organisation: args.organisation.trim().to_string(),
    };
    if draft.title.is_empty()
        || draft.description.is_empty()
        || draft.project.is_empty()
        || draft.organisation.is_empty()
    {
        return Err(ApiError::Validation(
            "title, description, project, and organisation must be non-empty".to_string(),
        ));
    }

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file = PendingUpload::from_path(path).map_err(|source| ApiError::AttachmentRead {
            name: path.display().to_string(),
            source,
        })?;
        // duplicates by (name, size) are dropped, matching the interactive form
        if !files.iter().any(|staged: &PendingUpload| staged.same_identity(&file)) {
            files.push(file);
        }
    }

    let task = client.create_task(&draft).await?;
    if !quiet {
        println!("created task #{} ({})", task.id, task.reference());
    }

    match client.upload_attachments(task.id, &files).await {
        Ok(uploaded) => {
            if !quiet && !uploaded.is_empty() {
                println!("uploaded {} file(s)", uploaded.len());
            }
        }
        Err(err) => {
            // the task exists; report the partial failure distinctly
            return Err(ApiError::Validation(format!(
                "task #{} was created, but attachments were not uploaded: {err}",
                task.id
            )));
        }
    }

    if json_output {
        let task = client.get_task(task.id).await?;
        let body = json!({ "schema": SCHEMA_VERSION, "task": task });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!("{}  {}", task.reference(), task.title);
    println!(
        "status: {}  created: {}  updated: {}",
        task.status.as_str(),
        task.created_at.format("%Y-%m-%d %H:%M"),
        task.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("project: {}  organisation: {}", task.project, task.organisation);
    if !task.description.is_empty() {
        println!();
        println!("{}", task.description);
    }
    if !task.files.is_empty() {
        println!();
        println!("attachments:");
        for file in &task.files {
            println!(
                "  {} {} ({}) {}",
                file.kind().icon(),
                file.filename,
                crate::types::format_size(file.size),
                file.url
            );
        }
    }
}
