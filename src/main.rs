//! # Studyust
//!
//! A terminal study tracker written in Rust. Studyust combines a fast CLI for quick entry with a TUI dashboard for following a study routine.
//!
//! ## Features
//!
//! *   **Subjects**: Subjects with topics and subtopics, hour targets and progress.
//! *   **Tasks**: Dated tasks per subject with a priority.
//! *   **Study Sessions**: A stopwatch that survives restarts and records sessions when stopped.
//! *   **Plans and Cycles**: Study plans over a date range and review cycles that time subjects one at a time.
//! *   **Dual Interface**:
//!     *   **CLI**: Scriptable and quick for single commands.
//!     *   **TUI**: Dashboard behind a login page.
//! *   **Data Persistence**: Everything is stored as one JSON snapshot in the XDG data directory.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! studyust
//! # or explicitly
//! studyust ui
//! ```
//!
//! #### TUI Key Bindings
//!
//! *   `1`-`6`: Dashboard, Subjects, Tasks, Plans, Cycles, Study Session
//! *   `o`: Logout
//! *   `q`: Quit
//! *   `s`: Start a session on the selected subject
//! *   `p` / `r` / `x`: Pause, resume and stop the timer
//! *   `Space` / `d`: Toggle or delete the selected task
//! *   `Enter`: Activate the selected plan, or start the selected cycle subject
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! studyust subject add "Calculus" --hours 40
//! studyust task add <SUBJECT_ID> "Problem set 3" --due 2025-04-01 --priority high
//! studyust session start <SUBJECT_ID> --title "Integrals"
//! studyust session stop --notes "Chapter 5 done"
//! studyust stats
//! ```
//!
//! ## Data Storage
//!
//! Data is saved in your local data directory:
//! *   Linux: `~/.local/share/studyust/study-data.json`
//! *   macOS: `~/Library/Application Support/studyust/study-data.json`
//! *   Windows: `%APPDATA%\studyust\study-data.json`
//!
//! Set `STUDYUST_DATA_DIR` to override the directory, `STUDYUST_API_URL` to log in
//! against a remote backend and `STUDYUST_LOG` to change the log filter.

use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use studyust::auth::AuthSession;
use studyust::commands::*;
use studyust::config::Config;
use studyust::logging;
use studyust::models::{PlanStatus, Priority};
use studyust::store::StudyStore;
use studyust::timer::SystemClock;
use studyust::tui::{app::App, run_tui};

#[derive(Parser)]
#[command(name = "studyust")]
#[command(about = "Terminal study tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage subjects
    Subject {
        #[command(subcommand)]
        command: SubjectCommands,
    },
    /// Manage the topics of a subject
    Topic {
        #[command(subcommand)]
        command: TopicCommands,
    },
    /// Manage the subtopics of a topic
    Subtopic {
        #[command(subcommand)]
        command: SubtopicCommands,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Time and record study sessions
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Manage study plans
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage study cycles
    Cycle {
        #[command(subcommand)]
        command: CycleCommands,
    },
    /// Show study statistics
    Stats,
    /// Log in and remember the user
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the logged-in user
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List users known to the backend
    Users,
    /// Reset the database (delete all study data)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum SubjectCommands {
    /// Add a new subject
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Display color, e.g. #3f51b5
        #[arg(short, long)]
        color: Option<String>,
        /// Target study hours
        #[arg(short = 'H', long, default_value_t = 0.0)]
        hours: f64,
    },
    /// List subjects with progress
    List,
    /// Show a subject with its topics
    Show { id: String },
    /// Edit a subject
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short = 'H', long)]
        hours: Option<f64>,
    },
    /// Remove a subject with its tasks and sessions
    Remove { id: String },
}

#[derive(Subcommand)]
enum TopicCommands {
    /// Add a topic to a subject
    Add {
        subject: String,
        name: String,
        /// Estimated hours
        #[arg(short = 'H', long, default_value_t = 0.0)]
        hours: f64,
    },
    /// Toggle a topic's completion
    Toggle { subject: String, topic: String },
    /// Remove a topic
    Remove { subject: String, topic: String },
}

#[derive(Subcommand)]
enum SubtopicCommands {
    /// Add a subtopic to a topic
    Add { subject: String, topic: String, name: String },
    /// Toggle a subtopic's completion
    Toggle { subject: String, topic: String, subtopic: String },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a new task
    Add {
        subject: String,
        /// Task title (quoted if it has spaces)
        title: String,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        /// low, medium or high
        #[arg(short, long, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks by due date
    List {
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
        /// Only tasks of this subject
        #[arg(short, long)]
        subject: Option<String>,
    },
    /// Toggle a task's completion
    Complete { id: String },
    /// Edit a task
    Edit {
        id: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        subject: Option<String>,
        #[arg(short, long)]
        due: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a task
    Remove { id: String },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Start the stopwatch on a subject
    Start {
        subject: String,
        /// Topic of the subject to count the time toward
        #[arg(long)]
        topic: Option<String>,
        #[arg(short, long, default_value = "Study session")]
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Pause the stopwatch
    Pause,
    /// Resume the stopwatch
    Resume,
    /// Stop the stopwatch and record the session
    Stop {
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Show the stopwatch
    Status,
    /// Record a session without the stopwatch
    Log {
        subject: String,
        minutes: u32,
        /// Topic of the subject to count the time toward
        #[arg(long)]
        topic: Option<String>,
        #[arg(short, long)]
        title: Option<String>,
        /// Date in YYYY-MM-DD, today when omitted
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List recorded sessions
    List {
        #[arg(short, long)]
        subject: Option<String>,
    },
    /// Remove a recorded session
    Remove { id: String },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Add a study plan
    Add {
        name: String,
        /// Start date in YYYY-MM-DD
        #[arg(short, long)]
        start: String,
        /// End date in YYYY-MM-DD
        #[arg(short, long)]
        end: String,
        /// Subject ids covered by the plan
        #[arg(long = "subject")]
        subjects: Vec<String>,
        #[arg(long, default_value_t = 2.0)]
        daily: f64,
        #[arg(long, default_value_t = 10.0)]
        weekly: f64,
        /// draft, active, paused or completed
        #[arg(long, default_value_t = PlanStatus::Draft)]
        status: PlanStatus,
        #[arg(short, long, default_value_t = Priority::Medium)]
        priority: Priority,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List study plans
    List,
    /// Edit a study plan
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        start: Option<String>,
        #[arg(short, long)]
        end: Option<String>,
        /// Replaces the plan's subjects
        #[arg(long = "subject")]
        subjects: Option<Vec<String>>,
        #[arg(long)]
        daily: Option<f64>,
        #[arg(long)]
        weekly: Option<f64>,
        #[arg(long)]
        status: Option<PlanStatus>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// Make a plan the active one
    Activate { id: String },
    /// Remove a study plan
    Remove { id: String },
}

#[derive(Subcommand)]
enum CycleCommands {
    /// Add a study cycle
    Add {
        name: String,
        /// Start date in YYYY-MM-DD, today when omitted
        #[arg(short, long)]
        start: Option<String>,
        /// End date in YYYY-MM-DD, two weeks after start when omitted
        #[arg(short, long)]
        end: Option<String>,
        /// Plan the cycle belongs to
        #[arg(short, long)]
        plan: Option<String>,
        #[arg(short, long = "objective")]
        objectives: Vec<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List study cycles
    List,
    /// Show a cycle with its subjects
    Show { id: String },
    /// Edit a study cycle
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        status: Option<PlanStatus>,
        #[arg(short, long)]
        end: Option<String>,
    },
    /// Make a cycle the active one
    Activate { id: String },
    /// Remove a study cycle
    Remove { id: String },
    /// Add a subject to a cycle
    AddSubject {
        cycle: String,
        subject: String,
        /// Planned minutes
        #[arg(short, long, default_value_t = 60)]
        minutes: u32,
    },
    /// Remove a subject from a cycle
    RemoveSubject { cycle: String, cycle_subject: String },
    /// Start the stopwatch on a cycle subject
    Start { cycle: String, cycle_subject: String },
}

fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    let ui_mode = matches!(cli.command, Some(Commands::Ui) | None);
    if ui_mode {
        // the terminal belongs to the dashboard, so logs go to a file
        if let Err(e) = logging::init_file(&config.log_filter, &config.log_file()) {
            eprintln!("Could not open log file: {}", e);
        }
    } else {
        logging::init_stderr(&config.log_filter);
    }

    let mut store = StudyStore::open(Box::new(config.file_store()), Arc::new(SystemClock));
    let mut session = AuthSession::restore(Box::new(config.file_store()));
    let provider = config.auth_provider();

    match cli.command {
        Some(Commands::Subject { command }) => match command {
            SubjectCommands::Add { name, description, color, hours } => cmd_subject_add(&mut store, name, description, color, hours),
            SubjectCommands::List => cmd_subject_list(&store),
            SubjectCommands::Show { id } => cmd_subject_show(&store, &id),
            SubjectCommands::Edit { id, name, description, color, hours } => cmd_subject_edit(&mut store, &id, name, description, color, hours),
            SubjectCommands::Remove { id } => cmd_subject_remove(&mut store, &id),
        },
        Some(Commands::Topic { command }) => match command {
            TopicCommands::Add { subject, name, hours } => cmd_topic_add(&mut store, &subject, name, hours),
            TopicCommands::Toggle { subject, topic } => cmd_topic_toggle(&mut store, &subject, &topic),
            TopicCommands::Remove { subject, topic } => cmd_topic_remove(&mut store, &subject, &topic),
        },
        Some(Commands::Subtopic { command }) => match command {
            SubtopicCommands::Add { subject, topic, name } => cmd_subtopic_add(&mut store, &subject, &topic, name),
            SubtopicCommands::Toggle { subject, topic, subtopic } => cmd_subtopic_toggle(&mut store, &subject, &topic, &subtopic),
        },
        Some(Commands::Task { command }) => match command {
            TaskCommands::Add { subject, title, due, priority, description } => cmd_task_add(&mut store, subject, title, due, priority, description),
            TaskCommands::List { all, subject } => cmd_task_list(&store, all, subject),
            TaskCommands::Complete { id } => cmd_task_toggle(&mut store, &id),
            TaskCommands::Edit { id, title, subject, due, priority, description } => cmd_task_edit(&mut store, &id, title, subject, due, priority, description),
            TaskCommands::Remove { id } => cmd_task_remove(&mut store, &id),
        },
        Some(Commands::Session { command }) => match command {
            SessionCommands::Start { subject, topic, title, description } => cmd_session_start(&mut store, &subject, topic, title, description),
            SessionCommands::Pause => cmd_timer_pause(&mut store),
            SessionCommands::Resume => cmd_timer_resume(&mut store),
            SessionCommands::Stop { notes } => cmd_timer_stop(&mut store, notes),
            SessionCommands::Status => cmd_timer_status(&store),
            SessionCommands::Log { subject, minutes, topic, title, date, notes } => cmd_session_log(&mut store, subject, topic, minutes, title, date, notes),
            SessionCommands::List { subject } => cmd_session_list(&store, subject),
            SessionCommands::Remove { id } => cmd_session_remove(&mut store, &id),
        },
        Some(Commands::Plan { command }) => match command {
            PlanCommands::Add { name, start, end, subjects, daily, weekly, status, priority, description } => {
                cmd_plan_add(&mut store, name, start, end, subjects, daily, weekly, status, priority, description)
            }
            PlanCommands::List => cmd_plan_list(&store),
            PlanCommands::Edit { id, name, start, end, subjects, daily, weekly, status, priority } => {
                cmd_plan_edit(&mut store, &id, name, start, end, subjects, daily, weekly, status, priority)
            }
            PlanCommands::Activate { id } => cmd_plan_activate(&mut store, &id),
            PlanCommands::Remove { id } => cmd_plan_remove(&mut store, &id),
        },
        Some(Commands::Cycle { command }) => match command {
            CycleCommands::Add { name, start, end, plan, objectives, description } => cmd_cycle_add(&mut store, name, start, end, plan, objectives, description),
            CycleCommands::List => cmd_cycle_list(&store),
            CycleCommands::Show { id } => cmd_cycle_show(&store, &id),
            CycleCommands::Edit { id, name, status, end } => cmd_cycle_edit(&mut store, &id, name, status, end),
            CycleCommands::Activate { id } => cmd_cycle_activate(&mut store, &id),
            CycleCommands::Remove { id } => cmd_cycle_remove(&mut store, &id),
            CycleCommands::AddSubject { cycle, subject, minutes } => cmd_cycle_add_subject(&mut store, &cycle, &subject, minutes),
            CycleCommands::RemoveSubject { cycle, cycle_subject } => cmd_cycle_remove_subject(&mut store, &cycle, &cycle_subject),
            CycleCommands::Start { cycle, cycle_subject } => cmd_cycle_start(&mut store, &cycle, &cycle_subject),
        },
        Some(Commands::Stats) => cmd_stats(&store),
        Some(Commands::Login { email, password }) => cmd_login(&mut session, provider.as_ref(), email, password),
        Some(Commands::Logout) => cmd_logout(&mut session),
        Some(Commands::Whoami) => cmd_whoami(&session),
        Some(Commands::Users) => cmd_users(&session, provider.as_ref()),
        Some(Commands::Reset { force }) => cmd_reset(&mut store, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "studyust", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            let app = App::new(store, session, provider);
            if let Err(e) = run_tui(app) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
