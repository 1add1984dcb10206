// NUHS Portal - teacher portal command-line front end
// Entry point and application setup

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use nuhs_portal::app::{default_data_dir, AppState};
use nuhs_portal::commands::{self, RoutineForm};
use nuhs_portal::database::{ClassRoutine, Language};
use nuhs_portal::services::{AiOutcome, AlarmEvent, ProfileUpdate, SignupRequest};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nuhs-portal")]
#[command(about = "Class routines with daily alarms, AI scanner and Q&A for NUHS teachers")]
#[command(version)]
struct Cli {
    /// Data directory (defaults to NUHS_PORTAL_DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version, data directory and session
    Info,
    /// Create the local teacher account
    Signup {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        subject: String,
        /// Exactly 6 characters
        #[arg(long)]
        password: String,
        /// Profile picture as a data URL
        #[arg(long)]
        picture: Option<String>,
    },
    Login {
        #[arg(long)]
        id: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and wipe all local data
    Logout {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Greeting, clock, next class and notebook
    Dashboard,
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Dashboard notebook
    Notes {
        #[command(subcommand)]
        action: NotesAction,
    },
    Lang {
        /// `en` or `bn`; omit to show the current language
        code: Option<String>,
    },
    Routine {
        #[command(subcommand)]
        action: RoutineAction,
    },
    /// Extract text from an image (data URL, or a file containing one)
    Scan { source: String },
    /// Ask the assistant a question
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Run the alarm loop; press Enter to dismiss a class-time alarm
    Watch,
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    /// Edit name, subject and profile notes; omitted fields keep their value
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Replace the profile picture with a data URL
    Picture { data_url: String },
}

#[derive(Subcommand)]
enum NotesAction {
    Show,
    Save { text: String },
}

#[derive(Subcommand)]
enum RoutineAction {
    List,
    /// Show the sections of each class
    Sections,
    Add {
        /// HH:MM, 24-hour
        #[arg(long)]
        time: String,
        #[arg(long = "class")]
        class_name: String,
        #[arg(long)]
        section: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        homework: Option<String>,
        /// Alarm sound reference
        #[arg(long)]
        music: Option<String>,
    },
    Toggle { id: String },
    Remove { id: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    /// Set the generative AI model
    Model { name: String },
    /// Set the alarm polling interval in milliseconds
    Tick { ms: u64 },
    /// Store the AI API key in the OS credential store
    ApiKey { key: String },
    /// Remove the stored AI API key
    ClearApiKey,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nuhs_portal=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Settings commands touching only the credential store need no state
    match &cli.command {
        Commands::Settings {
            action: SettingsAction::ApiKey { key },
        } => {
            commands::set_api_key(key)?;
            println!("API key stored.");
            return Ok(());
        }
        Commands::Settings {
            action: SettingsAction::ClearApiKey,
        } => {
            commands::clear_api_key()?;
            println!("API key removed.");
            return Ok(());
        }
        _ => {}
    }

    let state = AppState::initialize(data_dir)
        .await
        .context("Failed to initialize the portal")?;

    run(cli.command, state).await
}

async fn run(command: Commands, state: AppState) -> Result<()> {
    match command {
        Commands::Info => {
            let info = commands::get_app_info(&state).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Signup {
            id,
            name,
            subject,
            password,
            picture,
        } => {
            let user = commands::signup(
                &state,
                SignupRequest {
                    id,
                    name,
                    subject,
                    password,
                    profile_pic: picture,
                },
            )
            .await?;
            println!("Welcome, {} ({}).", user.name, user.id);
        }
        Commands::Login { id, password } => {
            let user = commands::login(&state, &id, &password).await?;
            println!("Signed in as {} ({}).", user.name, user.id);
        }
        Commands::Logout { yes } => {
            if !yes {
                bail!("Logging out wipes all local data. Re-run with --yes to confirm.");
            }
            commands::logout(&state).await?;
            println!("Logged out.");
        }
        Commands::Dashboard => {
            let dashboard = commands::dashboard(&state).await?;
            println!("{} | {}", dashboard.user.name, dashboard.user.subject);
            println!("Time: {}", dashboard.time);
            match &dashboard.next_class {
                Some(routine) => println!("Next class: {}", routine_line(routine)),
                None => println!("Next class: none scheduled for the rest of today"),
            }
            if !dashboard.notes.is_empty() {
                println!("\nNotebook:\n{}", dashboard.notes);
            }
        }
        Commands::Profile { action } => profile(action, &state).await?,
        Commands::Notes { action } => match action {
            NotesAction::Show => println!("{}", commands::get_notes(&state).await?),
            NotesAction::Save { text } => {
                commands::save_notes(&state, &text).await?;
                println!("Notebook saved.");
            }
        },
        Commands::Lang { code } => match code {
            Some(code) => {
                let language: Language = code.parse().map_err(anyhow::Error::msg)?;
                commands::set_language(&state, language).await?;
                println!("Language set to {}.", language);
            }
            None => println!("{}", commands::get_language(&state).await?),
        },
        Commands::Routine { action } => routine(action, &state).await?,
        Commands::Scan { source } => {
            let data_url = if source.trim_start().starts_with("data:") {
                source
            } else {
                tokio::fs::read_to_string(&source)
                    .await
                    .with_context(|| format!("Failed to read {}", source))?
            };
            print_outcome(commands::scan_image(&state, &data_url).await?)?;
        }
        Commands::Ask { question } => {
            match commands::ask_question(&state, &question.join(" ")).await? {
                Some(result) => print_outcome(result.outcome)?,
                None => println!("Nothing to ask."),
            }
        }
        Commands::Watch => watch(state).await?,
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                let settings = commands::get_settings(&state).await?;
                println!("{}", serde_json::to_string_pretty(&settings)?);
            }
            SettingsAction::Model { name } => {
                let ai = commands::set_ai_model(&state, &name).await?;
                println!("AI model set to {}.", ai.model);
            }
            SettingsAction::Tick { ms } => {
                let alarm = commands::set_tick_interval(&state, ms).await?;
                println!("Alarm tick interval: {:?}.", alarm.tick_interval());
            }
            // Handled before state initialization
            SettingsAction::ApiKey { .. } | SettingsAction::ClearApiKey => {}
        },
    }

    Ok(())
}

async fn profile(action: ProfileAction, state: &AppState) -> Result<()> {
    match action {
        ProfileAction::Show => {
            let user = commands::get_profile(state).await?;
            println!("ID:      {}", user.id);
            println!("Name:    {}", user.name);
            println!("Subject: {}", user.subject);
            if let Some(pic) = &user.profile_pic {
                println!("Picture: {}", abbreviate(pic, 60));
            }
            if !user.notes.is_empty() {
                println!("Notes:   {}", user.notes);
            }
        }
        ProfileAction::Edit {
            name,
            subject,
            notes,
        } => {
            let current = commands::get_profile(state).await?;
            let user = commands::update_profile(
                state,
                ProfileUpdate {
                    name: name.unwrap_or(current.name),
                    subject: subject.unwrap_or(current.subject),
                    notes: notes.unwrap_or(current.notes),
                    profile_pic: None,
                },
            )
            .await?;
            println!("Profile saved for {}.", user.id);
        }
        ProfileAction::Picture { data_url } => {
            commands::set_profile_pic(state, &data_url).await?;
            println!("Profile picture replaced.");
        }
    }
    Ok(())
}

async fn routine(action: RoutineAction, state: &AppState) -> Result<()> {
    match action {
        RoutineAction::List => {
            let routines = commands::list_routines(state).await?;
            if routines.is_empty() {
                println!("No classes scheduled.");
            }
            for routine in &routines {
                println!("{}  [{}]", routine_line(routine), routine.id);
                println!("    Homework: {}", routine.homework_or_default());
            }
        }
        RoutineAction::Sections => {
            for (class_name, sections) in commands::list_sections() {
                println!("Class {:<3} {}", class_name, sections.join(", "));
            }
        }
        RoutineAction::Add {
            time,
            class_name,
            section,
            subject,
            homework,
            music,
        } => {
            let routine = commands::add_routine(
                state,
                RoutineForm {
                    time,
                    class_name,
                    section,
                    subject,
                    homework,
                    alarm_music: music,
                },
            )
            .await?;
            println!("Added {}  [{}]", routine_line(&routine), routine.id);
        }
        RoutineAction::Toggle { id } => {
            let routine = commands::toggle_alarm(state, &id).await?;
            println!("{}", routine_line(&routine));
        }
        RoutineAction::Remove { id } => {
            let routine = commands::delete_routine(state, &id).await?;
            println!("Removed class {} {} at {}.", routine.class_name, routine.section, routine.time);
        }
    }
    Ok(())
}

/// Run the alarm scheduler until Ctrl+C
async fn watch(state: AppState) -> Result<()> {
    state.auth.require_user().await?;

    let mut events = state.alarms.subscribe().await;
    let scheduler = state.alarms.clone().start_scheduler();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    println!("Watching class routines. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(AlarmEvent::Fired(routine)) => print_overlay(&routine),
                Some(AlarmEvent::Dismissed(_)) => println!("Alarm dismissed."),
                None => break,
            },
            line = stdin.next_line(), if stdin_open => match line? {
                Some(_) => {
                    state.alarms.dismiss().await;
                }
                None => stdin_open = false,
            },
        }
    }

    scheduler.abort();
    Ok(())
}

fn print_overlay(routine: &ClassRoutine) {
    println!();
    println!("==================== CLASS TIME ====================");
    println!("  Class {} - {}", routine.class_name, routine.section);
    println!("  {}", routine.subject);
    println!("  Homework: \"{}\"", routine.homework_or_default());
    if let Some(music) = &routine.alarm_music {
        println!("  Sound: {}", music);
    }
    println!("  Press Enter to dismiss.");
    println!("====================================================");
}

fn print_outcome(outcome: AiOutcome) -> Result<()> {
    match outcome {
        AiOutcome::Success(text) => {
            println!("{}", text);
            Ok(())
        }
        AiOutcome::Failure(reason) => bail!(reason),
    }
}

fn routine_line(routine: &ClassRoutine) -> String {
    format!(
        "{}  Class {} {}  {}  (alarm {})",
        routine.time,
        routine.class_name,
        routine.section,
        routine.subject,
        if routine.alarm_active { "on" } else { "off" }
    )
}

fn abbreviate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}
