//! LiftLog - Workout Tracker Client
//!
//! Command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use liftlog::exercises::{ExerciseId, LogId, Registration};
use liftlog::metrics::{format_diff, BoardView, ExerciseView};
use liftlog::session::{storage_from_settings, SessionEvent};
use liftlog::storage::config::{get_config_path, load_config, load_config_from, save_config_to};
use liftlog::{AppConfig, ExerciseBoard, HttpGateway, SessionStore, TrackerError};

const USAGE: &str = "\
liftlog [--config PATH] <command>

Commands:
  login USER PASS                      Log in and remember the session
  register USER PASS CONFIRM           Create an account
  logout                               Forget the session
  whoami                               Show the logged-in user
  board                                Exercises with latest total and diff
  logs EXERCISE_ID                     Sets of one exercise, grouped by day
  add-exercise NAME [DESCRIPTION]      Create an exercise
  edit-exercise ID NAME [DESCRIPTION]  Rename an exercise
  delete-exercise ID                   Delete an exercise and its logs
  log EXERCISE_ID [WEIGHT REPS]        Log a set (defaults to the last set)
  delete-log EXERCISE_ID LOG_ID        Delete a logged set
  init-config                          Write the default configuration file
";

#[derive(Debug)]
enum Command {
    Login { username: String, password: String },
    Register { username: String, password: String, confirm: String },
    Logout,
    Whoami,
    Board,
    Logs { exercise_id: ExerciseId },
    AddExercise { name: String, description: Option<String> },
    EditExercise { exercise_id: ExerciseId, name: String, description: Option<String> },
    DeleteExercise { exercise_id: ExerciseId },
    Log { exercise_id: ExerciseId, set: Option<(f64, i64)> },
    DeleteLog { exercise_id: ExerciseId, log_id: LogId },
    InitConfig,
    Help,
}

#[derive(Debug)]
struct Cli {
    config: Option<PathBuf>,
    command: Command,
}

type Board = ExerciseBoard<HttpGateway>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = parse_args(std::env::args().skip(1).collect()).map_err(anyhow::Error::msg)?;
    if matches!(cli.command, Command::Help) {
        print!("{}", USAGE);
        return Ok(());
    }
    if matches!(cli.command, Command::InitConfig) {
        return init_config(cli.config);
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("loading configuration")?;

    let session = Arc::new(SessionStore::open(storage_from_settings(&config.session)));
    let gateway = Arc::new(HttpGateway::from_settings(&config.api, session.clone())?);
    let board = ExerciseBoard::new(gateway.clone(), session.clone())
        .with_day_offset(config.aggregation.day_offset());

    let mut session_events = session.subscribe();
    let outcome = execute(cli.command, &gateway, &board, &session).await;

    let mut expired = false;
    while let Ok(event) = session_events.try_recv() {
        if event == SessionEvent::Expired {
            expired = true;
            eprintln!("Your session has expired. Please log in again with `liftlog login`.");
        }
    }

    if let Err(err) = outcome {
        if !(expired && err.requires_login()) {
            eprintln!("{}", err.user_message());
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn execute(
    command: Command,
    gateway: &HttpGateway,
    board: &Board,
    session: &SessionStore,
) -> Result<(), TrackerError> {
    match command {
        Command::Login { username, password } => {
            let credential = gateway.login(&username, &password).await?;
            println!("Logged in as {}", credential.username);
        }
        Command::Register {
            username,
            password,
            confirm,
        } => {
            let registration = Registration::new(&username, &password, &confirm)?;
            gateway
                .register(&registration)
                .await
                .map_err(TrackerError::registration)?;
            println!("Registered {}. You can now log in.", registration.username);
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => match session.current_credential() {
            Some(credential) => println!("{} (user {})", credential.username, credential.user_id),
            None => println!("Not logged in"),
        },
        Command::Board => {
            let view = board.refresh().await?;
            print_board(&view);
        }
        Command::Logs { exercise_id } => {
            let view = board.refresh().await?;
            match view.exercise(exercise_id) {
                Some(exercise) => print_logs(exercise),
                None => println!("No exercise with id {}", exercise_id),
            }
        }
        Command::AddExercise { name, description } => {
            mutate_then_show(board, board.add_exercise(&name, description.as_deref())).await?;
        }
        Command::EditExercise {
            exercise_id,
            name,
            description,
        } => {
            mutate_then_show(
                board,
                board.update_exercise(exercise_id, &name, description.as_deref()),
            )
            .await?;
        }
        Command::DeleteExercise { exercise_id } => {
            mutate_then_show(board, board.delete_exercise(exercise_id)).await?;
        }
        Command::Log { exercise_id, set } => {
            let (weight, reps) = match set {
                Some(set) => set,
                None => {
                    let view = board.refresh().await?;
                    let last = view
                        .exercise(exercise_id)
                        .and_then(ExerciseView::last_set)
                        .map(|last| (last.weight, i64::from(last.reps)));
                    match last {
                        Some(set) => set,
                        None => {
                            println!("No previous set to repeat; pass WEIGHT and REPS");
                            return Ok(());
                        }
                    }
                }
            };
            mutate_then_show(board, board.add_log(exercise_id, weight, reps)).await?;
        }
        Command::DeleteLog {
            exercise_id,
            log_id,
        } => {
            mutate_then_show(board, board.delete_log(exercise_id, log_id)).await?;
        }
        Command::InitConfig | Command::Help => print!("{}", USAGE),
    }

    Ok(())
}

fn init_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(get_config_path);
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    save_config_to(&AppConfig::default(), &path)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Run a mutation and, once its change signal arrives, refetch and print.
async fn mutate_then_show<F>(board: &Board, mutation: F) -> Result<(), TrackerError>
where
    F: std::future::Future<Output = Result<(), TrackerError>>,
{
    let mut changes = board.notifier().subscribe();
    mutation.await?;

    if changes.try_recv().is_ok() {
        let view = board.refresh().await?;
        print_board(&view);
    }
    Ok(())
}

fn print_board(view: &BoardView) {
    if view.is_empty() {
        println!("No exercises yet. Add one with `liftlog add-exercise NAME`.");
        return;
    }

    for exercise in &view.exercises {
        let mut line = format!(
            "#{} {} | Total: {} kg",
            exercise.exercise.id, exercise.exercise.name, exercise.metrics.total_load
        );
        if let Some(diff) = exercise.metrics.diff_percent {
            line.push_str(&format!(
                " | Diff: {} ({})",
                format_diff(diff),
                exercise.metrics.trend
            ));
        }
        println!("{}", line);
    }
}

fn print_logs(view: &ExerciseView) {
    println!("{}", view.exercise.name);
    if let Some(description) = &view.exercise.description {
        println!("  {}", description);
    }
    if view.buckets.is_empty() {
        println!("  No sets logged");
        return;
    }

    for bucket in &view.buckets {
        println!("{}  (total {} kg)", bucket.date_key(), bucket.total_load());
        for set in &bucket.sets {
            println!("  #{} {} kg x {}", set.id, set.weight, set.reps);
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Cli, String> {
    let mut config = None;
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                return Ok(Cli {
                    config,
                    command: Command::Help,
                })
            }
            "--config" => {
                i += 1;
                let path = args.get(i).ok_or("--config requires PATH")?;
                config = Some(PathBuf::from(path));
            }
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    let command = parse_command(&rest)?;
    Ok(Cli { config, command })
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some((name, params)) = args.split_first() else {
        return Ok(Command::Help);
    };
    let arg = |index: usize, what: &str| -> Result<String, String> {
        params
            .get(index)
            .cloned()
            .ok_or_else(|| format!("{} requires {}", name, what))
    };
    let id = |index: usize, what: &str| -> Result<i64, String> {
        arg(index, what)?
            .parse::<i64>()
            .map_err(|_| format!("{} must be a number", what))
    };

    let command = match name.as_str() {
        "login" => Command::Login {
            username: arg(0, "USER")?,
            password: arg(1, "PASS")?,
        },
        "register" => Command::Register {
            username: arg(0, "USER")?,
            password: arg(1, "PASS")?,
            confirm: arg(2, "CONFIRM")?,
        },
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "board" => Command::Board,
        "logs" => Command::Logs {
            exercise_id: id(0, "EXERCISE_ID")?,
        },
        "add-exercise" => Command::AddExercise {
            name: arg(0, "NAME")?,
            description: params.get(1).cloned(),
        },
        "edit-exercise" => Command::EditExercise {
            exercise_id: id(0, "ID")?,
            name: arg(1, "NAME")?,
            description: params.get(2).cloned(),
        },
        "delete-exercise" => Command::DeleteExercise {
            exercise_id: id(0, "ID")?,
        },
        "log" => {
            let exercise_id = id(0, "EXERCISE_ID")?;
            let set = match (params.get(1), params.get(2)) {
                (None, None) => None,
                (Some(weight), Some(reps)) => {
                    let weight = weight
                        .parse::<f64>()
                        .map_err(|_| "WEIGHT must be a number".to_string())?;
                    let reps = reps
                        .parse::<i64>()
                        .map_err(|_| "REPS must be a whole number".to_string())?;
                    Some((weight, reps))
                }
                _ => return Err("log takes both WEIGHT and REPS, or neither".to_string()),
            };
            Command::Log { exercise_id, set }
        }
        "delete-log" => Command::DeleteLog {
            exercise_id: id(0, "EXERCISE_ID")?,
            log_id: id(1, "LOG_ID")?,
        },
        "init-config" => Command::InitConfig,
        "help" => Command::Help,
        other => return Err(format!("unknown command: {}\n\n{}", other, USAGE)),
    };

    Ok(command)
}
