use clap::{CommandFactory, Parser};
use flexi_logger::LoggerHandle;
use log::{info, warn};
use std::io::{self, BufRead};
use tasklist_cli::cli::{Cli, Command, ConfigOverrideTarget, parse_config_override};
use tasklist_cli::{logging, render};
use tasklist_core::config::{self, ConfigOverrides, Palette, merge_overrides, palette_for_theme};
use tasklist_core::error::AppError;
use tasklist_core::item::{AddTaskHandler, Gesture, TaskItem};
use tasklist_core::model::{Task, TaskDraft, TaskId};
use tasklist_core::storage::JsonFileStore;
use tasklist_core::store::TaskStore;
use time::OffsetDateTime;

struct Session {
    store: TaskStore,
    palette: Palette,
    json: bool,
    interactive: bool,
    pending_at: Option<OffsetDateTime>,
    _logger: Option<LoggerHandle>,
}

fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(parsed.value),
        }
    }
    Ok(overrides)
}

fn start_session(overrides: &ConfigOverrides, interactive: bool) -> Result<Session, AppError> {
    let loaded = config::load_config_with_fallback();
    let env_level = std::env::var(logging::LOG_ENV_VAR).ok();
    let level = logging::resolve_level(overrides, env_level.as_deref(), &loaded.config);
    let logger = match logging::init_logging(level) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("WARNING: logging disabled: {}", err);
            None
        }
    };

    if let Some(err) = loaded.error.as_ref() {
        warn!("event=config_load module=cli status=fallback error={err}");
    }
    let config = merge_overrides(&loaded.config, overrides);

    let storage = JsonFileStore::from_env()?;
    info!(
        "event=cli_start module=cli interactive={} store_dir={}",
        interactive,
        storage.dir().display()
    );
    let store = TaskStore::open(storage)?;

    Ok(Session {
        store,
        palette: palette_for_theme(config.theme.as_deref()),
        json: false,
        interactive,
        pending_at: None,
        _logger: logger,
    })
}

fn parse_id(raw: &str) -> Result<TaskId, AppError> {
    raw.parse()
        .map_err(|_| AppError::invalid_input(format!("id must be a number: {}", raw.trim())))
}

fn print_json(value: serde_json::Value) {
    println!("{}", value);
}

fn print_task_result(session: &Session, verb: &str, id: TaskId, task: Option<&Task>) -> Result<(), AppError> {
    if session.json {
        let value = match task {
            Some(task) => render::task_json(task)?,
            None => serde_json::Value::Null,
        };
        print_json(value);
        return Ok(());
    }

    match task {
        Some(task) => println!("{} task: {} ({})", verb, task.description, task.id),
        None => println!("No task with id {}", id),
    }
    Ok(())
}

fn add_from_form(session: &mut Session, description: Option<String>) -> Result<(), AppError> {
    let estimated_at = session
        .pending_at
        .unwrap_or_else(OffsetDateTime::now_utc);
    let task = session.store.on_save(TaskDraft {
        description,
        estimated_at,
    })?;
    session.pending_at = None;

    if session.json {
        print_json(render::task_json(&task)?);
    } else {
        println!("Added task: {} ({})", task.description, task.id);
    }
    Ok(())
}

fn cancel_add(session: &mut Session) {
    session.store.on_cancel();
    session.pending_at = None;
    if session.json {
        print_json(serde_json::json!({ "addTaskOpen": false }));
    } else {
        println!("Add task cancelled");
    }
}

fn run_command(session: &mut Session, command: Command) -> Result<(), AppError> {
    match command {
        Command::List => {
            let store = &session.store;
            if session.json {
                print_json(render::list_json(store.visible_tasks(), store.show_completed())?);
            } else {
                println!(
                    "{}",
                    render::list_plain(store.visible_tasks(), store.show_completed(), &session.palette)?
                );
            }
        }
        Command::Add { description, at } => {
            session.pending_at = Some(render::parse_when(at.as_deref(), OffsetDateTime::now_utc())?);
            if description.is_none() && session.interactive {
                session.store.open_add_task();
                println!("New task: type a description, or 'cancel'");
                return Ok(());
            }
            add_from_form(session, description)?;
        }
        Command::Toggle { id } => {
            let id = parse_id(&id)?;
            match session.store.state().find(id).cloned() {
                Some(task) => TaskItem::new(&task).dispatch(Gesture::Tap, &mut session.store),
                None => session.store.toggle_task(id),
            }

            let updated = session.store.state().find(id).cloned();
            let verb = match updated.as_ref() {
                Some(task) if task.is_done() => "Completed",
                _ => "Reopened",
            };
            print_task_result(session, verb, id, updated.as_ref())?;
        }
        Command::Delete { id, full_swipe } => {
            let id = parse_id(&id)?;
            let gesture = if full_swipe {
                Gesture::FullSwipe
            } else {
                Gesture::TrailingDelete
            };
            let removed = session.store.state().find(id).cloned();
            match removed.as_ref() {
                Some(task) => TaskItem::new(task).dispatch(gesture, &mut session.store),
                None => {
                    session.store.delete_task(id);
                }
            }
            print_task_result(session, "Deleted", id, removed.as_ref())?;
        }
        Command::Filter => {
            session.store.toggle_filter();
            let show_completed = session.store.show_completed();
            if session.json {
                print_json(serde_json::json!({ "showCompleted": show_completed }));
            } else if show_completed {
                println!("Showing completed tasks");
            } else {
                println!("Hiding completed tasks");
            }
        }
        Command::Cancel => cancel_add(session),
    }

    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

/// Splits an interactive line into arguments. Double quotes group words;
/// inside quotes `\"` and `\\` are escapes.
fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            '"' => in_quotes = !in_quotes,
            ch if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            ch => current.push(ch),
        }
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }
    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn handle_line(session: &mut Session, line: &str) -> Result<(), AppError> {
    if session.store.is_add_task_open() {
        if line.eq_ignore_ascii_case("cancel") {
            cancel_add(session);
            return Ok(());
        }
        return add_from_form(session, Some(line.to_string()));
    }

    let args = split_command_line(line)?;
    if args.is_empty() {
        return Ok(());
    }

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push("tasklist".to_string());
    argv.extend(args);

    let cli = Cli::try_parse_from(argv).map_err(normalize_parse_error)?;
    if !cli.config_override.is_empty() {
        return Err(AppError::invalid_input(
            "--config-override is only accepted on the command line",
        ));
    }
    session.json = cli.json;
    run_command(session, cli.command)
}

fn run_interactive() -> Result<(), AppError> {
    let mut session = start_session(&ConfigOverrides::default(), true)?;
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        if let Err(err) = handle_line(&mut session, line) {
            eprintln!("ERROR: {}", err);
        }
    }

    session.store.flush();
    Ok(())
}

fn run_once(cli: Cli) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override)?;
    let mut session = start_session(&overrides, false)?;
    session.json = cli.json;

    let result = run_command(&mut session, cli.command);
    session.store.flush();
    result
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_once(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
