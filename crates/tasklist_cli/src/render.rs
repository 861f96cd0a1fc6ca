use tabled::settings::Style;
use tabled::{Table, Tabled};
use tasklist_core::config::Palette;
use tasklist_core::error::AppError;
use tasklist_core::item::{TaskItem, items};
use tasklist_core::model::Task;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

#[derive(Tabled)]
struct TaskRow {
    id: String,
    done: &'static str,
    description: String,
    date: String,
}

fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parses the estimated date given on the command line. Accepts RFC 3339 or
/// a bare `YYYY-MM-DD`, which means local midnight. Missing means `now`.
pub fn parse_when(raw: Option<&str>, now: OffsetDateTime) -> Result<OffsetDateTime, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(now);
    };

    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed);
    }

    let date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("date must be RFC3339 or YYYY-MM-DD"))?;
    Ok(date.midnight().assume_offset(local_offset()))
}

fn row(item: TaskItem<'_>) -> Result<TaskRow, AppError> {
    Ok(TaskRow {
        id: item.id().to_string(),
        done: if item.is_done() { "[x]" } else { "[ ]" },
        // One line per row keeps the painting in `tasks_table` aligned.
        description: item.description().replace(['\r', '\n'], " "),
        date: item.format_date()?,
    })
}

/// Renders the visible tasks as a table, painting each row by done state.
pub fn tasks_table(tasks: &[Task], palette: &Palette) -> Result<String, AppError> {
    let rows = items(tasks).map(row).collect::<Result<Vec<_>, _>>()?;
    let rendered = Table::new(rows).with(Style::psql()).to_string();

    // psql style: header line, separator line, then one line per row.
    let lines = rendered
        .lines()
        .enumerate()
        .map(|(index, line)| match index.checked_sub(2).and_then(|position| tasks.get(position)) {
            Some(task) => palette.paint(line, task.is_done()),
            None => line.to_string(),
        })
        .collect::<Vec<_>>();

    Ok(lines.join("\n"))
}

pub fn list_plain(tasks: &[Task], show_completed: bool, palette: &Palette) -> Result<String, AppError> {
    let mut out = if tasks.is_empty() {
        "No tasks.".to_string()
    } else {
        tasks_table(tasks, palette)?
    };
    if !show_completed {
        out.push_str("\n(completed tasks hidden)");
    }
    Ok(out)
}

pub fn list_json(tasks: &[Task], show_completed: bool) -> Result<serde_json::Value, AppError> {
    Ok(serde_json::json!({
        "showCompleted": show_completed,
        "tasks": serde_json::to_value(tasks)?,
    }))
}

pub fn task_json(task: &Task) -> Result<serde_json::Value, AppError> {
    Ok(serde_json::to_value(task)?)
}
