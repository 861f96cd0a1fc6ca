use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List visible tasks
    ///
    /// Example: tasklist list
    List,
    /// Add a new task
    ///
    /// Example: tasklist add "Buy milk"
    /// Example: tasklist add "Buy milk" --at 2026-01-05
    /// Example: tasklist add "Buy milk" --at 2026-01-05T18:00:00-03:00
    Add {
        description: Option<String>,
        /// Estimated date (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long, value_name = "WHEN")]
        at: Option<String>,
    },
    /// Mark a task done, or pending again if it is already done
    ///
    /// Example: tasklist toggle 1
    Toggle {
        id: String,
    },
    /// Delete a task
    ///
    /// Example: tasklist delete 1
    /// Example: tasklist delete 1 --full-swipe
    Delete {
        id: String,
        /// Delete through a full swipe instead of the revealed button
        #[arg(long)]
        full_swipe: bool,
    },
    /// Show or hide completed tasks
    ///
    /// Example: tasklist filter
    Filter,
    /// Close the add-task prompt without saving
    ///
    /// Example: tasklist cancel
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let key = canonicalize_flag_name(key_raw)
        .ok_or_else(|| "override key cannot be empty".to_string())?;
    let value = value_raw.trim().to_string();

    let target = match key.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "log_level" | "log" => ConfigOverrideTarget::LogLevel,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let cleaned = name
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_");

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ConfigOverrideTarget, parse_config_override};
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Noir ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Noir");
    }

    #[test]
    fn parse_config_override_accepts_log_level_spellings() {
        for raw in ["log_level=debug", "Log-Level=debug", "log=debug"] {
            let parsed = parse_config_override(raw).unwrap();
            assert_eq!(parsed.target, ConfigOverrideTarget::LogLevel);
            assert_eq!(parsed.value, "debug");
        }
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_key() {
        let err = parse_config_override(" = noir").unwrap_err();
        assert!(err.contains("cannot be empty"));
    }

    #[test]
    fn delete_accepts_full_swipe_flag() {
        let cli = Cli::try_parse_from(["tasklist", "delete", "3", "--full-swipe"]).unwrap();

        match cli.command {
            Command::Delete { id, full_swipe } => {
                assert_eq!(id, "3");
                assert!(full_swipe);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn add_description_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["tasklist", "add"]).unwrap();

        match cli.command {
            Command::Add { description, at } => {
                assert!(description.is_none());
                assert!(at.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
