use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{expand_command_abbrev, known_command_names};
use crate::config::Config;

/// Global flags. Everything after them is the daybook command and its
/// arguments, handled by [`Invocation::parse`].
#[derive(Parser, Debug, Clone)]
#[command(
    name = "daybook",
    version,
    about = "Daybook: calendar tasks and daily spending in one place",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (-q errors and warnings, -qq errors only).
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Override one daybookrc setting, e.g. `--rc color=off`.
    #[arg(long = "rc", value_name = "KEY=VALUE", value_parser = parse_setting, action = ArgAction::Append)]
    pub settings: Vec<(String, String)>,

    /// Read this rc file instead of `$DAYBOOKRC` or `~/.daybookrc`.
    #[arg(long = "daybookrc", value_name = "PATH")]
    pub daybookrc: Option<PathBuf>,

    /// Keep tasks, expenses and the budget in this directory.
    #[arg(long = "data", value_name = "DIR")]
    pub data: Option<PathBuf>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got: {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in: {raw}"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Default log filter for the -v/-q counts; `RUST_LOG` still wins.
fn default_log_level(verbose: u8, quiet: u8) -> &'static str {
    match (verbose, quiet) {
        (_, q) if q >= 2 => "error",
        (_, 1) => "warn",
        (0, _) => "warn",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let level = default_log_level(verbose, quiet);
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .map_err(|e| anyhow!("invalid RUST_LOG {directives:?}: {e}"))?,
        _ => EnvFilter::new(level),
    };

    let stderr_is_tty = std::io::stderr().is_terminal();
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(stderr_is_tty)
        .with_target(verbose >= 2)
        .try_init()
    {
        debug!(error = %err, "tracing subscriber already installed");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Resolves the command word (or `default.command` when there is none).
    /// Any unique prefix of a command name is accepted.
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let mut tokens = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned());

        let Some(head) = tokens.next() else {
            debug!(command = %cfg.default_command, "no explicit command, using default");
            return Ok(Self {
                command: cfg.default_command.clone(),
                args: vec![],
            });
        };

        let known = known_command_names();
        let command = expand_command_abbrev(&head, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {head}"))?;
        debug!(token = %head, expanded = %command, "resolved command token");

        Ok(Self {
            command: command.to_string(),
            args: tokens.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn global_flags_stop_at_the_command() {
        let cli = GlobalCli::parse_from(os(&[
            "daybook", "-vv", "--rc", "color=off", "--data", "/tmp/db", "spend", "12", "Food", "-v",
        ]));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings, vec![("color".to_string(), "off".to_string())]);
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/db")));
        assert_eq!(cli.rest, os(&["spend", "12", "Food", "-v"]));

        assert!(GlobalCli::try_parse_from(os(&["daybook", "--rc", "color"])).is_err());
    }

    #[test]
    fn log_level_follows_flag_counts() {
        assert_eq!(default_log_level(0, 0), "warn");
        assert_eq!(default_log_level(1, 0), "info");
        assert_eq!(default_log_level(2, 0), "debug");
        assert_eq!(default_log_level(5, 0), "trace");
        assert_eq!(default_log_level(3, 1), "warn");
        assert_eq!(default_log_level(0, 2), "error");
    }

    #[test]
    fn command_prefixes_expand() {
        let cfg = Config::default();
        let inv = Invocation::parse(&cfg, os(&["fin", "2024-04"])).expect("parse");
        assert_eq!(inv.command, "finance");
        assert_eq!(inv.args, vec!["2024-04".to_string()]);

        let inv = Invocation::parse(&cfg, vec![]).expect("parse");
        assert_eq!(inv.command, "day");

        assert!(Invocation::parse(&cfg, os(&["d"])).is_err());
        assert!(Invocation::parse(&cfg, os(&["frobnicate"])).is_err());
    }
}
