//! `~/.daybookrc`: plain `key = value` lines, `#` starts a comment.
//! Four keys are understood: `data.location`, `default.command`, `color`
//! and `timezone`. Unknown keys are logged and ignored.

use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  warn
};

use crate::commands::known_command_names;

const RC_ENV_VAR: &str = "DAYBOOKRC";
const TIMEZONE_ENV_VAR: &str =
  "DAYBOOK_TIMEZONE";
const RC_FILE_NAME: &str = ".daybookrc";
const DATA_DIR_NAME: &str = ".daybook";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
enum Key {
  DataLocation,
  DefaultCommand,
  Color,
  Timezone
}

impl Key {
  fn parse(raw: &str) -> Option<Self> {
    match raw {
      | "data.location" => {
        Some(Self::DataLocation)
      }
      | "default.command" => {
        Some(Self::DefaultCommand)
      }
      | "color" => Some(Self::Color),
      | "timezone" => Some(Self::Timezone),
      | _ => None
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// `None` means `~/.daybook`.
  pub data_location:   Option<PathBuf>,
  pub default_command: String,
  pub color:           bool,
  pub timezone:        Tz,
  /// The rc file the values came from, if any.
  pub source:          Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_location:   None,
      default_command: "day".to_string(),
      color:           true,
      timezone:        chrono_tz::UTC,
      source:          None
    }
  }
}

impl Config {
  /// Reads the rc file named by `rc_path`, else `$DAYBOOKRC`, else
  /// `~/.daybookrc` when it exists. No file at all means defaults.
  #[tracing::instrument]
  pub fn load(
    rc_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match locate_rc_file(rc_path) {
      | Some(path) => {
        info!(rc = %path.display(), "loading daybookrc");
        let text =
          fs::read_to_string(&path)
            .with_context(|| {
              format!(
                "failed to read {}",
                path.display()
              )
            })?;
        cfg.apply_text(&text).with_context(
          || {
            format!(
              "invalid daybookrc {}",
              path.display()
            )
          }
        )?;
        cfg.source = Some(path);
      }
      | None => {
        debug!("no daybookrc; using defaults")
      }
    }

    Ok(cfg)
  }

  fn apply_text(
    &mut self,
    text: &str
  ) -> anyhow::Result<()> {
    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      let (key, value) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "line {}: expected key = \
             value, got: {raw_line}",
            idx + 1
          )
        })?;
      self
        .set(key.trim(), value.trim())
        .with_context(|| {
          format!("line {}", idx + 1)
        })?;
    }
    Ok(())
  }

  /// Applies `--rc key=value` pairs on top of the file.
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (key, value) in overrides {
      debug!(key = %key, value = %value, "applying override");
      self
        .set(&key, &value)
        .with_context(|| {
          format!("override {key}")
        })?;
    }
    Ok(())
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    let Some(known) = Key::parse(key)
    else {
      warn!(key, "ignoring unknown daybookrc key");
      return Ok(());
    };

    match known {
      | Key::DataLocation => {
        if value.is_empty() {
          return Err(anyhow!(
            "data.location cannot be \
             empty"
          ));
        }
        self.data_location = Some(
          expand_tilde(Path::new(value))
        );
      }
      | Key::DefaultCommand => {
        if !known_command_names()
          .iter()
          .any(|name| *name == value)
        {
          return Err(anyhow!(
            "default.command must be a \
             daybook command, got: \
             {value}"
          ));
        }
        self.default_command =
          value.to_string();
      }
      | Key::Color => {
        self.color = parse_switch(value)
          .ok_or_else(|| {
            anyhow!(
              "color must be on or off, \
               got: {value}"
            )
          })?;
      }
      | Key::Timezone => {
        self.timezone = value
          .parse::<Tz>()
          .map_err(|err| {
            anyhow!(
              "unknown timezone \
               {value}: {err}"
            )
          })?;
      }
    }
    Ok(())
  }

  /// Zone that decides what "today" is. `$DAYBOOK_TIMEZONE` beats the rc
  /// file; an unparseable variable is logged and skipped.
  pub fn timezone(&self) -> Tz {
    match std::env::var(TIMEZONE_ENV_VAR)
    {
      | Ok(raw) if !raw.trim().is_empty() => {
        match raw.trim().parse::<Tz>() {
          | Ok(tz) => tz,
          | Err(err) => {
            warn!(
              env = TIMEZONE_ENV_VAR,
              timezone = %raw,
              error = %err,
              "ignoring unknown timezone"
            );
            self.timezone
          }
        }
      }
      | _ => self.timezone
    }
  }

  /// Data directory from `override_dir`, then `data.location`, then
  /// `~/.daybook`. Created when missing.
  #[tracing::instrument(skip(self))]
  pub fn data_dir(
    &self,
    override_dir: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match override_dir
      .map(Path::to_path_buf)
      .or_else(|| {
        self.data_location.clone()
      }) {
      | Some(dir) => dir,
      | None => dirs::home_dir()
        .map(|home| {
          home.join(DATA_DIR_NAME)
        })
        .ok_or_else(|| {
          anyhow!(
            "cannot determine home \
             directory; set \
             data.location or --data"
          )
        })?
    };

    if !dir.exists() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }
    Ok(dir)
  }
}

fn locate_rc_file(
  explicit: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(expand_tilde(path));
  }
  if let Ok(raw) =
    std::env::var(RC_ENV_VAR)
    && !raw.trim().is_empty()
  {
    return Some(expand_tilde(
      Path::new(raw.trim())
    ));
  }
  dirs::home_dir()
    .map(|home| home.join(RC_FILE_NAME))
    .filter(|path| path.exists())
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_switch(
  raw: &str
) -> Option<bool> {
  match raw
    .to_ascii_lowercase()
    .as_str()
  {
    | "on" | "yes" | "true" | "1" => {
      Some(true)
    }
    | "off" | "no" | "false" | "0" => {
      Some(false)
    }
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::*;

  #[test]
  fn rc_file_sets_known_keys() {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("daybookrc");
    fs::write(
      &rc,
      "# personal setup\n\
       color = off  # no ansi\n\
       timezone = Europe/Lisbon\n\
       \n\
       data.location = /tmp/daybook-data\n\
       default.command = week\n\
       theme = dark\n"
    )
    .expect("write rc");

    let cfg = Config::load(Some(&rc))
      .expect("load config");
    assert!(!cfg.color);
    assert_eq!(
      cfg.timezone,
      chrono_tz::Europe::Lisbon
    );
    assert_eq!(
      cfg.data_location,
      Some(PathBuf::from(
        "/tmp/daybook-data"
      ))
    );
    assert_eq!(cfg.default_command, "week");
    assert_eq!(cfg.source, Some(rc));
  }

  #[test]
  fn bad_values_name_their_line() {
    let dir =
      tempdir().expect("tempdir");
    let rc = dir.path().join("bad.rc");

    fs::write(&rc, "color = on\njust words\n")
      .expect("write rc");
    let err = Config::load(Some(&rc))
      .expect_err("missing '='");
    assert!(format!("{err:#}").contains("line 2"));

    fs::write(&rc, "timezone = Mars/Olympus\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());

    fs::write(&rc, "default.command = frobnicate\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());

    fs::write(&rc, "color = sometimes\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn overrides_are_validated_like_the_file() {
    let mut cfg = Config::default();
    cfg
      .apply_overrides(vec![
        (
          "default.command".to_string(),
          "finance".to_string()
        ),
        (
          "timezone".to_string(),
          "Asia/Tokyo".to_string()
        ),
      ])
      .expect("valid overrides");
    assert_eq!(
      cfg.default_command,
      "finance"
    );
    assert_eq!(
      cfg.timezone,
      chrono_tz::Asia::Tokyo
    );

    assert!(
      cfg
        .apply_overrides(vec![(
          "color".to_string(),
          "purple".to_string()
        )])
        .is_err()
    );
  }

  #[test]
  fn data_dir_prefers_the_flag_and_creates_it() {
    let dir =
      tempdir().expect("tempdir");
    let mut cfg = Config::default();
    cfg.data_location =
      Some(dir.path().join("from-rc"));

    let flagged = dir.path().join("flag");
    assert_eq!(
      cfg
        .data_dir(Some(&flagged))
        .expect("data dir"),
      flagged
    );
    assert!(flagged.is_dir());

    let from_rc =
      cfg.data_dir(None).expect("data dir");
    assert_eq!(
      from_rc,
      dir.path().join("from-rc")
    );
    assert!(from_rc.is_dir());
  }
}
