pub mod agenda;
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datekey;
pub mod interval;
pub mod model;
pub mod ordering;
pub mod render;
pub mod schedule;
pub mod store;
pub mod visibility;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daybook"
  );

  let mut cfg = config::Config::load(
    cli.daybookrc.as_deref()
  )?;
  cfg.apply_overrides(cli.settings)?;
  debug!(?cfg, "effective configuration");

  let data_dir = cfg
    .data_dir(cli.data.as_deref())
    .context(
      "failed to resolve data \
       directory"
    )?;

  let mut store =
    store::JsonlStore::open(&data_dir)
      .with_context(|| {
        format!(
          "failed to open document \
           store at {}",
          data_dir.display()
        )
      })?;

  let mut renderer =
    render::Renderer::new(&cfg);
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &mut store,
    &cfg,
    &mut renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
