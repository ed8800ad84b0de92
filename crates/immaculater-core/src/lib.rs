pub mod cli;
pub mod commands;
pub mod config;
pub mod escape;
pub mod fragments;
pub mod navigation;
pub mod pjax;
pub mod tooltip;
pub mod view_filter;

use std::ffi::OsString;

use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let pre = cli::preprocess_args(&raw_args)?;
    let cli = cli::GlobalCli::parse_from(pre.cleaned_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting immaculater-fragments"
    );
    debug!(?pre.rc_overrides, "preprocessed rc overrides");

    let mut cfg = config::Config::load(cli.rcfile.as_deref())?;
    cfg.apply_overrides(
        pre.rc_overrides.into_iter().chain(
            cli.rc_overrides
                .into_iter()
                .map(|kv| (kv.key, kv.value)),
        ),
    );

    let mut out = std::io::stdout().lock();
    commands::dispatch(&mut out, &cfg, cli.command)?;

    info!("done");
    Ok(())
}
