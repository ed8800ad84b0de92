use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "immaculater-fragments",
    version,
    about = "Renders Immaculater form fragments and page binding settings",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rcfile", global = true)]
    pub rcfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Escape text for embedding in markup.
    Escape { text: String },

    /// A one-button form posting to a servlet.
    ButtonForm {
        #[arg(long)]
        servlet: String,
        #[arg(long)]
        csrf: String,
        #[arg(long)]
        uid: Option<String>,
        #[arg(long, default_value = "")]
        hidden: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        label: Option<String>,
    },

    /// A single dropdown option.
    #[command(name = "option")]
    SelectOption {
        #[arg(long)]
        value: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        selected: Option<String>,
    },

    /// The view filter form.
    ViewFilterForm {
        #[arg(long)]
        servlet: String,
        #[arg(long)]
        csrf: String,
        #[arg(long)]
        uid: Option<String>,
        #[arg(long)]
        selected: Option<String>,
    },

    /// List the known view filters.
    ViewFilters {
        #[arg(long)]
        json: bool,
    },

    /// Show the effective page binding settings.
    Bindings {
        #[arg(long)]
        json: bool,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Global flags whose value is the next argument.
const GLOBAL_VALUE_FLAGS: [&str; 2] = ["--rc", "--rcfile"];

/// Pulls positional `rc.KEY=VALUE` / `rc.KEY:VALUE` overrides out of the
/// argument list before clap sees it. Only tokens ahead of the subcommand
/// count; everything after it belongs to the subcommand, free text included.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    let mut before_subcommand = true;
    let mut flag_value_next = false;
    for arg in iter {
        let s = arg.to_string_lossy().into_owned();
        if flag_value_next {
            flag_value_next = false;
        } else if before_subcommand {
            if let Some((k, v)) = parse_rc_token(&s) {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }

            if GLOBAL_VALUE_FLAGS.contains(&s.as_str()) {
                flag_value_next = true;
            } else if s == "--" || !s.starts_with('-') {
                before_subcommand = false;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

fn parse_rc_token(s: &str) -> Option<(String, String)> {
    let rest = s.strip_prefix("rc.")?;
    let (k, v) = rest.split_once('=').or_else(|| rest.split_once(':'))?;
    Some((format!("rc.{k}"), v.to_string()))
}
