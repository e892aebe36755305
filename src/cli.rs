use crate::checker::{check_tokens, Checker, CompareOptions};
use crate::config::types::Outcome;
use crate::valuer::{run_valuer, IcpcValuer, PartialValuer, ValuerResponse};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::io::{self, Write};

/// Built-in executables shipped with the runtime
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tool {
    CmpTokens,
    ValIcpc,
    ValPartial,
    ValuerTranscript,
}

impl Tool {
    pub fn binary_name(self) -> &'static str {
        match self {
            Self::CmpTokens => "cmp-tokens",
            Self::ValIcpc => "val-icpc",
            Self::ValPartial => "val-partial",
            Self::ValuerTranscript => "valuer-transcript",
        }
    }
}

/// Token-by-token checker
#[derive(Parser, Debug)]
#[command(name = "cmp-tokens", version, about, long_about = None)]
struct CmpTokensArgs {
    /// Compare decimal tokens with this tolerance
    #[arg(long, allow_hyphen_values = true)]
    epsilon: Option<String>,
    /// Compare tokens ignoring ASCII case
    #[arg(long)]
    ignore_case: bool,
}

/// Built-in valuer; speaks the control protocol on stdin/stdout
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ValuerArgs {}

/// Decode a recorded valuer output stream
#[derive(Parser, Debug)]
#[command(name = "valuer-transcript", version, about, long_about = None)]
struct TranscriptArgs {
    /// Print one JSON object per response
    #[arg(long)]
    json: bool,
}

/// Route `log` output to stderr; stdout may be a protocol channel.
///
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .try_init();
}

pub fn run(tool: Tool) -> Result<()> {
    init_logging();
    log::debug!("starting {}", tool.binary_name());
    match tool {
        Tool::CmpTokens => run_cmp_tokens(),
        Tool::ValIcpc => {
            ValuerArgs::parse();
            run_valuer(IcpcValuer::new());
            Ok(())
        }
        Tool::ValPartial => {
            ValuerArgs::parse();
            run_valuer(PartialValuer::new());
            Ok(())
        }
        Tool::ValuerTranscript => run_transcript(TranscriptArgs::parse()),
    }
}

fn run_cmp_tokens() -> Result<()> {
    let parsed = match CmpTokensArgs::try_parse() {
        Ok(args) => Ok(args),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => Err(e),
    };

    // Bad arguments are a problem package bug and must still yield a verdict.
    let mut checker = Checker::init();
    let opts = match parsed.map_err(|e| e.to_string()).and_then(|args| compare_options(&args)) {
        Ok(opts) => opts,
        Err(message) => {
            log::error!("{}", message);
            checker.comment(format!("fatal: {}", message.trim_end()));
            checker.finish(Outcome::CheckerLogicError);
        }
    };
    checker.run(|c| check_tokens(c, &opts))
}

fn compare_options(args: &CmpTokensArgs) -> std::result::Result<CompareOptions, String> {
    let epsilon = match &args.epsilon {
        None => None,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
            _ => return Err(format!("{} is not valid epsilon value", raw)),
        },
    };
    Ok(CompareOptions {
        epsilon,
        ignore_case: args.ignore_case,
    })
}

fn run_transcript(args: TranscriptArgs) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    while let Some(response) =
        ValuerResponse::read_from(&mut input).with_context(|| format!("response #{}", count + 1))?
    {
        if args.json {
            writeln!(out, "{}", serde_json::to_string(&response)?)?;
        } else {
            writeln!(out, "{:?}", response)?;
        }
        count += 1;
    }
    log::info!("decoded {} responses", count);
    Ok(())
}
