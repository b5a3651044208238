// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface.
//!
//! | Command    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `generate` | run a round and commit it to the output directory        |
//! | `check`    | run a round and report diagnostics, writing nothing      |
//!
//! # Exit Codes
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | `0`  | no error diagnostics                                |
//! | `1`  | at least one error diagnostic                       |
//! | `2`  | I/O or configuration failure, nothing was committed |
//!
//! Command functions return [`ForgeError`] instead of exiting; only
//! [`run`] maps outcomes to an [`ExitStatus`].

use std::{io::Write, path::PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::{
    config::{DEFAULT_FILE, ForgeConfig},
    error::ForgeError,
    metamodel::NoMetamodels,
    pipeline::{self, RoundOutcome},
    round::Round,
    writer
};

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub u8);

impl ExitStatus {
    /// Round finished without error diagnostics.
    pub const SUCCESS: Self = Self(0);
    /// Round reported error diagnostics.
    pub const DIAGNOSTICS: Self = Self(1);
    /// Round could not run or could not be committed.
    pub const FAILURE: Self = Self(2);
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        Self::from(status.0)
    }
}

/// Build-time generator of repositories, filters, services, controllers
/// and config binders from annotated Rust entities.
#[derive(Debug, Parser)]
#[command(name = "entity-forge", version, about, long_about = None)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate code and commit it to the output directory.
    Generate(RoundArgs),
    /// Report diagnostics without writing anything.
    Check(RoundArgs)
}

/// Inputs of one round.
#[derive(Debug, Clone, Args)]
pub struct RoundArgs {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(long, short, value_name = "FILE", default_value = DEFAULT_FILE)]
    pub config: PathBuf,

    /// Crate source root.
    #[arg(long, value_name = "DIR", default_value = "src")]
    pub src: PathBuf,

    /// Output directory, overriding `output.dir`.
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// `key=value` configuration option, e.g. `service.module=svc`.
    #[arg(long = "option", short = 'o', value_name = "KEY=VALUE")]
    pub options: Vec<String>
}

impl RoundArgs {
    fn load_config(&self) -> Result<ForgeConfig, ForgeError> {
        let mut config = ForgeConfig::load_or_default(&self.config)?;
        config.apply_options(&self.options)?;
        if let Some(out) = &self.out {
            config.output.dir = Some(out.clone());
        }
        Ok(config)
    }
}

/// Execute a parsed command line, printing diagnostics to `stderr`.
pub fn run(cli: Cli, stderr: &mut impl Write) -> ExitStatus {
    let result = match cli.command {
        Command::Generate(args) => generate(&args, stderr),
        Command::Check(args) => check(&args, stderr)
    };

    match result {
        Ok(outcome) if outcome.has_errors() => ExitStatus::DIAGNOSTICS,
        Ok(_) => ExitStatus::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "round aborted");
            let _ = writeln!(stderr, "error: {err}");
            ExitStatus::FAILURE
        }
    }
}

fn round(args: &RoundArgs, stderr: &mut impl Write) -> Result<(RoundOutcome, ForgeConfig), ForgeError> {
    let config = args.load_config()?;
    let round = Round::discover(&args.src, config.clone())?;
    let outcome = pipeline::run(&round, &NoMetamodels);
    report(&outcome, stderr);
    Ok((outcome, config))
}

fn generate(args: &RoundArgs, stderr: &mut impl Write) -> Result<RoundOutcome, ForgeError> {
    let (outcome, config) = round(args, stderr)?;
    let report = writer::commit(&outcome, &config.output_dir())?;
    tracing::info!(
        written = report.written.len(),
        removed = report.removed.len(),
        "generation finished"
    );
    Ok(outcome)
}

fn check(args: &RoundArgs, stderr: &mut impl Write) -> Result<RoundOutcome, ForgeError> {
    round(args, stderr).map(|(outcome, _)| outcome)
}

/// Print every diagnostic, one per line, followed by a summary.
pub fn report(outcome: &RoundOutcome, stderr: &mut impl Write) {
    for diagnostic in &outcome.diagnostics {
        let _ = writeln!(stderr, "{diagnostic}");
    }
    let errors = outcome.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        let _ = writeln!(
            stderr,
            "{errors} error(s); {} declaration(s) left unchanged",
            outcome.failed.len()
        );
    }
}
