//! The `remedy` binary: audit-driven accessibility remediation for packaged
//! documents.
//!
//! Consumes pre-normalized issue JSON (the output of the external detector
//! adapters), builds a remediation plan, applies every auto-fixable task to
//! the archive, and writes the remediated package plus a JSON report.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use remedy_archive::Archive;
use remedy_model::{ClassifyConfig, Issue};
use remedy_patch::ChangeLog;
use remedy_planner::{run_auto_remediation, Plan, RemediationConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "remedy", version, about = "Accessibility remediation for EPUB packages")]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a remediation plan from detector output and print it as JSON
    Plan {
        /// Job identifier (part of every content-addressed task id)
        #[arg(long)]
        job: String,

        /// Path to the normalized issue list (JSON array)
        #[arg(long)]
        issues: PathBuf,

        /// Treat color-contrast issues as quickfix instead of auto
        #[arg(long)]
        gate_contrast: bool,
    },

    /// Apply every auto-fixable task to an archive
    Fix {
        /// Job identifier
        #[arg(long)]
        job: String,

        /// Path to the normalized issue list (JSON array)
        #[arg(long)]
        issues: PathBuf,

        /// The package to remediate
        #[arg(long)]
        epub: PathBuf,

        /// Where to write the remediated package (defaults to in place)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Where to write the JSON report (plan, outcome, change log)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Language inserted for a package missing one
        #[arg(long, default_value = "en")]
        language: String,

        /// Treat color-contrast issues as quickfix instead of auto
        #[arg(long)]
        gate_contrast: bool,
    },
}

fn load_issues(path: &PathBuf) -> Result<Vec<Issue>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading issues from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing issues from {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Plan {
            job,
            issues,
            gate_contrast,
        } => {
            let issues = load_issues(&issues)?;
            let classify_cfg = ClassifyConfig {
                contrast_auto_fix: !gate_contrast,
            };
            let plan = Plan::build(job, issues, &classify_cfg);
            if !plan.conservation.is_valid {
                for message in &plan.conservation.messages {
                    log::warn!("{message}");
                }
            }
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }

        Command::Fix {
            job,
            issues,
            epub,
            output,
            report,
            language,
            gate_contrast,
        } => {
            let issues = load_issues(&issues)?;
            let bytes =
                fs::read(&epub).with_context(|| format!("reading {}", epub.display()))?;
            let mut archive = Archive::from_bytes(&bytes)
                .with_context(|| format!("decoding {}", epub.display()))?;

            let classify_cfg = ClassifyConfig {
                contrast_auto_fix: !gate_contrast,
            };
            let cfg = RemediationConfig {
                classify: classify_cfg,
                default_language: language,
                ..RemediationConfig::default()
            };

            let mut plan = Plan::build(job, issues, &classify_cfg);
            let mut changelog = ChangeLog::new();
            let outcome = run_auto_remediation(&mut plan, &mut archive, &cfg, &mut changelog)?;
            log::info!(
                "Remediation finished: {} completed, {} failed, {} validator fix(es)",
                outcome.completed,
                outcome.failed,
                outcome.validator_fixes
            );

            let destination = output.unwrap_or(epub);
            fs::write(&destination, archive.to_bytes()?)
                .with_context(|| format!("writing {}", destination.display()))?;
            log::info!("Wrote remediated package to {}", destination.display());

            if let Some(report_path) = report {
                let payload = serde_json::json!({
                    "plan": plan,
                    "outcome": {
                        "completed": outcome.completed,
                        "failed": outcome.failed,
                        "validator_fixes": outcome.validator_fixes,
                        "validator_failures": outcome.validator_failures,
                    },
                    "changes": changelog.changes(None),
                });
                fs::write(&report_path, serde_json::to_vec_pretty(&payload)?)
                    .with_context(|| format!("writing {}", report_path.display()))?;
                log::info!("Wrote report to {}", report_path.display());
            }
        }
    }
    Ok(())
}
