mod config;
mod edit_cmds;
mod inputs_cmd;
mod new_cmd;
mod question_cmd;
mod report_cmd;
mod resolve;
mod role;
mod validate_cmd;

#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use weft_core::document::PLACEHOLDER_NAME;

#[derive(Parser)]
#[command(name = "weft", about = "Maintain hierarchical workstream plan documents")]
struct Cli {
    /// Path to the plan file (overrides WEFT_PLAN env var and config)
    #[arg(long, global = true)]
    plan: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a weft config file
    Init {
        /// Default plan file path to record in the config
        #[arg(long)]
        default_plan: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create a fresh plan document
    New {
        /// Name of the workstream
        name: String,
        /// Output file path (defaults to the resolved plan path)
        #[arg(long)]
        output: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print a structural summary of the plan
    Report {
        /// Emit machine-readable JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Validate the plan (exits nonzero on errors)
    Validate {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Append a new stage to the plan
    AddStage {
        /// Stage name
        #[arg(default_value = PLACEHOLDER_NAME)]
        name: String,
    },
    /// Append a new batch to a stage
    AddBatch {
        /// Stage id to append into
        stage: u32,
        /// Batch name
        #[arg(default_value = PLACEHOLDER_NAME)]
        name: String,
    },
    /// Append a new thread to a batch
    AddThread {
        /// Stage id containing the batch
        stage: u32,
        /// Batch id to append into
        batch: u32,
        /// Thread name
        #[arg(default_value = PLACEHOLDER_NAME)]
        name: String,
    },
    /// List open (unchecked) questions across the plan
    Questions {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List declared input files and flag missing ones
    Inputs {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // -----------------------------------------------------------------
    // Role gating: WEFT_ROLE=agent restricts the surface to read-only
    // commands before anything touches the filesystem.
    // -----------------------------------------------------------------
    if let Err(e) = role::check_command(role::current_role(), &cli.command) {
        eprintln!("{e}");
        std::process::exit(2);
    }

    match cli.command {
        Commands::Init {
            default_plan,
            force,
        } => {
            cmd_init(default_plan.as_deref(), force)?;
        }
        Commands::New {
            name,
            output,
            force,
        } => {
            let path = match output {
                Some(out) => std::path::PathBuf::from(out),
                None => resolve::resolve_plan_path(cli.plan.as_deref())?,
            };
            new_cmd::run_new(&path, &name, force)?;
        }
        Commands::Report { json } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            report_cmd::run_report(&path, json)?;
        }
        Commands::Validate { json } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            validate_cmd::run_validate(&path, json)?;
        }
        Commands::AddStage { name } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            edit_cmds::run_add_stage(&path, &name)?;
        }
        Commands::AddBatch { stage, name } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            edit_cmds::run_add_batch(&path, stage, &name)?;
        }
        Commands::AddThread { stage, batch, name } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            edit_cmds::run_add_thread(&path, stage, batch, &name)?;
        }
        Commands::Questions { json } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            question_cmd::run_questions(&path, json)?;
        }
        Commands::Inputs { json } => {
            let path = resolve::resolve_plan_path(cli.plan.as_deref())?;
            inputs_cmd::run_inputs(&path, json)?;
        }
    }

    Ok(())
}

/// Execute the `weft init` command: write config file.
fn cmd_init(default_plan: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        document: config::DocumentSection {
            default_path: default_plan.map(str::to_string),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    if let Some(plan) = default_plan {
        println!("  document.default_path = {plan}");
    }

    Ok(())
}
