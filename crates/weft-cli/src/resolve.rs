//! Plan path resolution.
//!
//! Resolution chain: `--plan` flag > `WEFT_PLAN` env var > config file
//! `document.default_path` > `PLAN.md` found by walking up from the
//! current directory > `PLAN.md` in the current directory.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config;

/// Environment variable naming the plan file.
pub const PLAN_ENV: &str = "WEFT_PLAN";

/// Default plan file name looked up in the current directory and its
/// ancestors.
pub const DEFAULT_PLAN_FILE: &str = "PLAN.md";

/// Resolve the plan path for a command invocation.
pub fn resolve_plan_path(cli_plan: Option<&str>) -> Result<PathBuf> {
    let env_plan = std::env::var(PLAN_ENV).ok();
    let config_plan = config::load_config()
        .ok()
        .and_then(|c| c.document.default_path);
    let cwd = std::env::current_dir()?;
    Ok(resolve_with(cli_plan, env_plan.as_deref(), config_plan.as_deref(), &cwd))
}

/// Resolution given explicit inputs (testable without env vars).
pub fn resolve_with(
    cli_plan: Option<&str>,
    env_plan: Option<&str>,
    config_plan: Option<&str>,
    cwd: &Path,
) -> PathBuf {
    if let Some(p) = cli_plan {
        return PathBuf::from(p);
    }
    if let Some(p) = env_plan {
        return PathBuf::from(p);
    }
    if let Some(p) = config_plan {
        return PathBuf::from(p);
    }
    if let Some(found) = find_in_ancestors(cwd) {
        return found;
    }
    cwd.join(DEFAULT_PLAN_FILE)
}

/// Walk from `start` to the filesystem root looking for `PLAN.md`.
fn find_in_ancestors(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(DEFAULT_PLAN_FILE))
        .find(|candidate| candidate.is_file())
}
