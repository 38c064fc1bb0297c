//! Runtime context for command execution.

use anyhow::{Context, Result};

use trellis_convert::TzOffset;
use trellis_core::ProjectUser;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Offset applied when formatting local date types.
    pub timezone: TzOffset,

    /// Project role id of the acting user.
    pub role: Option<String>,

    /// Project users for name resolution.
    pub users: Vec<ProjectUser>,

    /// Verbose output.
    pub verbose: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let timezone = match global.timezone.as_deref() {
            Some(input) => TzOffset::parse(input)?,
            None => TzOffset::default(),
        };
        let users = match global.users.as_deref() {
            Some(path) => {
                let data = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read users file: {path}"))?;
                serde_json::from_str(&data)
                    .with_context(|| format!("failed to parse users file: {path}"))?
            }
            None => Vec::new(),
        };
        Ok(Self {
            timezone,
            role: global.role.clone(),
            users,
            verbose: global.verbose,
        })
    }

    pub fn role_id(&self) -> Option<&str> {
        self.role.as_deref()
    }
}
