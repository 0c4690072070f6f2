//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_scenario;
pub use validate::run_validate;

use std::path::Path;

use contracts::ScenarioBlueprint;

use crate::error::{CliError, Result};

/// Load and validate a scenario configuration file
pub(crate) fn load_blueprint(path: &Path) -> Result<ScenarioBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    config_loader::ConfigLoader::load_from_path(path)
        .map_err(|e| CliError::config_load(e.to_string()))
}
