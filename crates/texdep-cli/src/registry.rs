use std::fs;

use ecow::eco_format;
use texdep_ide::Registry;
use texdep_ide::diag::{FileError, StrResult};

use crate::args::SharedArgs;

/// The built-in registry, extended with the configured registry file.
pub fn load(args: &SharedArgs) -> StrResult<Registry> {
    let Some(path) = &args.registry else {
        return Ok(Registry::builtin());
    };

    let text = fs::read_to_string(path).map_err(|err| FileError::from_io(err, path))?;
    let registry = Registry::from_toml(&text)
        .map_err(|err| eco_format!("{err} (in {})", path.display()))?;

    tracing::info!("loaded registry from {}", path.display());
    Ok(registry)
}
