//! Handler for the `run` command.

use tracing::info;

use crate::cli::RunArgs;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::orchestrator::Orchestrator;

/// Apply command-line overrides on top of the loaded file.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(seed) = args.seed {
        config.engine.seed = Some(seed);
    }
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args);

    config.init_logging();
    info!(config = %args.config.display(), "oddsfeed starting");

    Orchestrator::run(config).await?;

    info!("oddsfeed stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config::minimal_toml;
    use std::path::PathBuf;

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::parse_toml(&minimal_toml()).unwrap();
        let args = RunArgs {
            config: PathBuf::from("config.toml"),
            log_level: Some("debug".into()),
            json_logs: true,
            seed: Some(42),
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.engine.seed, Some(42));
    }
}
