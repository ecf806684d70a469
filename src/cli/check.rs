//! Configuration validation command.

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Validate a configuration file without starting the simulation.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Tick interval: {}ms", config.engine.tick_interval_ms);
    let timeframes: Vec<String> = std::iter::once(config.engine.base_timeframe)
        .chain(config.engine.derived_timeframes.iter().copied())
        .map(|tf| tf.to_string())
        .collect();
    println!("  Timeframes: {}", timeframes.join(", "));
    println!(
        "  Expirations: {}s-{}s (step {}s)",
        config.trading.min_expiration_secs,
        config.trading.max_expiration_secs,
        config.trading.expiration_step_secs
    );
    println!("  Instruments: {}", config.instruments.len());
    for inst in &config.instruments {
        let payout = inst
            .payout
            .map_or_else(|| "default".to_string(), |p| format!("{p}%"));
        println!(
            "    - {} [{} .. {}] payout {}",
            inst.id, inst.min_price, inst.max_price, payout
        );
    }
    println!("  Demo accounts: {}", config.accounts.len());
    println!();
    println!("Configuration is ready to use.");

    Ok(())
}
