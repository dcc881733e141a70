//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Shared command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "grasp", about = "Two-handed VR scene interaction")]
pub struct CliArgs {
    /// Disable single-controller object grabbing.
    #[arg(long)]
    pub no_grab: bool,

    /// Initial world magnification.
    #[arg(long)]
    pub magnification: Option<f64>,

    /// Tracking loop rate in Hz.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if args.no_grab {
            self.interaction.grab_enabled = false;
        }
        if let Some(m) = args.magnification {
            self.interaction.magnification = m;
        }
        if let Some(rate) = args.tick_rate {
            self.session.tick_rate_hz = rate;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            no_grab: true,
            magnification: Some(2.5),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert!(!config.interaction.grab_enabled);
        assert_eq!(config.interaction.magnification, 2.5);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.session.tick_rate_hz, 90);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["grasp", "--no-grab", "--tick-rate", "120"]);
        assert!(args.no_grab);
        assert_eq!(args.tick_rate, Some(120));
        assert!(args.config.is_none());
    }
}
