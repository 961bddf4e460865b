//! Command definitions for the Pomodoro Cube CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::faces::CubeMode;
use crate::intents::Intent;

/// Longest run accepted from the command line (100 hours).
const MAX_MINUTES: i64 = 6000;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Cube CLI - shared focus timer for every surface
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-cube",
    version,
    about = "Pomodoro Cube の共有タイマーを操作するCLI",
    long_about = "アプリ・ウィジェット・ロック画面・コンパニオンで共有される\n\
                  単一のフォーカスタイマーを操作します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a fresh timer
    Start(StartArgs),

    /// Start again with the last configured duration
    StartLast,

    /// Pause the running timer
    Pause,

    /// Resume a paused timer
    Resume,

    /// Stop the timer
    Stop,

    /// Show current timer status
    Status,

    /// Follow the timer live until it finishes
    Watch,

    /// Recompute and show the widget timeline
    Widget,

    /// List cube faces
    Faces {
        /// Preset set to list (defaults to the saved mode)
        #[arg(short, long, value_enum)]
        mode: Option<CubeMode>,
    },

    /// Switch the cube to another preset set and remember it (stops the timer)
    Mode {
        #[arg(value_enum)]
        mode: CubeMode,
    },

    /// Set the Custom face duration; restarts it if it is the active face
    Custom {
        /// Duration in minutes (1-6000)
        #[arg(value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES))]
        minutes: u32,
    },

    /// Run the companion-side listener and its own countdown
    Companion(CompanionArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    /// The background action this command maps to, if it is a plain one.
    pub fn intent(&self) -> Option<Intent> {
        match self {
            Commands::Start(StartArgs {
                minutes: Some(minutes),
                ..
            }) => Some(Intent::StartWithDuration { minutes: *minutes }),
            Commands::Start(StartArgs { face: None, .. }) | Commands::StartLast => {
                Some(Intent::StartFromIdle)
            }
            Commands::Pause => Some(Intent::Pause),
            Commands::Resume => Some(Intent::Resume),
            Commands::Stop => Some(Intent::Stop),
            _ => None,
        }
    }
}

// ============================================================================
// Start Command Arguments
// ============================================================================

/// Arguments for the start command
///
/// Without `--minutes` or `--face` the last configured duration is used.
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Duration in minutes (1-6000)
    #[arg(
        short,
        long,
        conflicts_with = "face",
        value_parser = clap::value_parser!(u32).range(1..=MAX_MINUTES)
    )]
    pub minutes: Option<u32>,

    /// Name of the face to start (e.g. "Short Break")
    #[arg(short, long, value_parser = validate_face_name)]
    pub face: Option<String>,

    /// Preset set the face belongs to (defaults to the saved mode)
    #[arg(long, value_enum, requires = "face")]
    pub mode: Option<CubeMode>,
}

// ============================================================================
// Companion Command Arguments
// ============================================================================

/// Arguments for the companion command
#[derive(Args, Debug, Clone, Default)]
pub struct CompanionArgs {
    /// Companion preset to select (e.g. "Quick")
    #[arg(short, long, value_parser = validate_face_name)]
    pub face: Option<String>,

    /// Start the companion countdown right away
    #[arg(short, long)]
    pub start: bool,

    /// Exit when the companion countdown completes
    #[arg(long, requires = "start")]
    pub exit_on_finish: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the face name.
///
/// - Must not be blank
/// - Must not exceed 40 characters
fn validate_face_name(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("フェイス名は空にできません".to_string());
    }
    if s.chars().count() > 40 {
        return Err("フェイス名は40文字以内にしてください".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["pomodoro-cube"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
        }

        #[test]
        fn test_parse_verbose_flag() {
            let cli = Cli::parse_from(["pomodoro-cube", "-v", "status"]);
            assert!(cli.verbose);
            assert!(matches!(cli.command, Some(Commands::Status)));
        }

        #[test]
        fn test_parse_simple_commands() {
            for (arg, expected) in [
                ("pause", Intent::Pause),
                ("resume", Intent::Resume),
                ("stop", Intent::Stop),
                ("start-last", Intent::StartFromIdle),
            ] {
                let cli = Cli::parse_from(["pomodoro-cube", arg]);
                assert_eq!(cli.command.unwrap().intent(), Some(expected), "{}", arg);
            }
        }

        #[test]
        fn test_parse_faces_mode_is_optional() {
            let cli = Cli::parse_from(["pomodoro-cube", "faces"]);
            assert!(matches!(cli.command, Some(Commands::Faces { mode: None })));

            let cli = Cli::parse_from(["pomodoro-cube", "faces", "--mode", "gym"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Faces {
                    mode: Some(CubeMode::Gym)
                })
            ));
        }

        #[test]
        fn test_parse_custom_command() {
            let cli = Cli::parse_from(["pomodoro-cube", "custom", "12"]);
            assert!(matches!(cli.command, Some(Commands::Custom { minutes: 12 })));

            assert!(Cli::try_parse_from(["pomodoro-cube", "custom", "0"]).is_err());
        }

        #[test]
        fn test_parse_companion_args() {
            let cli = Cli::parse_from([
                "pomodoro-cube",
                "companion",
                "--face",
                "Quick",
                "--start",
                "--exit-on-finish",
            ]);
            match cli.command {
                Some(Commands::Companion(args)) => {
                    assert_eq!(args.face.as_deref(), Some("Quick"));
                    assert!(args.start);
                    assert!(args.exit_on_finish);
                }
                _ => panic!("Expected Companion command"),
            }

            let cli = Cli::parse_from(["pomodoro-cube", "companion"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Companion(CompanionArgs { start: false, .. }))
            ));

            assert!(
                Cli::try_parse_from(["pomodoro-cube", "companion", "--exit-on-finish"]).is_err()
            );
        }

        #[test]
        fn test_parse_mode_command() {
            let cli = Cli::parse_from(["pomodoro-cube", "mode", "meditation"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Mode {
                    mode: CubeMode::Meditation
                })
            ));
            assert!(cli.command.unwrap().intent().is_none());
        }
    }

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_start_without_options_uses_last() {
            let cli = Cli::parse_from(["pomodoro-cube", "start"]);
            assert_eq!(cli.command.unwrap().intent(), Some(Intent::StartFromIdle));
        }

        #[test]
        fn test_start_with_minutes() {
            let cli = Cli::parse_from(["pomodoro-cube", "start", "--minutes", "5"]);
            assert_eq!(
                cli.command.unwrap().intent(),
                Some(Intent::StartWithDuration { minutes: 5 })
            );
        }

        #[test]
        fn test_start_with_face() {
            let cli = Cli::parse_from([
                "pomodoro-cube",
                "start",
                "--face",
                "HIIT",
                "--mode",
                "gym",
            ]);
            match cli.command {
                Some(Commands::Start(ref args)) => {
                    assert_eq!(args.face.as_deref(), Some("HIIT"));
                    assert_eq!(args.mode, Some(CubeMode::Gym));
                }
                _ => panic!("Expected Start command"),
            }
            assert!(cli.command.unwrap().intent().is_none());
        }

        #[test]
        fn test_minutes_and_face_conflict() {
            let result = Cli::try_parse_from([
                "pomodoro-cube",
                "start",
                "--minutes",
                "5",
                "--face",
                "Focus",
            ]);
            assert!(result.is_err());
        }

        #[test]
        fn test_minutes_out_of_range() {
            assert!(Cli::try_parse_from(["pomodoro-cube", "start", "-m", "0"]).is_err());
            assert!(Cli::try_parse_from(["pomodoro-cube", "start", "-m", "6001"]).is_err());
        }

        #[test]
        fn test_mode_requires_face() {
            let result = Cli::try_parse_from(["pomodoro-cube", "start", "--mode", "gym"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_validate_face_name() {
            assert!(validate_face_name("Focus").is_ok());
            assert!(validate_face_name("   ").is_err());
            assert!(validate_face_name(&"x".repeat(41)).is_err());
        }
    }
}
