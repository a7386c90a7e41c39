use std::{backtrace::Backtrace, path::PathBuf};

use clap::Parser;
use colored::Colorize;
use framedump::{DEFAULT_OUTPUT_DIR, ExtractError, FfmpegLogLevel, FrameExtractor};

/// Sample file used when no input is given.
const DEFAULT_INPUT: &str = "tests-sample.mp4";

#[derive(Debug, Parser)]
#[command(
    name = "framedump",
    about = "Write every frame of a video to ./tmp as numbered PNG files"
)]
struct Cli {
    /// Media file to read.
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn run() -> Result<(), ExtractError> {
    let cli = Cli::parse();

    init_logging();
    framedump::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    let summary = FrameExtractor::new(&cli.input)
        .with_output_dir(DEFAULT_OUTPUT_DIR)
        .run()?;

    log::debug!("{:?}", summary.report);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        eprintln!("{}", Backtrace::force_capture());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_defaults_to_sample() {
        let cli = Cli::try_parse_from(["framedump"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("tests-sample.mp4"));
    }

    #[test]
    fn input_is_positional() {
        let cli = Cli::try_parse_from(["framedump", "clip.mkv"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("clip.mkv"));
    }

    #[test]
    fn rejects_extra_arguments() {
        assert!(Cli::try_parse_from(["framedump", "a.mp4", "b.mp4"]).is_err());
        assert!(Cli::try_parse_from(["framedump", "--out", "x"]).is_err());
    }

    #[test]
    fn has_no_version_flag() {
        for flag in ["--version", "-V"] {
            assert!(Cli::try_parse_from(["framedump", flag]).is_err(), "{flag}");
        }
    }

    #[test]
    fn command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
