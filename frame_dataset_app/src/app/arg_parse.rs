use std::path::{Path, PathBuf};

use clap::{value_parser, ArgAction::*};

use crate::app::*;

// input
const INPUT_PATH: &str = "Input video or archive";
const CONFIG_FILE: &str = "Config file";

// extraction
const FPS: &str = "Frames per second";
const MAX_FRAMES: &str = "Maximum frames";
const SCALE_WIDTH: &str = "Scale width";
const FFMPEG_TIMEOUT: &str = "Ffmpeg timeout";

// dedup
const THRESHOLD: &str = "Dedup threshold";
const FINGERPRINT: &str = "Fingerprint algorithm";

// storage
const WORK_DIR: &str = "Work directory";
const OUTPUT_DIR: &str = "Output directory";

//output settings
const OUTPUT_FORMAT: &str = "Format";

// Arg definitions
const ARGS_FILE: &str = "Args file";

//Verbosity
const VERBOSITY_QUIET: &str = "Quiet";
const VERBOSITY_VERBOSE: &str = "Verbose";

pub(super) const DEFAULT_CONFIG_FILENAME: &str = "frame_dataset.json";

const DISPLAY_ORDERING: [&str; 14] = [
    //input
    INPUT_PATH,
    CONFIG_FILE,
    //
    //extraction
    FPS,
    MAX_FRAMES,
    SCALE_WIDTH,
    FFMPEG_TIMEOUT,
    //
    //dedup
    THRESHOLD,
    FINGERPRINT,
    //
    //storage
    WORK_DIR,
    OUTPUT_DIR,
    //
    //outputs
    OUTPUT_FORMAT,
    //
    //verbosity
    VERBOSITY_QUIET,
    VERBOSITY_VERBOSE,
    //argument replacement
    ARGS_FILE,
];

fn build_app() -> clap::Command {
    let get_ordering = |arg_name: &str| -> usize {
        match DISPLAY_ORDERING.iter().position(|x| *x == arg_name) {
            Some(idx) => idx,
            None => {
                panic!("argument not assigned a display order: {arg_name:?}");
            }
        }
    };

    //args are not added through method chaining because rustfmt struggles with very long expressions.
    let mut clap_app = clap::Command::new("Frame dataset builder")
        .version(clap::crate_version!())
        .about("Extract frames from a video, remove near-duplicates and package the rest. Stages already done by an earlier run with the same input and settings are skipped.");

    clap_app = clap_app.arg(
        clap::Arg::new(INPUT_PATH)
            .long("input")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("The video to extract frames from. Zip archives of images are imported instead of being decoded with ffmpeg. Overrides 'input_path' in the config file")
            .display_order(get_ordering(INPUT_PATH)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(CONFIG_FILE)
            .long("config")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help(format!("Path to a JSON config file. Defaults to {DEFAULT_CONFIG_FILENAME} in the current directory, which is optional. A config file given with this argument must exist"))
            .display_order(get_ordering(CONFIG_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(FPS)
            .long("fps")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .help("Number of frames to sample per second of video")
            .display_order(get_ordering(FPS)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(MAX_FRAMES)
            .long("max-frames")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .help("Keep at most this many frames. 0 means no limit")
            .display_order(get_ordering(MAX_FRAMES)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(SCALE_WIDTH)
            .long("scale-width")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .help("Resize frames to this width, keeping the aspect ratio. 0 keeps the source width")
            .display_order(get_ordering(SCALE_WIDTH)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(FFMPEG_TIMEOUT)
            .long("ffmpeg-timeout")
            .num_args(1)
            .value_parser(value_parser!(u64))
            .help("Kill ffmpeg if extraction takes longer than this many seconds")
            .display_order(get_ordering(FFMPEG_TIMEOUT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(THRESHOLD)
            .long("threshold")
            .num_args(1)
            .value_parser(value_parser!(u32))
            .help("Maximum fingerprint distance at which a frame counts as a duplicate of an earlier kept frame. Higher values remove more frames")
            .display_order(get_ordering(THRESHOLD)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(FINGERPRINT)
            .long("fingerprint")
            .num_args(1)
            .value_parser(value_parser!(FingerprintArg))
            .help("Fingerprint algorithm used to compare frames")
            .display_order(get_ordering(FINGERPRINT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(WORK_DIR)
            .long("work-dir")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where extracted and deduplicated frames are kept between runs. Defaults to the user cache directory")
            .display_order(get_ordering(WORK_DIR)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_DIR)
            .long("output-dir")
            .num_args(1)
            .value_parser(value_parser!(PathBuf))
            .help("Where the packaged dataset and run summary are written. Defaults to ./outputs")
            .display_order(get_ordering(OUTPUT_DIR)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(OUTPUT_FORMAT)
            .long("format")
            .num_args(1)
            .value_parser(value_parser!(OutputFormat))
            .default_value("normal")
            .help("Format of the run summary printed to stdout")
            .display_order(get_ordering(OUTPUT_FORMAT)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(ARGS_FILE)
            .long("args-file")
            .value_parser(value_parser!(PathBuf))
            .num_args(1)
            .help("Read command line arguments from a file. If this argument is used it must be the only argument")
            .display_order(get_ordering(ARGS_FILE)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_QUIET)
            .long("quiet")
            .help("Reduced verbosity")
            .conflicts_with(VERBOSITY_VERBOSE)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_QUIET)),
    );

    clap_app = clap_app.arg(
        clap::Arg::new(VERBOSITY_VERBOSE)
            .long("verbose")
            .help("Increased verbosity")
            .conflicts_with(VERBOSITY_QUIET)
            .action(SetTrue)
            .display_order(get_ordering(VERBOSITY_VERBOSE)),
    );

    clap_app
}

pub fn parse_args() -> AppCfg {
    //capture the cwd once, to minimize the risk of working with two values if it is changed by the OS at runtime.
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    //Start by parsing the provided arguments from the commandline. If the --args-file
    //argument is provided, then we will ignore the true command line arguments and
    //take the arguments from the file instead.
    let args = get_args_from_cmdline_or_file();

    cfg_from_matches(&args, &cwd)
}

fn cfg_from_matches(args: &clap::ArgMatches, cwd: &Path) -> AppCfg {
    let config_path = match args.get_one::<PathBuf>(CONFIG_FILE) {
        Some(path) => ConfigPath::Explicit(absolutify_path(cwd, path)),
        None => ConfigPath::Default(cwd.join(DEFAULT_CONFIG_FILENAME)),
    };

    let overrides = ConfigOverrides {
        input_path: args.get_one::<PathBuf>(INPUT_PATH).map(|p| absolutify_path(cwd, p)),
        fps: args.get_one::<f64>(FPS).copied(),
        max_frames: args.get_one::<u32>(MAX_FRAMES).copied(),
        scale_width: args.get_one::<u32>(SCALE_WIDTH).copied(),
        dedup_threshold: args.get_one::<u32>(THRESHOLD).copied(),
        fingerprint: args.get_one::<FingerprintArg>(FINGERPRINT).map(|&arg| arg.into()),
        work_dir: args.get_one::<PathBuf>(WORK_DIR).map(|p| absolutify_path(cwd, p)),
        output_dir: args.get_one::<PathBuf>(OUTPUT_DIR).map(|p| absolutify_path(cwd, p)),
    };

    let verbosity = if args.get_flag(VERBOSITY_QUIET) {
        ReportVerbosity::Quiet
    } else if args.get_flag(VERBOSITY_VERBOSE) {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let output_cfg = OutputCfg {
        format: args
            .get_one::<OutputFormat>(OUTPUT_FORMAT)
            .copied()
            .unwrap_or(OutputFormat::Normal),
        verbosity,
    };

    let ret = AppCfg {
        config_path,
        overrides,
        output_cfg,
        ffmpeg_timeout_secs: args.get_one::<u64>(FFMPEG_TIMEOUT).copied(),
    };

    ret
}

// Arguments are always first read from the command line, but if --args-file
// is present, then arguments are actually located in a file on disk.
// This fn obtains the args from the correct location.
fn get_args_from_cmdline_or_file() -> clap::ArgMatches {
    let cmdline_args = build_app().get_matches();

    match cmdline_args.get_one::<PathBuf>(ARGS_FILE) {
        None => cmdline_args,
        Some(args_path) => get_argsfile_args(args_path),
    }
}

fn get_argsfile_args(argsfile_path: &Path) -> clap::ArgMatches {
    let args = std::fs::read_to_string(argsfile_path)
        .map_err(eyre::Report::msg)
        .and_then(|text| split_argsfile(&text).map_err(eyre::Report::msg))
        .map_err(|e| {
            e.wrap_err(format!(
                "Failed to parse args file at location {}",
                argsfile_path.to_string_lossy()
            ))
        })
        .unwrap_or_else(|e| print_error_and_quit(e));

    //When parsing args from file, the binary name will not be present,
    // so update the parser that we use to not expect it.
    let matches = build_app().no_binary_name(true).get_matches_from(args);
    matches
}

// Lines starting with '#' are comments. The rest is split into args in the same way as
// the shell would do it.
fn split_argsfile(text: &str) -> Result<Vec<String>, shell_words::ParseError> {
    let without_comments = text
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    shell_words::split(&without_comments)
}

fn absolutify_path(cwd: &Path, path: &Path) -> PathBuf {
    //get the absolute path if it is not absolute, by prepending the cwd.
    let path = if path.is_relative() {
        cwd.join(path)
    } else {
        path.to_path_buf()
    };

    //now try canonicalizing the path. If that fails (e.g. it doesn't exist yet) carry on with the joined path.
    path.canonicalize().unwrap_or(path)
}
