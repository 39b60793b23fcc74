use std::{error::Error, path::PathBuf};

use frame_dataset_lib::*;

use crate::app::{config_file::resolve_cfg, run_output::write_summary, *};

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.output_cfg.verbosity);

    match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            print_fatal_err(fatal_error, cfg.output_cfg.verbosity);
            1
        }
    }
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let resolved = resolve_cfg(cfg, &cwd)?;
    debug!("Resolved configuration: {resolved:?}");

    let extractor = AutoExtractor {
        ffmpeg: match cfg.ffmpeg_timeout_secs {
            Some(secs) => FfmpegExtractor::with_timeout_secs(secs),
            None => FfmpegExtractor::default(),
        },
        archive: ArchiveImageExtractor,
    };

    let open_store = |run_id: &RunIdentity| FsStageStore::new(run_id.clone(), &resolved.work_dir, &resolved.output_dir);

    let summary = Orchestrator::new(&extractor, &ImageFileDecoder, &ZipPackager)
        .run(&resolved.pipeline, open_store)
        .map_err(AppError::from)?;

    write_summary(&summary, cfg.output_cfg.format, std::io::stdout())?;

    Ok(())
}

fn print_fatal_err(fatal_err: eyre::Report, verbosity: ReportVerbosity) {
    error!(target: "app-errorlog", "{}", fatal_err);

    if verbosity == ReportVerbosity::Verbose {
        let mut source: Option<&(dyn Error + 'static)> = fatal_err.source();
        while let Some(e) = source {
            error!(target: "app-errorlog", "    caused by: {}", e);
            source = e.source();
        }
    }
}

pub fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let mut cfg = simplelog::ConfigBuilder::new();
    cfg.set_target_level(LevelFilter::Error);

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    if let Err(e) = TermLogger::init(min_loglevel, cfg.build(), TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialize logging: {e}");
    }
}
