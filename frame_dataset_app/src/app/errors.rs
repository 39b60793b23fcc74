use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /////////////////////////////////
    //config file problems
    #[error("Failed to read config file {path}: {src}")]
    ConfigRead { src: std::io::Error, path: PathBuf },

    #[error("Failed to parse config file {path}: {src}")]
    ConfigParse { src: serde_json::Error, path: PathBuf },

    /////////////////////////////////
    //pipeline problems
    #[error(transparent)]
    Pipeline(#[from] frame_dataset_lib::Error),

    /////////////////////////////////
    //output problems
    #[error("Failed to write run summary: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to write run summary: {src}")]
    SummaryWrite { src: std::io::Error },
}

pub fn print_error_and_quit(e: eyre::Report) -> ! {
    #[allow(clippy::print_stderr)]
    let () = eprintln!("{:?}", e);
    std::process::exit(1);
}
