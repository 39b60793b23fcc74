use std::{
    ffi::OsStr,
    io::prelude::*,
    process::{Child, Command, Stdio},
    time::Duration,
};

#[cfg(target_family = "windows")]
use std::os::windows::process::CommandExt;

use wait_timeout::ChildExt;
use FfmpegError::*;

use crate::FfmpegError;

//Ffmpeg sometimes prints very long error messages. Only the start is kept.
const MAX_ERR_MSG_CHARS: usize = 500;

pub fn ffmpeg_is_callable() -> bool {
    run_ffmpeg_command(&[OsStr::new("-version")], Some(Duration::from_secs(10))).is_ok()
}

fn spawn_ffmpeg_command(args: &[&OsStr]) -> Result<Child, FfmpegError> {
    let mut command = Command::new("ffmpeg");
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    //do not spawn a command window on windows when when in a gui application
    #[cfg(target_family = "windows")]
    command.creation_flags(winapi::um::winbase::CREATE_NO_WINDOW);

    command.spawn().map_err(|e| match e.kind() {
        //shell failed to execute the command. Separate out FileNotFound from all other errors
        //as by far the most likely cause is ffmpeg is not installed.
        std::io::ErrorKind::NotFound => FfmpegNotFound,
        _ => Io(format!("{:?}", e.kind())),
    })
}

fn truncate_ffmpeg_err_msg(stderr: &[u8]) -> FfmpegError {
    match std::str::from_utf8(stderr) {
        Ok(error_text) => FfmpegInternal(error_text.trim().chars().take(MAX_ERR_MSG_CHARS).collect::<String>()),
        Err(_) => Utf8Conversion,
    }
}

/// Run ffmpeg to completion. If `timeout` elapses first the process is killed.
pub(crate) fn run_ffmpeg_command(args: &[&OsStr], timeout: Option<Duration>) -> Result<(), FfmpegError> {
    let mut child = spawn_ffmpeg_command(args)?;

    //Drain stderr on another thread so that ffmpeg never blocks on a full pipe.
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| Io("failed to capture stderr".to_string()))?;
    let stderr_thread = std::thread::spawn(move || {
        let mut acc = vec![];
        let _read_error = stderr.read_to_end(&mut acc);
        acc
    });

    let status = match timeout {
        Some(timeout) => match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _kill_error = child.kill();
                let _wait_error = child.wait();
                let _ = stderr_thread.join();
                return Err(Timeout(timeout.as_secs()));
            }
            Err(e) => return Err(Io(format!("{:?}", e.kind()))),
        },
        None => child.wait().map_err(|e| Io(format!("{:?}", e.kind())))?,
    };

    let stderr_acc = stderr_thread
        .join()
        .map_err(|_| Io("stderr reader panicked".to_string()))?;

    //The shell successfully executed it, but maybe it returned an error code
    if status.success() {
        Ok(())
    } else {
        Err(truncate_ffmpeg_err_msg(&stderr_acc))
    }
}
