//! Hands a local file to the operating system's default application.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::Result;

#[cfg(target_os = "windows")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("cmd");
    // The empty argument is the window title `start` expects first.
    command.args(["/C", "start", ""]).arg(path);
    command
}

#[cfg(target_os = "macos")]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(path);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn opener_command(path: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

/// Opens `path` with the default application without blocking the caller.
///
/// # Errors
///
/// Returns an error if the opener program cannot be started.
pub fn open_path(path: &Path) -> Result<()> {
    let mut child = opener_command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    log::info!("Opening {}", path.display());
    std::thread::spawn(move || {
        let _ = child.wait();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opener_targets_the_path() {
        let command = opener_command(Path::new("/tmp/notes.pdf"));
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args.last().map(|a| a.to_string_lossy().into_owned()).as_deref(), Some("/tmp/notes.pdf"));
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn linux_uses_xdg_open() {
        let command = opener_command(Path::new("/tmp/notes.pdf"));
        assert_eq!(command.get_program(), "xdg-open");
    }
}
