//! # browser-launch
//!
//! Open a URL in the user's default browser by spawning the platform opener.
//!
//! ## Platform support
//!
//! | OS                  | Opener            |
//! |---------------------|-------------------|
//! | macOS               | `open <url>`      |
//! | Linux / BSD         | `xdg-open <url>`  |
//! | Windows             | `cmd /C start "" <url>` |
//!
//! ## Environment variable overrides
//!
//! - `BROWSER` — program to run instead of the platform opener. The URL is
//!   passed as its only argument.
//!
//! ## Usage
//!
//! ```rust,no_run
//! browser_launch::open_url("http://localhost:3000").expect("could not open browser");
//! ```

use std::process::{Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use thiserror::Error;

/// Environment variable that overrides the platform opener.
pub const BROWSER_ENV: &str = "BROWSER";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by browser-launch operations.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No opener is known for this OS and `BROWSER` is unset.
    #[error("Unsupported platform: {os}")]
    UnsupportedPlatform { os: String },

    /// The opener process could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// ── Opener detection ─────────────────────────────────────────────────────────

/// A program plus leading arguments; the URL is appended last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub program: String,
    pub args: Vec<String>,
}

impl Opener {
    /// Build the command that opens `url`.
    pub fn command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(url);
        cmd
    }
}

/// Opener for the given OS name (as in [`std::env::consts::OS`]).
fn opener_for_os(os: &str) -> Result<Opener, LaunchError> {
    let (program, args): (&str, &[&str]) = match os {
        "macos" => ("open", &[]),
        "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => ("xdg-open", &[]),
        // `start` treats the first quoted argument as a window title.
        "windows" => ("cmd", &["/C", "start", ""]),
        other => {
            return Err(LaunchError::UnsupportedPlatform {
                os: other.to_string(),
            })
        }
    };
    Ok(Opener {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    })
}

/// Resolve the opener, honouring `browser_override` when it is non-empty.
fn resolve_opener(browser_override: Option<&str>, os: &str) -> Result<Opener, LaunchError> {
    match browser_override.map(str::trim).filter(|b| !b.is_empty()) {
        Some(program) => Ok(Opener {
            program: program.to_string(),
            args: Vec::new(),
        }),
        None => opener_for_os(os),
    }
}

/// Detect the opener for the current process: `BROWSER` if set, otherwise
/// the platform default.
pub fn detect_opener() -> Result<Opener, LaunchError> {
    let browser = std::env::var(BROWSER_ENV).ok();
    resolve_opener(browser.as_deref(), std::env::consts::OS)
}

/// Open `url` in the default browser.
///
/// Returns once the opener has been spawned. Its output is discarded, and a
/// detached thread reaps it when it exits.
pub fn open_url(url: &str) -> Result<(), LaunchError> {
    let opener = detect_opener()?;
    spawn_reaped(&opener, url)?;
    Ok(())
}

/// Spawn `opener` for `url` and wait for it on a background thread, so it
/// never lingers as a zombie.
fn spawn_reaped(
    opener: &Opener,
    url: &str,
) -> Result<JoinHandle<Option<ExitStatus>>, LaunchError> {
    let mut child = opener
        .command(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: opener.program.clone(),
            source,
        })?;
    Ok(std::thread::spawn(move || child.wait().ok()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_have_openers() {
        assert_eq!(opener_for_os("macos").unwrap().program, "open");
        assert_eq!(opener_for_os("linux").unwrap().program, "xdg-open");
        let win = opener_for_os("windows").unwrap();
        assert_eq!(win.program, "cmd");
        assert_eq!(win.args, ["/C", "start", ""]);
    }

    #[test]
    fn unknown_platform_is_an_error() {
        let err = opener_for_os("plan9").unwrap_err();
        assert!(matches!(err, LaunchError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("plan9"));
    }

    #[test]
    fn override_wins_over_platform() {
        let opener = resolve_opener(Some("firefox"), "plan9").unwrap();
        assert_eq!(opener.program, "firefox");
        assert!(opener.args.is_empty());
    }

    #[test]
    fn blank_override_is_ignored() {
        let opener = resolve_opener(Some("  "), "linux").unwrap();
        assert_eq!(opener.program, "xdg-open");
    }

    #[test]
    fn command_appends_url_last() {
        let opener = opener_for_os("windows").unwrap();
        let cmd = opener.command("http://localhost:3000");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["/C", "start", "", "http://localhost:3000"]);
    }

    #[cfg(unix)]
    #[test]
    fn spawned_opener_is_reaped() {
        let opener = Opener {
            program: "true".into(),
            args: Vec::new(),
        };
        let reaper = spawn_reaped(&opener, "http://localhost").unwrap();
        let status = reaper.join().unwrap().expect("exit status collected");
        assert!(status.success());
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let opener = Opener {
            program: "log2txt-definitely-not-a-browser".into(),
            args: Vec::new(),
        };
        let err = spawn_reaped(&opener, "http://localhost").unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert!(err.to_string().contains("log2txt-definitely-not-a-browser"));
    }
}
