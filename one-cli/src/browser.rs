//! Launch a URL in the browser configured by the profile.

use std::io;
use std::process::{Command, Stdio};

use one_core::types::{BrowserKind, BrowserSettings};
use one_lifecycle::BrowserOpener;

/// Program and arguments for one browser launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub program: &'static str,
    pub args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BrowserLauncher {
    settings: BrowserSettings,
}

impl BrowserLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// The command that opens `url` on the current platform.
    pub fn launch_for(&self, url: &str) -> io::Result<Launch> {
        launch_for(std::env::consts::OS, &self.settings, url)
    }
}

impl BrowserOpener for BrowserLauncher {
    fn open(&self, url: &str) -> io::Result<()> {
        let launch = self.launch_for(url)?;
        tracing::debug!(program = launch.program, args = ?launch.args, "launching browser");
        // Detached: the browser outlives the command.
        Command::new(launch.program)
            .args(&launch.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}

fn launch_for(os: &str, settings: &BrowserSettings, url: &str) -> io::Result<Launch> {
    let profile = settings.profile.as_deref().filter(|p| !p.is_empty());
    let mut args: Vec<String> = Vec::new();
    let program = match (settings.kind, os) {
        (BrowserKind::System, "macos") => "open",
        (BrowserKind::System, "windows") => {
            args.extend(["/C".into(), "start".into(), String::new()]);
            "cmd"
        }
        (BrowserKind::System, _) => "xdg-open",

        (BrowserKind::Chrome, _) => {
            if let Some(profile) = profile {
                args.push(format!("--profile-directory={profile}"));
            }
            match os {
                "macos" => return Ok(via_open("Google Chrome", args, url)),
                "windows" => "chrome.exe",
                _ => "google-chrome",
            }
        }

        (BrowserKind::Firefox, _) => {
            if let Some(profile) = profile {
                args.extend(["-P".into(), profile.to_owned()]);
            }
            match os {
                "macos" => return Ok(via_open("Firefox", args, url)),
                "windows" => "firefox.exe",
                _ => "firefox",
            }
        }

        (BrowserKind::Safari, "macos") => {
            return Ok(Launch {
                program: "open",
                args: vec!["-a".into(), "Safari".into(), url.to_owned()],
            })
        }
        (BrowserKind::Safari, _) => {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "Safari is only available on macOS",
            ))
        }
    };
    args.push(url.to_owned());
    Ok(Launch { program, args })
}

/// `open -a <app> --args ... <url>` on macOS.
fn via_open(app: &str, browser_args: Vec<String>, url: &str) -> Launch {
    let mut args = vec!["-a".to_owned(), app.to_owned(), "--args".to_owned()];
    args.extend(browser_args);
    args.push(url.to_owned());
    Launch {
        program: "open",
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://github.com/acme/api/pull/1";

    fn settings(kind: BrowserKind, profile: Option<&str>) -> BrowserSettings {
        BrowserSettings {
            kind,
            profile: profile.map(str::to_owned),
        }
    }

    #[test]
    fn system_browser_uses_platform_opener() {
        let linux = launch_for("linux", &settings(BrowserKind::System, None), URL).expect("linux");
        assert_eq!(linux.program, "xdg-open");
        assert_eq!(linux.args, [URL]);

        let mac = launch_for("macos", &settings(BrowserKind::System, None), URL).expect("mac");
        assert_eq!(mac.program, "open");

        let win = launch_for("windows", &settings(BrowserKind::System, None), URL).expect("win");
        assert_eq!(win.program, "cmd");
        assert_eq!(win.args, ["/C", "start", "", URL]);
    }

    #[test]
    fn chrome_profile_on_macos_goes_through_open() {
        let launch =
            launch_for("macos", &settings(BrowserKind::Chrome, Some("Profile 2")), URL).expect("launch");
        assert_eq!(launch.program, "open");
        assert_eq!(
            launch.args,
            ["-a", "Google Chrome", "--args", "--profile-directory=Profile 2", URL]
        );
    }

    #[test]
    fn firefox_profile_on_linux() {
        let launch =
            launch_for("linux", &settings(BrowserKind::Firefox, Some("work")), URL).expect("launch");
        assert_eq!(launch.program, "firefox");
        assert_eq!(launch.args, ["-P", "work", URL]);
    }

    #[test]
    fn empty_profile_is_ignored() {
        let launch = launch_for("linux", &settings(BrowserKind::Chrome, Some("")), URL).expect("launch");
        assert_eq!(launch.args, [URL]);
    }

    #[test]
    fn safari_outside_macos_is_unsupported() {
        let err = launch_for("linux", &settings(BrowserKind::Safari, None), URL).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
