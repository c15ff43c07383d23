//! window.rs
//! Boundary to the OS window manager: locate the game window by title and focus it.
//!
//! The X11 implementation shells out to `xdotool` (search) and `wmctrl` (focus).

use log::{debug, error, warn};
use std::{
    process::{Command, Output},
    thread,
    time::Duration,
};

use crate::utils::error::ControlError;

/// Time for the window manager to settle after a focus request.
const FOCUS_SETTLE_MS: u64 = 100;

/// Opaque window identifier as reported by the window tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait WindowLocator {
    /// Visible window whose title is exactly `title`.
    fn find(&self, title: &str) -> Option<WindowHandle>;

    /// Ask the window manager to raise and focus `handle`. `true` on success.
    fn focus(&self, handle: &WindowHandle) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct X11Tools;

impl X11Tools {
    fn run(tool: &'static str, args: &[&str]) -> Result<Output, ControlError> {
        let out = Command::new(tool).args(args).output()?;
        if !out.status.success() {
            return Err(ControlError::ToolFailed {
                tool,
                status: out.status.to_string(),
            });
        }
        Ok(out)
    }

    fn window_name(id: &str) -> Result<String, ControlError> {
        let out = Self::run("xdotool", &["getwindowname", id])?;
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

impl WindowLocator for X11Tools {
    fn find(&self, title: &str) -> Option<WindowHandle> {
        // `--name` is a substring/regex match; confirm the exact title per candidate.
        let out = match Self::run("xdotool", &["search", "--onlyvisible", "--name", title]) {
            Ok(out) => out,
            Err(e) => {
                warn!("[Window] search for {:?} failed: {}", title, e);
                return None;
            }
        };

        for id in parse_window_ids(&String::from_utf8_lossy(&out.stdout)) {
            match Self::window_name(&id) {
                Ok(name) if name == title => {
                    debug!("[Window] Detected window {:?}, id={}", title, id);
                    return Some(WindowHandle(id));
                }
                Ok(_) => {}
                Err(e) => debug!("[Window] getwindowname {} failed: {}", id, e),
            }
        }
        None
    }

    fn focus(&self, handle: &WindowHandle) -> bool {
        match Self::run("wmctrl", &["-i", "-a", handle.as_str()]) {
            Ok(_) => {
                thread::sleep(Duration::from_millis(FOCUS_SETTLE_MS));
                true
            }
            Err(e) => {
                error!("[Window] Failed to focus window {}: {}", handle.as_str(), e);
                false
            }
        }
    }
}

/// One window id per non-empty line of tool output.
pub fn parse_window_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Find `title` and focus it. Returns the handle if both steps succeeded.
pub fn focus_by_title<L: WindowLocator>(locator: &L, title: &str) -> Option<WindowHandle> {
    let handle = locator.find(title)?;
    locator.focus(&handle).then_some(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeWm {
        windows: Vec<(&'static str, &'static str)>,
        focused: RefCell<Vec<String>>,
        focus_ok: bool,
    }

    impl WindowLocator for FakeWm {
        fn find(&self, title: &str) -> Option<WindowHandle> {
            self.windows
                .iter()
                .find(|(_, name)| *name == title)
                .map(|(id, _)| WindowHandle(id.to_string()))
        }

        fn focus(&self, handle: &WindowHandle) -> bool {
            self.focused.borrow_mut().push(handle.as_str().to_string());
            self.focus_ok
        }
    }

    #[test]
    fn test_parse_window_ids() {
        assert_eq!(parse_window_ids("123\n\n  456 \n"), vec!["123", "456"]);
        assert!(parse_window_ids("").is_empty());
    }

    #[test]
    fn test_focus_by_title() {
        let wm = FakeWm {
            windows: vec![("11", "Trackmania Editor"), ("42", "Trackmania")],
            focused: RefCell::new(Vec::new()),
            focus_ok: true,
        };
        let handle = focus_by_title(&wm, "Trackmania").unwrap();
        assert_eq!(handle.as_str(), "42");
        assert_eq!(*wm.focused.borrow(), vec!["42".to_string()]);

        assert!(focus_by_title(&wm, "Missing").is_none());
    }

    #[test]
    fn test_focus_failure_returns_none() {
        let wm = FakeWm {
            windows: vec![("7", "Game")],
            focused: RefCell::new(Vec::new()),
            focus_ok: false,
        };
        assert!(focus_by_title(&wm, "Game").is_none());
        assert_eq!(wm.focused.borrow().len(), 1);
    }
}
