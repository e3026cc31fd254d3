//! Single dismissible notification banner

use std::fmt;

use log::{error, info, warn};

const NOTICE_LOG_TARGET: &str = "NOTICE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    /// success and warning notices hide themselves
    pub fn auto_hides(self) -> bool {
        matches!(self, Severity::Success | Severity::Warning)
    }

    /// style class of the banner
    pub fn class(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// bumps on every `show`, used to scope auto-hide timers
    pub generation: u64,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct Notifier {
    current: Option<Notification>,
    generation: u64,
}

impl Notifier {
    /// Replaces the banner content and makes it visible.
    ///
    /// Returns the generation to hide later when the severity auto-hides.
    pub fn show(&mut self, message: impl Into<String>, severity: Severity) -> Option<u64> {
        let message = message.into();
        match severity {
            Severity::Error => error!(target: NOTICE_LOG_TARGET, "{message}"),
            Severity::Warning => warn!(target: NOTICE_LOG_TARGET, "{message}"),
            Severity::Info | Severity::Success => info!(target: NOTICE_LOG_TARGET, "{message}"),
        }

        self.generation += 1;
        self.current = Some(Notification {
            message,
            severity,
            generation: self.generation,
            visible: true,
        });

        severity.auto_hides().then_some(self.generation)
    }

    pub fn hide(&mut self) {
        if let Some(n) = self.current.as_mut() {
            n.visible = false;
        }
    }

    /// Hides the banner only if it still shows the given generation
    pub fn hide_generation(&mut self, generation: u64) {
        if let Some(n) = self.current.as_mut() {
            if n.generation == generation {
                n.visible = false;
            }
        }
    }

    /// Visible banner, if any
    pub fn visible(&self) -> Option<&Notification> {
        self.current.as_ref().filter(|n| n.visible)
    }
}
