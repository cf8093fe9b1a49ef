//! Developer logging.
//!
//! No log facade: like the rest of the configuration surface this is a plain
//! env/option gated stderr sink, cheap to check and absent from release use.

#[derive(Debug, Default, Clone, Copy)]
pub struct DevLog {
    enabled: bool,
}

impl DevLog {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Emit one line. Callers gate on [`DevLog::enabled`] before formatting.
    pub fn record(&self, message: &str) {
        if self.enabled {
            eprintln!("[typetape] {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DevLog;

    #[test]
    fn disabled_by_default() {
        assert!(!DevLog::default().enabled());
        assert!(DevLog::new(true).enabled());
    }
}
