use std::io::{self, Write};

/// Terminal output handler
///
/// Progress goes to stderr; stdout carries only a command's result (the
/// summary line or Alfred feedback), which is what Alfred reads.
#[derive(Debug, Default)]
pub struct Output {
    pub verbose: bool,
}

impl Output {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print a status message (action: target)
    pub fn status(&self, action: &str, target: &str) {
        // Right-align action in 12 chars, like cargo does
        eprintln!("{:>12} {}", action, target);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{:>12} {}", "Warning", message);
    }

    /// Print a verbose message (only if verbose mode is on)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", message);
        }
    }

    /// Print a command's result on stdout
    pub fn result(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", text);
        let _ = stdout.flush();
    }
}

/// One-line error for stdout, where Alfred shows it as the notification
pub fn error_summary(err: &anyhow::Error) -> String {
    format!("ERROR: {}", err)
}

/// Print an error message to stderr
pub fn print_error(err: &anyhow::Error) {
    eprintln!("error: {}", err);

    // Print cause chain
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fix::FixError;
    use anyhow::Context;

    #[test]
    fn test_error_summary_uses_top_message() {
        let err = anyhow::Error::from(FixError::WorkflowsDirNotFound);
        assert_eq!(error_summary(&err), "ERROR: could not find workflow directory");

        let err = Err::<(), _>(std::io::Error::other("denied"))
            .context("failed to read blacklist")
            .unwrap_err();
        assert_eq!(error_summary(&err), "ERROR: failed to read blacklist");
    }
}
