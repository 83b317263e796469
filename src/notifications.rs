//! User-facing notifications.

use colored::Colorize;

/// Receives events worth telling the user about. Delivery is up to the implementation.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn updates_available(&self, count: usize);

    fn operation_complete(&self, operation: &str, success: bool);
}

/// Prints notifications to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn updates_message(count: usize) -> String {
        format!("{count} package(s) can be updated")
    }

    pub fn operation_message(operation: &str, success: bool) -> String {
        if success {
            format!("{operation} completed successfully")
        } else {
            format!("{operation} failed")
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn updates_available(&self, count: usize) {
        eprintln!(
            "{} {}",
            "Updates Available:".yellow().bold(),
            Self::updates_message(count)
        );
    }

    fn operation_complete(&self, operation: &str, success: bool) {
        let message = Self::operation_message(operation, success);
        if success {
            eprintln!("{} {message}", "Operation Complete:".green().bold());
        } else {
            eprintln!("{} {message}", "Operation Failed:".red().bold());
        }
    }
}

/// Announces pending updates when enabled and there is something to announce.
pub fn announce_updates(notifier: &dyn Notifier, enabled: bool, count: usize) -> bool {
    if !enabled || count == 0 {
        return false;
    }
    notifier.updates_available(count);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_messages() {
        assert_eq!(ConsoleNotifier::updates_message(3), "3 package(s) can be updated");
        assert_eq!(
            ConsoleNotifier::operation_message("Update all", true),
            "Update all completed successfully"
        );
        assert_eq!(ConsoleNotifier::operation_message("Remove vim", false), "Remove vim failed");
    }

    #[test]
    fn test_announce_only_when_enabled_and_nonzero() {
        let mut notifier = MockNotifier::new();
        notifier.expect_updates_available().with(eq(4usize)).times(1).return_const(());

        assert!(announce_updates(&notifier, true, 4));
        assert!(!announce_updates(&notifier, true, 0));
        assert!(!announce_updates(&notifier, false, 4));
    }
}
