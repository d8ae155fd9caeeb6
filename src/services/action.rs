use std::fmt;

/// Lifecycle phase of a service batch.
///
/// Normal flow is `Check` then `Run`. `Recover` is a conditional side branch
/// after a failed check; `Rollback` is the compensation branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceAction {
    Check,
    Recover,
    Run,
    Rollback,
}

impl ServiceAction {
    /// Returns a short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceAction::Check => "check",
            ServiceAction::Recover => "recover",
            ServiceAction::Run => "run",
            ServiceAction::Rollback => "rollback",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceAction::Check => "CHECK",
            ServiceAction::Recover => "RECOVER",
            ServiceAction::Run => "RUN",
            ServiceAction::Rollback => "ROLLBACK",
        })
    }
}
