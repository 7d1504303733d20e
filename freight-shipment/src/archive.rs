use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use crate::models::{Package, PackageState};

pub const DEFAULT_ARCHIVE_AFTER_DAYS: i64 = 30;

/// When resolved packages (RECOVERED or LOST) move to ARCHIVED on their own
#[derive(Debug, Clone, Copy)]
pub struct ArchivePolicy {
    window: Duration,
}

impl ArchivePolicy {
    pub fn new(after_days: i64) -> Self {
        Self {
            window: Duration::days(after_days),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start of the archive window: arrival, or departure for packages lost
    /// before they ever arrived.
    pub fn due_at(&self, package: &Package) -> Option<DateTime<Utc>> {
        if !matches!(package.state, PackageState::Recovered | PackageState::Lost) {
            return None;
        }
        package
            .arrived_at
            .or(package.departed_at)
            .map(|start| start + self.window)
    }

    pub fn is_due(&self, package: &Package, now: DateTime<Utc>) -> bool {
        self.due_at(package).is_some_and(|due| due <= now)
    }

    /// Archive every due package in the slice. Returns the archived ids.
    pub fn sweep(&self, packages: &mut [Package], now: DateTime<Utc>) -> Vec<Uuid> {
        let mut archived = Vec::new();
        for package in packages.iter_mut() {
            if self.is_due(package, now) && package.archive(now).is_ok() {
                archived.push(package.id);
            }
        }
        archived
    }
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_AFTER_DAYS)
    }
}
