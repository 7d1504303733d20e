pub mod events;

pub use events::{Counterpart, NotificationKind, PackageNotification};
