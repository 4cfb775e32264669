//! Hook for an external data-synchronisation collaborator.
//!
//! The facade notifies the collaborator after every successful reference
//! data write. No transport ships with this crate; [`NoopSync`] is the only
//! implementation.

/// How a collaborator intends to reconcile data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SyncStrategy {
    /// Replace every table.
    Full,
    /// Transfer only changes since the last sync.
    Incremental,
    /// Transfer explicitly requested records.
    OnDemand,
}

impl SyncStrategy {
    /// Stable name of the strategy.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::OnDemand => "on-demand",
        }
    }
}

/// Progress reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing pending.
    Idle,
    /// A transfer is running.
    InProgress,
    /// The last transfer finished.
    Completed,
    /// The last transfer failed.
    Failed(String),
}

/// Receives change notifications from the facade.
pub trait SyncCollaborator: Send + Sync {
    /// How this collaborator reconciles data.
    fn strategy(&self) -> SyncStrategy;

    /// Current status.
    fn status(&self) -> SyncStatus;

    /// Called after `table` changed in the store.
    fn reference_data_changed(&self, table: &'static str);
}

/// Collaborator that ignores every notification. Nothing moves unless a
/// host asks for it, so it reports [`SyncStrategy::OnDemand`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl SyncCollaborator for NoopSync {
    fn strategy(&self) -> SyncStrategy {
        SyncStrategy::OnDemand
    }

    fn status(&self) -> SyncStatus {
        SyncStatus::Idle
    }

    fn reference_data_changed(&self, table: &'static str) {
        log::trace!("sync disabled; ignoring change to {table}");
    }
}
