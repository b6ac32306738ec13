//! The sync engine: locale trees, change detection, merging and the
//! two-phase orchestration on top of them.

pub mod detect;
pub mod hash;
pub mod locale_files;
pub mod manifest;
pub mod merge;
pub mod protect;
pub mod snapshot;
pub mod sync;
pub mod tree;

pub use detect::{ChangeSet, ForceRequest};
pub use merge::{MergeEngine, MergeOptions};
pub use protect::TextProtector;
pub use sync::{LanguageSummary, LegStatus, SyncOptions, SyncReport, Synchronizer};
pub use tree::{FlatTree, LocaleTree, TreeError};
