mod applier;
mod playlist_rewrite;

pub use applier::{AppliedFix, FixApplier, FixBatchSummary, FixError, FixItemError};
pub use playlist_rewrite::{backup_path, ensure_backup, rewrite_path, unescape_xml_attribute};
