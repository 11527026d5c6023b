//! The progress event stream: everything an observer ever sees.
//!
//! For a single task the stream obeys a strict ordering contract:
//!
//! * `Started` occurs exactly once and precedes every `PageDone`;
//! * `PageDone` events carry strictly increasing 1-based indices with no
//!   gaps or repeats;
//! * exactly one of `Finished` / `Failed` terminates the stream, and no
//!   event follows it.
//!
//! One exception: when the source document cannot even be opened the total
//! page count is unknown, so the stream is a single `Failed` with no
//! `Started` before it.
//!
//! Events are serde-serializable so host applications can forward them over
//! whatever wire they use (IPC, WebSocket, log sink) without this crate
//! knowing anything about it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One progress event emitted by a conversion task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// The source opened successfully; `total` pages will be converted.
    Started { total: usize },

    /// Page `index` (1-based) was rendered and written to `path`.
    /// `completed` equals `index`: pages finish strictly in order.
    PageDone {
        index: usize,
        completed: usize,
        path: PathBuf,
    },

    /// All pages converted; images are in `output_dir`.
    Finished { total: usize, output_dir: PathBuf },

    /// The task aborted. Output already written for earlier pages remains
    /// on disk; there is no rollback.
    Failed { message: String },
}

impl ConversionEvent {
    /// `Finished` and `Failed` end the stream for a task instance.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversionEvent::Finished { .. } | ConversionEvent::Failed { .. }
        )
    }
}
