//! Writer pipeline for the matching core: the durable journal, the
//! lossy broadcast fan-out, the append-only backup journal, and the
//! composite adaptor that fans a single call out to all three.
//!
//! None of these sit on the matching hot path. `exchange::Exchange`
//! holds one `Arc<dyn Writer>` (typically a `CompositeWriter`) and calls
//! it after releasing the per-book lock.

pub mod backup;
pub mod broadcast;
pub mod composite;
pub mod error;
pub mod events;
pub mod journal;
pub mod writer;

pub use backup::BackupWriter;
pub use broadcast::BroadcastWriter;
pub use composite::CompositeWriter;
pub use error::{StoreError, StoreResult};
pub use events::{WireEvent, WriterEvent};
pub use journal::{DurableJournal, QueuedDurableWriter};
pub use writer::Writer;
