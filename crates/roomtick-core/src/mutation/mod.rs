//! Per-tick output staging: object patches, the buffer that coalesces them,
//! the cross-room queue and the durable store contract.

mod buffer;
mod fate;
mod global;
mod patch;
mod room;
mod store;
mod view;

pub use buffer::MutationBuffer;
pub use fate::ObjectFate;
pub use global::{GlobalEnvelope, GlobalMutation, GlobalMutationQueue, GlobalMutationSink};
pub use patch::ObjectPatch;
pub use room::{AttackType, MapView, RoomEvent, RoomInfoPatch};
pub use store::{MemoryStore, MutationStore, ObjectChange, PendingChange, RoomBatch, StoredRoom};
pub use view::PendingView;
