//! Roomtick Core - per-room, per-tick simulation engine
//!
//! Each tick every room is processed independently: intents are read from an
//! immutable snapshot, movement is resolved for all creeps at once, damage is
//! applied and deaths dispatched, and every resulting change is staged in a
//! mutation buffer that is flushed to the store in one batch.

pub mod cancel;
pub mod combat;
pub mod config;
pub mod death;
pub mod error;
pub mod exits;
pub mod ids;
pub mod intent;
pub mod ledger;
pub mod model;
pub mod movement;
pub mod mutation;
pub mod notify;
pub mod pipeline;
pub mod position;
pub mod runner;
pub mod stats;
pub mod terrain;

pub use cancel::{CancelSource, CancelToken};
pub use combat::{apply_damage, AttackStep, CombatStep, DamageEvent};
pub use config::{CombatConfig, DeathConfig, EngineConfig, CONFIG_PATH};
pub use death::{
    dispatch_death, DeathOptions, DeathProcessor, DeathRecord, RecordingDeathProcessor,
    StandardDeathProcessor,
};
pub use error::{EngineError, StoreError};
pub use exits::{ExitDescriptor, ExitTarget, ExitTopology};
pub use ids::{ObjectId, RoomName, UserId};
pub use intent::{
    CreepIntent, IntentSnapshot, MoveIntent, ObjectIntent, PullIntent, RawIntent, UserIntents,
};
pub use ledger::{EnergyLedger, EnergyReason};
pub use model::*;
pub use movement::MovementStep;
pub use mutation::*;
pub use notify::{Notification, NotificationSink};
pub use pipeline::{
    CleanupStep, MapViewStep, Pipeline, RoomProcessorContext, RoomStep, StepPhase,
};
pub use position::{Direction, Edge, Position};
pub use runner::{process_room, RoomJob, RoomOutcome, TickReport, WorldRunner};
pub use stats::{MemoryStats, StatKind, StatsSink, TickStats};
pub use terrain::{Terrain, TerrainError, TerrainKind, DEFAULT_ROOM_SIZE};
