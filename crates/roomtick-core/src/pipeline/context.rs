use std::collections::BTreeMap;

use crate::combat::DamageEvent;
use crate::{
    DeathProcessor, EnergyLedger, EngineConfig, ExitTopology, GlobalMutationSink, MutationBuffer,
    NotificationSink, ObjectId, PendingView, RoomEvent, RoomState, TickStats,
};

/// Everything a step may touch while processing one room for one tick.
///
/// The snapshot is borrowed immutably; every effect goes into the buffer or
/// one of the sinks, all of which are owned by this context alone.
pub struct RoomProcessorContext<'a> {
    pub state: &'a RoomState,
    pub exits: &'a ExitTopology,
    pub config: &'a EngineConfig,
    pub death: &'a dyn DeathProcessor,
    pub buffer: MutationBuffer,
    pub stats: TickStats,
    pub global: GlobalMutationSink,
    pub notifications: NotificationSink,
    pub events: Vec<RoomEvent>,
    pub damage: Vec<DamageEvent>,
    ledgers: BTreeMap<ObjectId, EnergyLedger>,
}

impl<'a> RoomProcessorContext<'a> {
    pub fn new(
        state: &'a RoomState,
        exits: &'a ExitTopology,
        config: &'a EngineConfig,
        death: &'a dyn DeathProcessor,
        global: GlobalMutationSink,
    ) -> Self {
        Self {
            state,
            exits,
            config,
            death,
            buffer: MutationBuffer::new(state.room.clone(), state.tick),
            stats: TickStats::new(),
            global,
            notifications: NotificationSink::new(),
            events: Vec::new(),
            damage: Vec::new(),
            ledgers: BTreeMap::new(),
        }
    }

    pub fn view(&self) -> PendingView<'_> {
        PendingView::new(self.state, &self.buffer)
    }

    pub fn ledger_mut(&mut self, id: &ObjectId) -> &mut EnergyLedger {
        self.ledgers.entry(id.clone()).or_default()
    }

    /// Hands the accumulated ledger of `id` to a consumer; later calls see an
    /// empty one.
    pub fn take_ledger(&mut self, id: &ObjectId) -> EnergyLedger {
        self.ledgers.remove(id).unwrap_or_default()
    }
}
