//! World runner: one tick over many rooms.
//!
//! Rooms share nothing but the config, the pipeline and the cross-room
//! queue, so each one runs as its own task. The queue is drained only after
//! every room has flushed.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::{
    CancelToken, DeathProcessor, EngineConfig, EngineError, ExitTopology, GlobalEnvelope,
    GlobalMutationQueue, GlobalMutationSink, MemoryStats, MutationStore, Notification, Pipeline,
    RoomBatch, RoomName, RoomProcessorContext, RoomState, StandardDeathProcessor, StatsSink,
    TickStats,
};

/// One room's input for a tick.
#[derive(Clone, Debug)]
pub struct RoomJob {
    pub state: RoomState,
    pub exits: ExitTopology,
}

impl RoomJob {
    /// Exits derived from the room name and terrain border.
    pub fn from_state(state: RoomState) -> Self {
        let exits = ExitTopology::from_grid(&state.room, &state.terrain);
        Self { state, exits }
    }
}

/// What a room produced once its buffer was flushed.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOutcome {
    pub room: RoomName,
    pub tick: u64,
    pub batch: RoomBatch,
    pub notifications: Vec<Notification>,
    pub stats: TickStats,
}

/// Result of a whole world tick.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TickReport {
    /// Per-room outcomes in room name order.
    pub rooms: Vec<RoomOutcome>,
    /// Cross-room mutations in the order they were applied.
    pub global: Vec<GlobalEnvelope>,
}

impl TickReport {
    pub fn room(&self, name: &RoomName) -> Option<&RoomOutcome> {
        self.rooms.iter().find(|r| &r.room == name)
    }
}

/// Runs the pipeline for one room and commits its buffer.
#[allow(clippy::too_many_arguments)]
pub async fn process_room(
    job: &RoomJob,
    config: &EngineConfig,
    pipeline: &Pipeline,
    death: &dyn DeathProcessor,
    store: &dyn MutationStore,
    stats: &dyn StatsSink,
    global: GlobalMutationSink,
    cancel: &CancelToken,
) -> Result<RoomOutcome, EngineError> {
    job.state.validate()?;

    let mut ctx = RoomProcessorContext::new(&job.state, &job.exits, config, death, global);
    pipeline.execute(&mut ctx, cancel)?;

    let batch = ctx.buffer.flush(store, cancel).await?;
    let tick_stats = std::mem::take(&mut ctx.stats);
    if !tick_stats.is_empty() {
        stats
            .record(&job.state.room, job.state.tick, tick_stats.clone())
            .await?;
    }

    let notifications = std::mem::take(&mut ctx.notifications).into_vec();
    tracing::info!(
        room = %job.state.room,
        tick = job.state.tick,
        changes = batch.changes.len(),
        notifications = notifications.len(),
        "Room tick processed"
    );

    Ok(RoomOutcome {
        room: job.state.room.clone(),
        tick: job.state.tick,
        batch,
        notifications,
        stats: tick_stats,
    })
}

/// Fans rooms out over tokio tasks, at most `max_parallel_rooms` at a time.
#[derive(Clone)]
pub struct WorldRunner {
    config: Arc<EngineConfig>,
    pipeline: Arc<Pipeline>,
    death: Arc<dyn DeathProcessor>,
    store: Arc<dyn MutationStore>,
    stats: Arc<dyn StatsSink>,
}

impl WorldRunner {
    pub fn new(config: EngineConfig, store: Arc<dyn MutationStore>) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(Pipeline::standard()),
            death: Arc::new(StandardDeathProcessor),
            store,
            stats: Arc::new(MemoryStats::new()),
        }
    }

    pub fn with_death_processor(mut self, death: Arc<dyn DeathProcessor>) -> Self {
        self.death = death;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Processes every room, then applies the cross-room queue in
    /// (origin room, emission order) order.
    ///
    /// A failed or cancelled room fails the tick before any cross-room
    /// mutation is applied. Rooms that already flushed stay flushed.
    pub async fn run_tick(
        &self,
        rooms: Vec<RoomJob>,
        cancel: &CancelToken,
    ) -> Result<TickReport, EngineError> {
        let mut queue = GlobalMutationQueue::new();
        let permits = Arc::new(Semaphore::new(self.config.max_parallel_rooms.max(1)));
        let mut tasks = JoinSet::new();

        for job in rooms {
            let sink = queue.sink(job.state.room.clone());
            let runner = self.clone();
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::Cancelled)?;
                process_room(
                    &job,
                    &runner.config,
                    &runner.pipeline,
                    runner.death.as_ref(),
                    runner.store.as_ref(),
                    runner.stats.as_ref(),
                    sink,
                    &cancel,
                )
                .await
            });
        }

        let mut outcomes = Vec::new();
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined? {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    tracing::warn!(error = %err, "Room tick failed");
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }
        cancel.check()?;

        outcomes.sort_by(|a, b| a.room.cmp(&b.room));
        let global = queue.drain();
        self.store.apply_global(&global).await?;
        tracing::info!(
            rooms = outcomes.len(),
            global = global.len(),
            "World tick complete"
        );

        Ok(TickReport {
            rooms: outcomes,
            global,
        })
    }
}

impl std::fmt::Debug for WorldRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldRunner")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
