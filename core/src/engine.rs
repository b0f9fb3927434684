//! The planning engine: owns the session state and its persistence.
//!
//! EXECUTION ORDER for every command (fixed, never reordered):
//!   1. Run the pure lifecycle reducer against the current state.
//!   2. Build the event log entries and the scenario row diff.
//!   3. Persist everything in one SQLite transaction.
//!   4. Swap the new state in.
//!
//! RULES:
//!   - A command that fails at any step leaves state and database untouched.
//!   - All time and id generation flows through the injected sources.
//!   - Every committed change is recorded in the event log.

use crate::{
    baseline,
    clock::{Clock, IdGenerator, SystemClock, UuidGenerator},
    command::PlanCommand,
    config::PlanConfig,
    error::{PlanError, PlanResult},
    event::{EventLogEntry, PlanEvent},
    export::{self, Workbook},
    lifecycle::{self, Context},
    parameters::ParameterStore,
    scenario::ActiveScenario,
    snapshot::{self, SessionSnapshot},
    state::{AppState, LifecyclePhase},
    store::{BaselineImport, PlanStore, TransitionWrite},
    types::{Seq, SessionId},
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct PlanEngine {
    session_id: SessionId,
    config:     PlanConfig,
    state:      AppState,
    store:      PlanStore,
    clock:      Box<dyn Clock>,
    ids:        Box<dyn IdGenerator>,
    seq:        Seq,
}

impl PlanEngine {
    /// Start a new session with the system clock and random ids.
    pub fn new(session_id: SessionId, store: PlanStore, config: PlanConfig) -> PlanResult<Self> {
        Self::with_sources(
            session_id,
            store,
            config,
            Box::new(SystemClock),
            Box::new(UuidGenerator),
        )
    }

    /// Start a new session on the built-in baseline. The store must be
    /// migrated; the session row and `SessionStarted` are written here.
    pub fn with_sources(
        session_id: SessionId,
        store: PlanStore,
        config: PlanConfig,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> PlanResult<Self> {
        store.insert_session(&session_id, VERSION, &clock.now().to_rfc3339())?;

        let started = PlanEvent::SessionStarted {
            session_id: session_id.clone(),
        };
        store.append_event(&log_entry(&session_id, 0, &started)?)?;

        let state = AppState::new(baseline::generate_baseline(&config), &config);
        log::info!("session {session_id} started");
        Ok(Self {
            session_id,
            config,
            state,
            store,
            clock,
            ids,
            seq: 0,
        })
    }

    /// Resume a session from its latest snapshot, brought up to date with
    /// scenario rows and imports committed after it.
    pub fn restore(
        session_id: SessionId,
        store: PlanStore,
        config: PlanConfig,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> PlanResult<Self> {
        if !store.session_exists(&session_id)? {
            return Err(PlanError::Other(anyhow::anyhow!("unknown session '{session_id}'")));
        }

        let last_seq = store.last_seq(&session_id)?;
        let (snapshot_seq, state) = match store.latest_snapshot(&session_id)? {
            Some((seq, json)) => (seq, SessionSnapshot::from_json(&json)?.state),
            None => (0, AppState::new(baseline::generate_baseline(&config), &config)),
        };

        let state = if snapshot_seq < last_seq {
            let imported = match store.latest_baseline_import(&session_id)? {
                Some(import) => Some(serde_json::from_str::<ParameterStore>(&import.params_json)?),
                None => None,
            };
            let scenarios = store.load_scenarios(&session_id)?;
            let active = ActiveScenario::from_id(&store.active_scenario(&session_id)?);
            log::info!("session {session_id}: snapshot at {snapshot_seq}, log at {last_seq}; reconciling");
            state.reconciled(imported, scenarios, active, &config)
        } else {
            state
        };
        state.check_invariants()?;

        Ok(Self {
            session_id,
            config,
            state,
            store,
            clock,
            ids,
            seq: last_seq,
        })
    }

    /// Run one command to completion. Returns the events it emitted.
    pub fn execute(&mut self, command: &PlanCommand) -> PlanResult<Vec<PlanEvent>> {
        let transition = {
            let ctx = Context {
                config: &self.config,
                clock:  self.clock.as_ref(),
                ids:    self.ids.as_ref(),
            };
            lifecycle::reduce(&self.state, command, &ctx)?
        };

        let seq = self.seq + 1;
        self.persist(command, &transition.state, &transition.events, seq)?;

        log::debug!(
            "{} #{seq}: {} event(s), phase {:?}",
            command.name(),
            transition.events.len(),
            transition.state.phase()
        );
        self.state = transition.state;
        self.seq = seq;
        Ok(transition.events)
    }

    /// Step 3: write one transition. Nothing is written if any part fails.
    fn persist(
        &self,
        command: &PlanCommand,
        next: &AppState,
        events: &[PlanEvent],
        seq: Seq,
    ) -> PlanResult<()> {
        let mut write = TransitionWrite::default();
        for event in events {
            write.events.push(log_entry(&self.session_id, seq, event)?);
        }

        let before = self.state.scenarios();
        let after = next.scenarios();
        write.upserted = after
            .iter()
            .filter(|s| before.get(&s.id) != Some(*s))
            .collect();
        write.deleted = before
            .iter()
            .filter(|s| !after.contains(&s.id))
            .map(|s| s.id.as_str())
            .collect();
        if next.active() != self.state.active() {
            write.active = Some(next.active().id());
        }

        if let PlanCommand::ImportPopulation { rows } = command {
            write.baseline_import = Some(BaselineImport {
                seq,
                row_count:   rows.len(),
                params_json: serde_json::to_string(next.baseline())?,
            });
        }

        if snapshot::is_due(seq, self.config.snapshot_interval) {
            let snapshot = SessionSnapshot {
                session_id: self.session_id.clone(),
                seq,
                state:      next.clone(),
            };
            write.snapshot = Some((seq, snapshot.to_json()?));
        }

        if write.is_empty() {
            return Ok(());
        }
        self.store.persist_transition(&self.session_id, &write)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.state.phase()
    }

    /// Number of committed commands.
    pub fn seq(&self) -> Seq {
        self.seq
    }

    /// The persisted event log of this session, oldest first.
    pub fn events(&self) -> PlanResult<Vec<EventLogEntry>> {
        self.store.events_for_session(&self.session_id)
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    /// Give the store back, e.g. to restore the session from it.
    pub fn into_store(self) -> PlanStore {
        self.store
    }

    /// Spreadsheet export of a stored scenario or the baseline.
    pub fn export(&self, scenario_id: &str) -> PlanResult<Workbook> {
        export::build_workbook(&self.state, &self.config, scenario_id, self.clock.now().date_naive())
    }
}

fn log_entry(session_id: &str, seq: Seq, event: &PlanEvent) -> PlanResult<EventLogEntry> {
    Ok(EventLogEntry {
        id:         None,
        session_id: session_id.to_string(),
        seq,
        event_type: event.type_name().to_string(),
        payload:    serde_json::to_string(event)?,
    })
}
