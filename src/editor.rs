//! Editor handle
//!
//! `Editor` wraps a `Session` behind a mutex and connects it to the outside
//! world: the persistence gateway, the change reporter, the sustained-press
//! timer and change subscribers. Clones share the same session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::client::{AnalyticsSink, Gateway};
use crate::gesture::{PressTimer, TokioPressTimer};
use crate::models::{GroupKey, MoveRecord, NavTree, TreeError};
use crate::reorder::{Drag, ReorderError};
use crate::reporter::Reporter;
use crate::seed::seed_tree;
use crate::session::{Mode, SaveOutcome, Session};

/// Default dwell before a held row switches to edit mode
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub long_press: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            long_press: DEFAULT_LONG_PRESS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("malformed navigation: {0}")]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Reorder(#[from] ReorderError),
}

/// Read-only copy of the session state for presentation
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub working: NavTree,
    pub mode: Mode,
    pub dirty: bool,
    pub degraded: bool,
    pub saving: bool,
    pub notice: Option<String>,
    pub pressed: Option<String>,
}

#[derive(Clone)]
pub struct Editor {
    inner: Arc<Mutex<Session>>,
    gateway: Arc<dyn Gateway>,
    reporter: Reporter,
    timer: Arc<dyn PressTimer>,
    config: EditorConfig,
    update_tx: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl Editor {
    pub fn new(
        session: Session,
        gateway: Arc<dyn Gateway>,
        sink: Arc<dyn AnalyticsSink>,
        config: EditorConfig,
    ) -> Self {
        // Create a broadcast channel with capacity for 100 messages
        let (tx, _rx) = tokio::sync::broadcast::channel(100);

        Self {
            inner: Arc::new(Mutex::new(session)),
            gateway,
            reporter: Reporter::new(sink),
            timer: Arc::new(TokioPressTimer::new()),
            config,
            update_tx: Arc::new(tx),
        }
    }

    /// Swaps in a different press timer
    pub fn with_timer(mut self, timer: Arc<dyn PressTimer>) -> Self {
        self.timer = timer;
        self
    }

    /// Fetches the tree and starts a session over it.
    ///
    /// An unreachable backend falls back to the seed tree in degraded mode. A
    /// server error starts an empty session carrying the error notice.
    pub async fn load(
        gateway: Arc<dyn Gateway>,
        sink: Arc<dyn AnalyticsSink>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let session = match gateway.fetch_tree().await {
            Ok(tree) => {
                tree.validate()?;
                Session::new(tree)
            }
            Err(e) if e.is_unavailable() => {
                tracing::info!("Server not available, using seed navigation: {}", e);
                Session::offline(seed_tree())
            }
            Err(e) => {
                tracing::error!("Failed to fetch navigation: {}", e);
                let mut session = Session::new(NavTree::default());
                session.set_notice(e.to_string());
                session
            }
        };

        Ok(Self::new(session, gateway, sink, config))
    }

    // Helper method to safely access the session and notify observers about state changes
    fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut session = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let result = f(&mut session);

        let _ = self.update_tx.send(());

        result
    }

    fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&session)
    }

    /// Subscribe to state updates
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.update_tx.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read(|s| Snapshot {
            working: s.working().clone(),
            mode: s.mode(),
            dirty: s.is_dirty(),
            degraded: s.is_degraded(),
            saving: s.is_saving(),
            notice: s.notice().map(str::to_string),
            pressed: s.pressed().map(str::to_string),
        })
    }

    pub fn working(&self) -> NavTree {
        self.read(|s| s.working().clone())
    }

    pub fn committed(&self) -> NavTree {
        self.read(|s| s.committed().clone())
    }

    pub fn mode(&self) -> Mode {
        self.read(Session::mode)
    }

    pub fn is_degraded(&self) -> bool {
        self.read(Session::is_degraded)
    }

    pub fn notice(&self) -> Option<String> {
        self.read(|s| s.notice().map(str::to_string))
    }

    // Mode

    pub fn enter_edit(&self) -> bool {
        self.with_session(Session::enter_edit)
    }

    pub fn toggle_edit(&self) -> Mode {
        self.with_session(Session::toggle_edit)
    }

    /// A row was pressed. Holding it for the configured dwell enters edit mode.
    pub fn press_start(&self, item_id: &str) {
        self.with_session(|s| s.press_started(item_id));

        let editor = self.clone();
        self.timer.start(
            self.config.long_press,
            Box::new(move || {
                if editor.with_session(Session::enter_edit) {
                    tracing::info!("long press, entering edit mode");
                }
            }),
        );
    }

    /// The row was released. Cancels a pending long press.
    pub fn press_end(&self) {
        self.timer.cancel();
        self.with_session(Session::press_ended);
    }

    // Mutations

    fn forward(&self, record: &Option<MoveRecord>) {
        if let Some(record) = record {
            self.reporter.report(record.clone(), self.is_degraded());
        }
    }

    /// Moves an item within one sibling group and reports the change
    pub fn move_item(
        &self,
        group: &GroupKey,
        from: usize,
        to: usize,
    ) -> Result<Option<MoveRecord>, EditorError> {
        let record = self.with_session(|s| s.move_item(group, from, to))?;
        self.forward(&record);
        Ok(record)
    }

    /// Applies a drag from the gesture layer and reports the change
    pub fn apply_drag(&self, drag: &Drag) -> Result<Option<MoveRecord>, EditorError> {
        let record = self.with_session(|s| s.apply_drag(drag))?;
        self.forward(&record);
        Ok(record)
    }

    pub fn set_visibility(&self, id: &str, visible: bool) -> bool {
        self.with_session(|s| s.set_visibility(id, visible))
    }

    pub fn toggle_visibility(&self, id: &str) -> bool {
        self.with_session(|s| s.toggle_visibility(id))
    }

    pub fn set_title(&self, id: &str, title: &str) -> bool {
        self.with_session(|s| s.set_title(id, title))
    }

    // Commit and revert

    /// Persists the working copy.
    ///
    /// Calls are serialized: a save issued while another is pending returns
    /// `SaveOutcome::AlreadySaving` without contacting the gateway.
    pub async fn save(&self) -> SaveOutcome {
        let Some((snapshot, degraded)) =
            self.with_session(|s| s.begin_save().map(|tree| (tree, s.is_degraded())))
        else {
            return SaveOutcome::AlreadySaving;
        };

        let result = if degraded {
            tracing::debug!("degraded mode, store skipped");
            Ok(())
        } else {
            self.gateway.store_tree(&snapshot).await
        };

        let outcome = self.with_session(|s| s.finish_save(snapshot, result));
        if let SaveOutcome::Failed(message) = &outcome {
            tracing::error!("Failed to save navigation: {}", message);
        }
        outcome
    }

    /// Drops every unsaved change and returns to viewing.
    ///
    /// Returns false while a save is in flight; nothing is dropped then.
    pub fn discard(&self) -> bool {
        self.with_session(Session::discard)
    }

    /// Refetches the tree. On failure the current state is kept.
    pub async fn reload(&self) -> Result<(), EditorError> {
        if self.is_degraded() {
            tracing::debug!("degraded mode, reload skipped");
            return Ok(());
        }

        match self.gateway.fetch_tree().await {
            Ok(tree) => {
                tree.validate()?;
                self.with_session(|s| s.replace_tree(tree));
            }
            Err(e) if e.is_unavailable() => {
                tracing::info!("Server not available, continuing offline: {}", e);
                self.with_session(Session::enter_degraded);
            }
            Err(e) => {
                tracing::error!("Failed to fetch navigation: {}", e);
                self.with_session(|s| s.set_notice(e.to_string()));
            }
        }
        Ok(())
    }

    /// Waits for outstanding analytics reports
    pub async fn flush_reports(&self) {
        self.reporter.flush().await;
    }
}
