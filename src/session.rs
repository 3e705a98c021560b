// Editing sessions
// One open zettel: the composed editor over its content, the title, and
// debounced saving back to the store.

use crate::config::EditorConfig;
use crate::richtext::functionality::{ComposedEditor, RegistryError};
use crate::richtext::parser::{ParseError, parse_zettel};
use crate::richtext::schema::SchemaError;
use crate::richtext::serializer::{SerializeError, serialize_doc};
use crate::richtext::view::EditorView;
use crate::richtext::{EditorCallbacks, default_functionalities};
use crate::store::{StoreError, ZettelStore, ZettelUpdate};
use crate::zettel::{Zettel, ZettelId, is_blank};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("editor setup failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("cannot open zettel: {0}")]
    Parse(#[from] ParseError),
    #[error("cannot save zettel: {0}")]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Debounce bookkeeping for saving
#[derive(Debug, Clone)]
pub struct AutoSave {
    debounce: TimeDelta,
    /// When the content was last changed
    last_change: Option<DateTime<Utc>>,
    /// When the content was last successfully saved
    last_save: Option<DateTime<Utc>>,
    is_saving: bool,
    pending: bool,
    failed: bool,
}

impl AutoSave {
    pub fn new(debounce_ms: u64) -> Self {
        AutoSave {
            debounce: TimeDelta::milliseconds(i64::try_from(debounce_ms).unwrap_or(i64::MAX)),
            last_change: None,
            last_save: None,
            is_saving: false,
            pending: false,
            failed: false,
        }
    }

    pub fn mark_changed(&mut self, now: DateTime<Utc>) {
        self.last_change = Some(now);
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// A change is pending and nothing changed for the debounce period
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_change {
            Some(changed) if self.pending && !self.is_saving => now - changed >= self.debounce,
            _ => false,
        }
    }

    fn begin(&mut self) {
        self.is_saving = true;
        self.pending = false;
    }

    fn finish(&mut self, now: DateTime<Utc>, saved: bool) {
        self.is_saving = false;
        self.failed = !saved;
        if saved {
            self.last_save = Some(now);
        } else {
            self.pending = true;
        }
    }

    pub fn status_text(&self, now: DateTime<Utc>) -> String {
        if self.is_saving {
            return "Saving...".to_string();
        }
        if self.failed {
            return "save failed".to_string();
        }
        if self.pending {
            return "not saved".to_string();
        }
        match self.last_save {
            Some(saved) => format_time_since(saved, now),
            None => String::new(),
        }
    }
}

/// Human-readable age of a save
pub fn format_time_since(saved: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - saved).num_seconds().max(0);
    if secs < 60 {
        "saved just now".to_string()
    } else if secs < 3600 {
        format!("saved {} min ago", secs / 60)
    } else if secs < 86_400 {
        match secs / 3600 {
            1 => "saved 1 hour ago".to_string(),
            hours => format!("saved {} hours ago", hours),
        }
    } else {
        format!("saved {}", saved.format("%Y-%m-%d"))
    }
}

pub struct ZettelSession {
    id: ZettelId,
    store: Rc<dyn ZettelStore>,
    callbacks: EditorCallbacks,
    config: EditorConfig,
    editor: ComposedEditor,
    view: EditorView,
    title: String,
    /// What the store holds as far as this session knows
    saved: Zettel,
    autosave: AutoSave,
}

impl ZettelSession {
    /// Fetch zettel `id` and set up a fresh editor for it
    pub fn open(
        store: Rc<dyn ZettelStore>,
        id: ZettelId,
        callbacks: EditorCallbacks,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let zettel = store.fetch(id)?;
        let editor = default_functionalities(callbacks.clone(), config.trigger).build()?;
        let doc = match parse_zettel(editor.schema(), &zettel.content)? {
            Some(doc) => doc,
            None => editor.schema().empty_doc()?,
        };
        let view = editor.view(doc);
        info!("opened zettel {} ({} blocks)", id, zettel.content.len());

        Ok(ZettelSession {
            id,
            store,
            callbacks,
            autosave: AutoSave::new(config.save_debounce_ms),
            config,
            editor,
            view,
            title: zettel.title.clone(),
            saved: zettel,
        })
    }

    pub fn id(&self) -> ZettelId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn editor(&self) -> &ComposedEditor {
        &self.editor
    }

    pub fn view(&self) -> &EditorView {
        &self.view
    }

    /// Run `f` against the editor view, recording a change when the document
    /// differs afterwards
    pub fn edit<R>(&mut self, now: DateTime<Utc>, f: impl FnOnce(&mut EditorView) -> R) -> R {
        let before = self.view.state().doc().clone();
        let result = f(&mut self.view);
        if *self.view.state().doc() != before {
            self.autosave.mark_changed(now);
        }
        result
    }

    pub fn set_title(&mut self, title: &str, now: DateTime<Utc>) {
        if self.title != title {
            self.title = title.to_string();
            self.autosave.mark_changed(now);
        }
    }

    /// The zettel as it would be stored now. A document holding only an
    /// empty paragraph is stored as empty content.
    pub fn snapshot(&self) -> Result<Zettel, SessionError> {
        let mut content = serialize_doc(self.view.state().doc())?;
        if is_blank(&content) {
            content.clear();
        }
        Ok(Zettel::new(self.title.clone(), content))
    }

    /// Save if the debounce period has passed. Failures are logged and shown
    /// in the status text; the change stays pending.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.autosave.is_due(now) {
            return false;
        }
        match self.save(now) {
            Ok(saved) => saved,
            Err(err) => {
                warn!("saving zettel {} failed: {}", self.id, err);
                false
            }
        }
    }

    /// Save any pending change right away
    pub fn flush(&mut self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        if !self.autosave.is_pending() {
            return Ok(false);
        }
        self.save(now)
    }

    /// Flush and end the session
    pub fn close(mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.flush(now)?;
        info!("closed zettel {}", self.id);
        Ok(())
    }

    /// Flush this session and open `id` with a new editor. Nothing carries
    /// over but the store, callbacks and configuration.
    pub fn switch_to(mut self, id: ZettelId, now: DateTime<Utc>) -> Result<ZettelSession, SessionError> {
        if let Err(err) = self.flush(now) {
            warn!("discarding unsaved changes to zettel {}: {}", self.id, err);
        }
        info!("switching from zettel {} to {}", self.id, id);
        ZettelSession::open(self.store, id, self.callbacks, self.config)
    }

    pub fn status_text(&self, now: DateTime<Utc>) -> String {
        self.autosave.status_text(now)
    }

    fn save(&mut self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        let snapshot = self.snapshot()?;
        if snapshot == self.saved {
            debug!("zettel {} unchanged, skipping save", self.id);
            self.autosave.begin();
            self.autosave.finish(now, true);
            return Ok(false);
        }

        self.autosave.begin();
        let update = ZettelUpdate {
            title: Some(snapshot.title.clone()),
            content: Some(snapshot.content.clone()),
        };
        match self.store.update(self.id, update) {
            Ok(()) => {
                self.autosave.finish(now, true);
                self.saved = snapshot;
                debug!("saved zettel {}", self.id);
                Ok(true)
            }
            Err(err) => {
                self.autosave.finish(now, false);
                Err(err.into())
            }
        }
    }
}
