//! Headless text-buffer surface
//!
//! [`BufferSurface`] keeps its document in a shared model so that insertion
//! callbacks can write back into it after the surface itself has been moved
//! into a session. [`BufferHandle`] plays the user: typing, moving the cursor
//! and asking for resource insertion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::surface::{
    ChangeListener, EditorSurface, InsertionCallback, SessionHooks, SurfaceFactory,
    SurfaceOptions,
};
use crate::EditorResult;

#[derive(Default)]
struct Model {
    text: String,
    /// Byte offset of the cursor, always on a char boundary
    cursor: usize,
    disposed: bool,
    focused: bool,
    listener: Option<ChangeListener>,
}

impl Model {
    fn clamp_cursor(&mut self) {
        let mut cursor = self.cursor.min(self.text.len());
        while !self.text.is_char_boundary(cursor) {
            cursor -= 1;
        }
        self.cursor = cursor;
    }
}

type SharedModel = Arc<Mutex<Model>>;

fn lock(model: &SharedModel) -> MutexGuard<'_, Model> {
    model.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Apply `edit` to a live model and notify its listener outside the lock.
/// Returns false when the model is already disposed.
fn mutate<F>(model: &SharedModel, edit: F) -> bool
where
    F: FnOnce(&mut Model),
{
    let (listener, text) = {
        let mut guard = lock(model);
        if guard.disposed {
            return false;
        }
        edit(&mut guard);
        guard.clamp_cursor();
        (guard.listener.clone(), guard.text.clone())
    };

    if let Some(listener) = listener {
        listener(text);
    }
    true
}

/// Text-buffer implementation of [`EditorSurface`]
pub struct BufferSurface {
    format: String,
    model: SharedModel,
    hooks: SessionHooks,
    live: Arc<AtomicUsize>,
}

impl BufferSurface {
    fn new(options: SurfaceOptions, live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            format: options.format,
            model: Arc::new(Mutex::new(Model::default())),
            hooks: options.hooks,
            live,
        }
    }

    /// A handle that drives this surface like a user would
    pub fn handle(&self) -> BufferHandle {
        BufferHandle {
            format: self.format.clone(),
            model: self.model.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl EditorSurface for BufferSurface {
    fn set_value(&mut self, text: &str) {
        let text = text.to_string();
        mutate(&self.model, move |model| {
            model.cursor = text.len();
            model.text = text;
        });
    }

    fn value(&self) -> String {
        lock(&self.model).text.clone()
    }

    fn focus(&mut self) {
        let mut model = lock(&self.model);
        if !model.disposed {
            model.focused = true;
        }
    }

    fn on_change(&mut self, listener: ChangeListener) {
        lock(&self.model).listener = Some(listener);
    }

    fn dispose(&mut self) {
        let mut model = lock(&self.model);
        if model.disposed {
            return;
        }
        model.disposed = true;
        model.focused = false;
        model.listener = None;
        model.text.clear();
        model.cursor = 0;
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    fn is_disposed(&self) -> bool {
        lock(&self.model).disposed
    }
}

/// User-side handle onto a [`BufferSurface`]
#[derive(Clone)]
pub struct BufferHandle {
    format: String,
    model: SharedModel,
    hooks: SessionHooks,
}

impl BufferHandle {
    /// Replace the whole text as if the user retyped it
    pub fn type_text(&self, text: &str) -> bool {
        let text = text.to_string();
        mutate(&self.model, move |model| {
            model.cursor = text.len();
            model.text = text;
        })
    }

    /// Insert text at the cursor
    pub fn insert(&self, text: &str) -> bool {
        let text = text.to_string();
        mutate(&self.model, move |model| {
            let at = model.cursor;
            model.text.insert_str(at, &text);
            model.cursor = at + text.len();
        })
    }

    /// Move the cursor to a byte offset, clamped to the document
    pub fn set_cursor(&self, offset: usize) {
        let mut model = lock(&self.model);
        model.cursor = offset;
        model.clamp_cursor();
    }

    /// Format the surface was created with
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn cursor(&self) -> usize {
        lock(&self.model).cursor
    }

    pub fn value(&self) -> String {
        lock(&self.model).text.clone()
    }

    pub fn is_disposed(&self) -> bool {
        lock(&self.model).disposed
    }

    pub fn is_focused(&self) -> bool {
        lock(&self.model).focused
    }

    /// Ask for a resource to be inserted at the current cursor.
    ///
    /// The delivered content lands at the offset captured now, even if the
    /// cursor moves while the dialog is open.
    pub fn request_insert_resource(&self) {
        let model = Arc::downgrade(&self.model);
        let at = self.cursor();

        self.hooks
            .insert_resource(InsertionCallback::new(move |content: String| {
                let Some(model) = model.upgrade() else {
                    return;
                };
                mutate(&model, |m| {
                    let at = {
                        let mut at = at.min(m.text.len());
                        while !m.text.is_char_boundary(at) {
                            at -= 1;
                        }
                        at
                    };
                    m.text.insert_str(at, &content);
                    m.cursor = at + content.len();
                });
            }));
    }

    /// Resolve a reference written in the document through the session
    pub async fn load_resource_detail(&self, reference: &str) -> EditorResult<String> {
        self.hooks.load_resource_detail(reference).await
    }
}

impl std::fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferHandle")
            .field("session_id", &self.hooks.session_id())
            .finish()
    }
}

/// Factory for [`BufferSurface`]s that keeps count of live surfaces
#[derive(Default)]
pub struct BufferSurfaceFactory {
    live: Arc<AtomicUsize>,
    created: AtomicUsize,
    /// Highest live count seen right after a construction
    peak_live: AtomicUsize,
    last: Mutex<Option<BufferHandle>>,
}

impl BufferSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces created and not yet disposed
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Largest number of surfaces that were ever live at once
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    /// Handle onto the most recently created surface
    pub fn last_handle(&self) -> Option<BufferHandle> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SurfaceFactory for BufferSurfaceFactory {
    fn create(&self, options: SurfaceOptions) -> EditorResult<Box<dyn EditorSurface>> {
        if self.live_count() > 0 {
            tracing::warn!(
                "Creating a surface while {} other(s) are still live",
                self.live_count()
            );
        }

        let surface = BufferSurface::new(options, self.live.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        self.peak_live
            .fetch_max(self.live_count(), Ordering::SeqCst);

        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(surface.handle());

        Ok(Box::new(surface))
    }
}
