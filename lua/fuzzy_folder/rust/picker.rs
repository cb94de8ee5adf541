use crate::config::PickerConfig;
use crate::decoder::decode_list;
use crate::error::{Error, Result};
use crate::filter::{FuzzyFilter, FzfFilter};
use crate::lister::{FdLister, FolderLister};
use crate::process::CancelToken;
use crate::types::{RawListing, RequestId};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use tracing::{debug, error, info, warn};

/// The host editor's quick-pick widget, as far as the picker drives it.
///
/// `set_items` and `show_error` may be called from filter worker threads.
pub trait QuickPick: Send + Sync + 'static {
    fn show(&self, items: Vec<String>);
    fn set_items(&self, request: RequestId, query: &str, items: Vec<String>);
    fn hide(&self);
    fn show_error(&self, message: &str);
}

#[derive(Debug, Default)]
enum PickerState {
    #[default]
    Idle,
    Picking(Session),
}

#[derive(Debug)]
struct Session {
    listing: RawListing,
    latest: Option<RequestId>,
    in_flight: Option<CancelToken>,
}

impl Session {
    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }
}

struct Shared<F, W> {
    config: PickerConfig,
    filter: F,
    widget: W,
    state: Mutex<PickerState>,
    next_request: AtomicU64,
}

impl<F: FuzzyFilter + 'static, W: QuickPick> Shared<F, W> {
    fn lock_state(&self) -> Result<MutexGuard<'_, PickerState>> {
        self.state
            .lock()
            .map_err(|_| Error::Poisoned("picker state"))
    }

    fn complete_request(
        &self,
        request: RequestId,
        query: &str,
        listing: &RawListing,
        cancel: &CancelToken,
    ) {
        let result = self
            .filter
            .filter(listing, query, cancel)
            .map(|bytes| decode_list(&bytes, self.config.limits));

        let Ok(mut state) = self.lock_state() else {
            error!("Picker state poisoned, dropping result for {}", request);
            return;
        };

        let is_latest = match &mut *state {
            PickerState::Picking(session) if session.latest == Some(request) => {
                session.in_flight = None;
                true
            }
            _ => false,
        };

        if !is_latest {
            debug!("FILTER_STALE: dropping result for {} ('{}')", request, query);
            return;
        }

        match result {
            Ok(items) => {
                debug!("FILTER_APPLY: {} ('{}') -> {} items", request, query, items.len());
                self.widget.set_items(request, query, items);
            }
            Err(Error::Cancelled) => {
                debug!("FILTER_CANCELLED: {} ('{}')", request, query);
            }
            Err(e) => {
                error!("FILTER_ERROR: {} ('{}') failed: {}", request, query, e);
                self.close_with_error(&mut state, &e);
            }
        }
    }

    fn close_with_error(&self, state: &mut PickerState, err: &Error) {
        if let PickerState::Picking(session) = state {
            session.cancel_in_flight();
        }
        *state = PickerState::Idle;
        self.widget.hide();
        self.widget.show_error(&err.to_string());
    }

    /// Closes the session with `err` if `request` is still its newest request.
    fn abandon_request(&self, request: RequestId, err: &Error) -> bool {
        let Ok(mut state) = self.lock_state() else {
            return false;
        };
        let is_latest =
            matches!(&*state, PickerState::Picking(session) if session.latest == Some(request));
        if is_latest {
            self.close_with_error(&mut state, err);
        }
        is_latest
    }
}

/// The folder-picking command: lists folders once per invocation, then
/// re-filters that listing on every input change.
///
/// Filter results are applied only when they belong to the newest request;
/// issuing a request kills the child of the one it supersedes.
pub struct FolderPicker<L, F, W> {
    lister: L,
    shared: Arc<Shared<F, W>>,
}

impl<L, F, W> std::fmt::Debug for FolderPicker<L, F, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderPicker")
            .field("base_dir", &self.shared.config.base_dir)
            .field("next_request", &self.shared.next_request)
            .finish_non_exhaustive()
    }
}

impl<W: QuickPick> FolderPicker<FdLister, FzfFilter, W> {
    pub fn from_config(config: PickerConfig, widget: W) -> Result<Self> {
        let lister = FdLister::new(&config);
        let filter = FzfFilter::new(&config);
        Self::new(config, lister, filter, widget)
    }
}

impl<L, F, W> FolderPicker<L, F, W>
where
    L: FolderLister,
    F: FuzzyFilter + 'static,
    W: QuickPick,
{
    pub fn new(config: PickerConfig, lister: L, filter: F, widget: W) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing FolderPicker with base_dir: {}",
            config.base_dir.display()
        );

        Ok(Self {
            lister,
            shared: Arc::new(Shared {
                config,
                filter,
                widget,
                state: Mutex::new(PickerState::Idle),
                next_request: AtomicU64::new(0),
            }),
        })
    }

    pub fn config(&self) -> &PickerConfig {
        &self.shared.config
    }

    pub fn widget(&self) -> &W {
        &self.shared.widget
    }

    pub fn is_picking(&self) -> bool {
        self.shared
            .lock_state()
            .map(|state| matches!(*state, PickerState::Picking(_)))
            .unwrap_or(false)
    }

    pub fn latest_request(&self) -> Option<RequestId> {
        let state = self.shared.lock_state().ok()?;
        match &*state {
            PickerState::Picking(session) => session.latest,
            PickerState::Idle => None,
        }
    }

    /// Opens the picker with a fresh listing, replacing any open session.
    ///
    /// Listing failures are reported to the widget and leave the picker idle.
    pub fn invoke(&self) -> Result<Vec<String>> {
        let replaced = self.close_session();
        if replaced {
            debug!("INVOKE: replacing the open session");
        }

        let listing = match self.lister.list_folders() {
            Ok(listing) => listing,
            Err(e) => {
                error!("INVOKE: folder listing failed: {}", e);
                if replaced {
                    self.shared.widget.hide();
                }
                self.shared.widget.show_error(&e.to_string());
                return Err(e);
            }
        };

        let items = decode_list(listing.as_bytes(), self.shared.config.limits);
        info!(
            "INVOKE: showing {} of the listed folders ({} bytes)",
            items.len(),
            listing.len()
        );

        let mut state = self.shared.lock_state()?;
        *state = PickerState::Picking(Session {
            listing,
            latest: None,
            in_flight: None,
        });
        self.shared.widget.show(items.clone());

        Ok(items)
    }

    /// Starts filtering the session's listing with `query` on a worker thread.
    pub fn on_input_change(&self, query: &str) -> Result<RequestId> {
        let token = CancelToken::new();

        let (request, listing) = {
            let mut state = self.shared.lock_state()?;
            let PickerState::Picking(session) = &mut *state else {
                return Err(Error::NotPicking);
            };
            let request = RequestId(self.shared.next_request.fetch_add(1, Ordering::Relaxed) + 1);
            session.cancel_in_flight();
            session.latest = Some(request);
            session.in_flight = Some(token.clone());
            (request, session.listing.clone())
        };

        debug!("FILTER_START: {} query='{}'", request, query);

        let shared = Arc::clone(&self.shared);
        let query = query.to_string();
        let spawned = thread::Builder::new()
            .name(format!("fuzzy-folder-filter-{}", request.0))
            .spawn(move || shared.complete_request(request, &query, &listing, &token));

        if let Err(e) = spawned {
            let err = Error::io("filter worker", e);
            error!("FILTER_ERROR: {} could not start: {}", request, err);
            self.shared.abandon_request(request, &err);
            return Err(err);
        }

        Ok(request)
    }

    /// Closes the picker and returns the folder `selection` names, if any.
    pub fn accept(&self, selection: Option<&str>) -> Result<Option<PathBuf>> {
        {
            let mut state = self.shared.lock_state()?;
            match std::mem::take(&mut *state) {
                PickerState::Picking(mut session) => session.cancel_in_flight(),
                PickerState::Idle => return Err(Error::NotPicking),
            }
        }
        self.shared.widget.hide();

        let folder = selection
            .filter(|label| !label.trim().is_empty())
            .map(|label| self.shared.config.resolve(label));

        match &folder {
            Some(path) => info!("ACCEPT: {}", path.display()),
            None => info!("ACCEPT: nothing selected"),
        }
        Ok(folder)
    }

    /// Closes the picker without a selection. Returns whether one was open.
    pub fn dismiss(&self) -> bool {
        let closed = self.close_session();
        if closed {
            debug!("DISMISS: picker closed");
            self.shared.widget.hide();
        }
        closed
    }

    fn close_session(&self) -> bool {
        let mut state = match self.shared.lock_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("Cannot close picker session: {}", e);
                return false;
            }
        };
        match std::mem::take(&mut *state) {
            PickerState::Picking(mut session) => {
                session.cancel_in_flight();
                true
            }
            PickerState::Idle => false,
        }
    }
}

impl<L, F, W> Drop for FolderPicker<L, F, W> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            if let PickerState::Picking(session) = &mut *state {
                session.cancel_in_flight();
            }
            *state = PickerState::Idle;
        }
    }
}
