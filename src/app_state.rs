use crate::form::EntryDraft;
use crate::log_entry::{LogEntry, NewLogEntry};

pub const INITIAL_LONGITUDE: f64 = -95.7129;
pub const INITIAL_LATITUDE: f64 = 37.0902;
pub const INITIAL_ZOOM: f64 = 3.5;
pub const LOCATE_ZOOM: f64 = 10.0;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 18.0;
const ZOOM_STEP: f64 = 0.5;
// Slippy maps stop short of the poles.
const MAX_PAN_LATITUDE: f64 = 85.0;

pub const LOAD_ERROR: &str = "Failed to load travel logs. Please try again.";
pub const LOCATE_ERROR: &str = "Unable to retrieve your location";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            longitude: INITIAL_LONGITUDE,
            latitude: INITIAL_LATITUDE,
            zoom: INITIAL_ZOOM,
        }
    }
}

impl ViewState {
    pub fn recenter(&mut self, latitude: f64, longitude: f64, zoom: f64) {
        self.latitude = latitude.clamp(-MAX_PAN_LATITUDE, MAX_PAN_LATITUDE);
        self.longitude = longitude;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn pan(&mut self, d_lon: f64, d_lat: f64) {
        self.longitude = wrap_longitude(self.longitude + d_lon);
        self.latitude = (self.latitude + d_lat).clamp(-MAX_PAN_LATITUDE, MAX_PAN_LATITUDE);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// UI focus. One variant at a time, so a pending pin and a selected
/// marker can never coexist.
#[derive(Debug)]
pub enum Focus {
    Idle,
    LocationPending {
        location: PendingLocation,
        draft: EntryDraft,
    },
    EntrySelected {
        id: String,
    },
}

pub struct AppState {
    pub entries: Vec<LogEntry>,
    pub viewport: ViewState,
    pub focus: Focus,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            entries: Vec::new(),
            viewport: ViewState::default(),
            focus: Focus::Idle,
            loading: false,
            error: None,
            notice: None,
        }
    }

    pub fn set_entries(&mut self, entries: Vec<LogEntry>) {
        self.entries = entries;
        self.error = None;
    }

    pub fn load_failed(&mut self) {
        self.error = Some(LOAD_ERROR.to_string());
    }

    pub fn open_pending(&mut self, latitude: f64, longitude: f64) {
        self.focus = Focus::LocationPending {
            location: PendingLocation {
                latitude,
                longitude,
            },
            draft: EntryDraft::new(),
        };
    }

    pub fn close_form(&mut self) {
        if matches!(self.focus, Focus::LocationPending { .. }) {
            self.focus = Focus::Idle;
        }
    }

    pub fn select_entry(&mut self, id: &str) {
        if self.entries.iter().any(|e| e.id == id) {
            self.focus = Focus::EntrySelected { id: id.to_string() };
        }
    }

    pub fn close_popup(&mut self) {
        if matches!(self.focus, Focus::EntrySelected { .. }) {
            self.focus = Focus::Idle;
        }
    }

    pub fn selected_entry(&self) -> Option<&LogEntry> {
        match &self.focus {
            Focus::EntrySelected { id } => self.entries.iter().find(|e| &e.id == id),
            _ => None,
        }
    }

    pub fn pending_location(&self) -> Option<PendingLocation> {
        match &self.focus {
            Focus::LocationPending { location, .. } => Some(*location),
            _ => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut EntryDraft> {
        match &mut self.focus {
            Focus::LocationPending { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Validates the open draft. When it passes, marks the draft as
    /// submitting and hands back the request to send; otherwise the
    /// per-field errors are left on the draft and nothing goes out.
    pub fn begin_submit(&mut self) -> Option<(String, NewLogEntry)> {
        let Focus::LocationPending { location, draft } = &mut self.focus else {
            return None;
        };
        if draft.submitting || !draft.validate() {
            return None;
        }
        draft.submit_error = None;
        draft.submitting = true;
        Some((
            draft.api_key.clone(),
            draft.to_request(location.latitude, location.longitude),
        ))
    }

    pub fn submit_failed(&mut self, message: String) {
        if let Focus::LocationPending { draft, .. } = &mut self.focus {
            draft.submit_error = Some(message);
            draft.submitting = false;
        }
    }

    pub fn locate_succeeded(&mut self, latitude: f64, longitude: f64) {
        self.viewport.recenter(latitude, longitude, LOCATE_ZOOM);
    }

    pub fn locate_failed(&mut self) {
        self.notice = Some(LOCATE_ERROR.to_string());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, latitude: f64, longitude: f64) -> LogEntry {
        LogEntry {
            id: id.to_string(),
            title: format!("entry {id}"),
            description: None,
            comments: None,
            image: None,
            rating: 7.0,
            latitude,
            longitude,
            visit_date: "2024-05-01".to_string(),
            created_at: "2024-05-02T10:00:00.000Z".to_string(),
            updated_at: "2024-05-02T10:00:00.000Z".to_string(),
        }
    }

    fn state_with_entries() -> AppState {
        let mut state = AppState::new();
        state.set_entries(vec![entry("a", 48.8584, 2.2945), entry("b", 40.7128, -74.006)]);
        state
    }

    #[test]
    fn double_click_yields_exactly_one_pending_location() {
        let mut state = state_with_entries();
        state.open_pending(10.0, 20.0);
        state.open_pending(30.0, 40.0);
        let pending = state.pending_location().unwrap();
        assert_eq!(pending.latitude, 30.0);
        assert_eq!(pending.longitude, 40.0);
        assert!(state.selected_entry().is_none());
    }

    #[test]
    fn selecting_marker_closes_pending_popup() {
        let mut state = state_with_entries();
        state.open_pending(10.0, 20.0);
        state.select_entry("a");
        assert!(state.pending_location().is_none());
        assert_eq!(state.selected_entry().unwrap().id, "a");
    }

    #[test]
    fn double_click_clears_selection() {
        let mut state = state_with_entries();
        state.select_entry("b");
        state.open_pending(10.0, 20.0);
        assert!(state.selected_entry().is_none());
        assert!(state.pending_location().is_some());
    }

    #[test]
    fn unknown_entry_is_not_selectable() {
        let mut state = state_with_entries();
        state.select_entry("missing");
        assert!(matches!(state.focus, Focus::Idle));
    }

    #[test]
    fn close_transitions_return_to_idle() {
        let mut state = state_with_entries();
        state.open_pending(10.0, 20.0);
        state.close_form();
        assert!(matches!(state.focus, Focus::Idle));

        state.select_entry("a");
        state.close_popup();
        assert!(matches!(state.focus, Focus::Idle));
    }

    #[test]
    fn locate_success_recenters_at_close_in_zoom() {
        let mut state = AppState::new();
        state.locate_succeeded(40.7128, -74.0060);
        assert_eq!(state.viewport.latitude, 40.7128);
        assert_eq!(state.viewport.longitude, -74.0060);
        assert_eq!(state.viewport.zoom, LOCATE_ZOOM);
        assert!(state.notice.is_none());
    }

    #[test]
    fn locate_failure_keeps_viewport_and_sets_notice() {
        let mut state = AppState::new();
        let before = state.viewport;
        state.locate_failed();
        assert_eq!(state.viewport, before);
        assert_eq!(state.notice.as_deref(), Some(LOCATE_ERROR));
    }

    #[test]
    fn zoom_and_pan_stay_clamped() {
        let mut view = ViewState::default();
        for _ in 0..100 {
            view.zoom_in();
        }
        assert_eq!(view.zoom, MAX_ZOOM);
        for _ in 0..100 {
            view.zoom_out();
        }
        assert_eq!(view.zoom, MIN_ZOOM);

        view.pan(0.0, 500.0);
        assert_eq!(view.latitude, 85.0);
        view.pan(0.0, -500.0);
        assert_eq!(view.latitude, -85.0);

        view.longitude = 179.0;
        view.pan(2.0, 0.0);
        assert_eq!(view.longitude, -179.0);
    }

    #[test]
    fn invalid_draft_blocks_submission() {
        let mut state = state_with_entries();
        state.open_pending(10.0, 20.0);
        assert!(state.begin_submit().is_none());
        let draft = state.draft_mut().unwrap();
        assert!(!draft.submitting);
        assert!(!draft.errors.is_empty());
    }

    #[test]
    fn valid_draft_submits_with_pending_coordinates() {
        let mut state = state_with_entries();
        state.open_pending(48.8584, 2.2945);
        {
            let draft = state.draft_mut().unwrap();
            draft.api_key = "secret".to_string();
            draft.title = "Eiffel Tower".to_string();
        }
        let (api_key, request) = state.begin_submit().unwrap();
        assert_eq!(api_key, "secret");
        assert_eq!(request.latitude, 48.8584);
        assert_eq!(request.longitude, 2.2945);
        assert!(state.draft_mut().unwrap().submitting);

        // a second submit is ignored while one is in flight
        assert!(state.begin_submit().is_none());
    }

    #[test]
    fn failed_submission_keeps_form_open_with_message() {
        let mut state = state_with_entries();
        state.open_pending(48.8584, 2.2945);
        {
            let draft = state.draft_mut().unwrap();
            draft.api_key = "secret".to_string();
            draft.title = "Eiffel Tower".to_string();
        }
        state.begin_submit().unwrap();
        state.submit_failed("Invalid API key".to_string());
        let draft = state.draft_mut().unwrap();
        assert_eq!(draft.submit_error.as_deref(), Some("Invalid API key"));
        assert!(!draft.submitting);
        assert!(state.pending_location().is_some());
    }
}
