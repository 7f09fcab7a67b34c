use chrono::Local;
use url::Url;

use crate::log_entry::NewLogEntry;

pub const MAX_RATING: u8 = 10;
const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ApiKey,
    Title,
    Description,
    Comments,
    Image,
    Rating,
    VisitDate,
}

impl Field {
    pub const ORDER: [Field; 7] = [
        Field::ApiKey,
        Field::Title,
        Field::Description,
        Field::Comments,
        Field::Image,
        Field::Rating,
        Field::VisitDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::ApiKey => "API Key",
            Field::Title => "Title",
            Field::Description => "Description",
            Field::Comments => "Comments",
            Field::Image => "Image URL",
            Field::Rating => "Rating",
            Field::VisitDate => "Visit Date",
        }
    }

    fn position(self) -> usize {
        Field::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Field {
        Field::ORDER[(self.position() + 1) % Field::ORDER.len()]
    }

    pub fn prev(self) -> Field {
        Field::ORDER[(self.position() + Field::ORDER.len() - 1) % Field::ORDER.len()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    pub api_key: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub rating: Option<String>,
    pub visit_date: Option<String>,
}

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::ApiKey => self.api_key.as_deref(),
            Field::Title => self.title.as_deref(),
            Field::Image => self.image.as_deref(),
            Field::Rating => self.rating.as_deref(),
            Field::VisitDate => self.visit_date.as_deref(),
            Field::Description | Field::Comments => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && self.title.is_none()
            && self.image.is_none()
            && self.rating.is_none()
            && self.visit_date.is_none()
    }
}

/// One in-progress travel-log form, tied to a pending map location.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub api_key: String,
    pub title: String,
    pub description: String,
    pub comments: String,
    pub image: String,
    pub rating: u8,
    pub visit_date: String,
    pub field: Field,
    pub cursor: usize,
    pub errors: FieldErrors,
    pub submitting: bool,
    pub submit_error: Option<String>,
}

impl EntryDraft {
    pub fn new() -> Self {
        EntryDraft {
            api_key: String::new(),
            title: String::new(),
            description: String::new(),
            comments: String::new(),
            image: String::new(),
            rating: DEFAULT_RATING,
            visit_date: Local::now().format("%Y-%m-%d").to_string(),
            field: Field::ApiKey,
            cursor: 0,
            errors: FieldErrors::default(),
            submitting: false,
            submit_error: None,
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::ApiKey => &self.api_key,
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Comments => &self.comments,
            Field::Image => &self.image,
            Field::VisitDate => &self.visit_date,
            Field::Rating => "",
        }
    }

    fn value_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::ApiKey => Some(&mut self.api_key),
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::Comments => Some(&mut self.comments),
            Field::Image => Some(&mut self.image),
            Field::VisitDate => Some(&mut self.visit_date),
            Field::Rating => None,
        }
    }

    fn active_len(&self) -> usize {
        self.value(self.field).chars().count()
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
        self.cursor = self.active_len();
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.prev();
        self.cursor = self.active_len();
    }

    pub fn insert(&mut self, c: char) {
        let cursor = self.cursor;
        if let Some(value) = self.value_mut(self.field) {
            let at = byte_index(value, cursor);
            value.insert(at, c);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let cursor = self.cursor;
        if let Some(value) = self.value_mut(self.field) {
            let at = byte_index(value, cursor - 1);
            value.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        let cursor = self.cursor;
        if cursor >= self.active_len() {
            return;
        }
        if let Some(value) = self.value_mut(self.field) {
            let at = byte_index(value, cursor);
            value.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.active_len() {
            self.cursor += 1;
        }
    }

    pub fn rating_up(&mut self) {
        if self.rating < MAX_RATING {
            self.rating += 1;
        }
    }

    pub fn rating_down(&mut self) {
        self.rating = self.rating.saturating_sub(1);
    }

    /// Runs the field rules, records per-field messages, and reports
    /// whether the draft may be submitted.
    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::default();
        if self.api_key.is_empty() {
            errors.api_key = Some("API Key is required".to_string());
        }
        if self.title.is_empty() {
            errors.title = Some("Title is required".to_string());
        }
        if !self.image.is_empty() && Url::parse(&self.image).is_err() {
            errors.image = Some("Must be a valid URL".to_string());
        }
        if self.rating > MAX_RATING {
            errors.rating = Some("Rating must be between 0 and 10".to_string());
        }
        if self.visit_date.is_empty() {
            errors.visit_date = Some("Visit date is required".to_string());
        }
        let ok = errors.is_empty();
        self.errors = errors;
        ok
    }

    pub fn to_request(&self, latitude: f64, longitude: f64) -> NewLogEntry {
        NewLogEntry {
            title: self.title.clone(),
            description: optional(&self.description),
            comments: optional(&self.comments),
            image: optional(&self.image),
            rating: f64::from(self.rating),
            latitude,
            longitude,
            visit_date: self.visit_date.clone(),
        }
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn byte_index(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(value.len())
}
