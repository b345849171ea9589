//! Admin-side list editor: load a collection, edit it row by row, validate,
//! and post the whole collection back.
//!
//! Rows carry a synthetic [`RowKey`] so removal and edits never depend on
//! their position. Every mutation re-renders the editor's own container.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::csrf::CsrfSource;
use crate::dom::{escape, Container, Fragment};
use crate::error::{EditorError, FetchError};
use crate::notify::{NoticeKind, Notifier};
use crate::record::{extract_collection, value_text, Record, RowKey};
use crate::transport::{Transport, WriteResponse, CSRF_HEADER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    LongText,
    Url,
    Date,
    /// Boolean checkbox. A toggled value is written as a JSON bool.
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self { name: name.to_string(), label: label.to_string(), kind, required: false }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Text shown in the input for `record`.
    fn display(&self, record: &Record) -> String {
        match self.kind {
            FieldKind::Flag => record.flag(&self.name).to_string(),
            _ => record.text(&self.name),
        }
    }

    /// What an input holds when the field was never set.
    fn blank(&self) -> &'static str {
        match self.kind {
            FieldKind::Flag => "false",
            _ => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub name: String,
    pub read_url: String,
    pub write_url: String,
    /// Set when the read endpoint nests the array under a field.
    pub collection_field: Option<String>,
    pub fields: Vec<FieldSpec>,
}

/// User-facing notification texts.
#[derive(Debug, Clone)]
pub struct Messages {
    pub saved: String,
    pub rejected_prefix: String,
    /// Used when a rejection carries no message of its own.
    pub rejected_generic: String,
    pub network: String,
    pub invalid_response: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            saved: "Cambios guardados correctamente".to_string(),
            rejected_prefix: "Error al guardar: ".to_string(),
            rejected_generic: "el servidor rechazó los cambios".to_string(),
            network: "Error de red: no se pudo contactar con el servidor".to_string(),
            invalid_response: "Respuesta inválida del servidor".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Submitting,
}

/// One editable row.
#[derive(Debug, Clone)]
pub struct Row {
    key: RowKey,
    values: Vec<(String, String)>,
    original: Record,
    missing: Vec<String>,
}

impl Row {
    fn from_record(fields: &[FieldSpec], record: Record) -> Self {
        let values = fields.iter().map(|f| (f.name.clone(), f.display(&record))).collect();
        Self { key: RowKey::generate(), values, original: record, missing: Vec::new() }
    }

    pub fn key(&self) -> RowKey { self.key }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.iter().find(|(n, _)| n == field).map(|(_, v)| v.as_str())
    }

    /// Required fields that were empty at the last validation pass.
    pub fn missing_fields(&self) -> &[String] { &self.missing }

    /// Current row state as a record. Fields outside the editor's schema
    /// are carried through from the loaded record.
    fn to_record(&self, fields: &[FieldSpec]) -> Record {
        let mut record = self.original.clone();
        for (spec, (_, raw)) in fields.iter().zip(&self.values) {
            let text = raw.trim();
            match record.get(&spec.name) {
                None if text == spec.blank() => continue,
                // unchanged: keep the original JSON type
                Some(v) if spec.kind != FieldKind::Flag && value_text(v).trim() == text && !v.is_string() => continue,
                // untouched checkbox: keep whatever spelling the record used
                Some(_) if spec.kind == FieldKind::Flag && spec.display(&self.original) == text => continue,
                _ => {}
            }
            let value = match spec.kind {
                FieldKind::Flag => Value::Bool(text == "true"),
                _ => Value::String(text.to_string()),
            };
            record.insert(&spec.name, value);
        }
        record.trim_strings();
        record
    }
}

fn missing_required(fields: &[FieldSpec], record: &Record) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.required && record.text(&f.name).trim().is_empty())
        .map(|f| f.name.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved { sent: usize, skipped: usize },
    /// The server answered `success: false` (or an HTTP error).
    Rejected { message: String },
    Network,
    InvalidResponse,
}

/// Resets the request slot to `Idle` and re-enables the rendered controls,
/// even when the future is dropped mid-flight.
struct InFlight<'a> {
    editor: &'a ListEditor,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(&self.editor.state) = RequestState::Idle;
        self.editor.render();
    }
}

pub struct ListEditor {
    config: EditorConfig,
    transport: Arc<dyn Transport>,
    container: Arc<dyn Container>,
    notifier: Arc<dyn Notifier>,
    csrf: Arc<dyn CsrfSource>,
    messages: Messages,
    rows: Mutex<Vec<Row>>,
    state: Mutex<RequestState>,
}

impl ListEditor {
    pub fn new(
        config: EditorConfig,
        transport: Arc<dyn Transport>,
        container: Arc<dyn Container>,
        notifier: Arc<dyn Notifier>,
        csrf: Arc<dyn CsrfSource>,
    ) -> Self {
        Self {
            config,
            transport,
            container,
            notifier,
            csrf,
            messages: Messages::default(),
            rows: Mutex::new(Vec::new()),
            state: Mutex::new(RequestState::Idle),
        }
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &EditorConfig { &self.config }
    pub fn state(&self) -> RequestState { *lock(&self.state) }

    /// Add/remove/save controls are enabled only while idle.
    pub fn controls_enabled(&self) -> bool { self.state() == RequestState::Idle }

    pub fn rows(&self) -> Vec<Row> { lock(&self.rows).clone() }
    pub fn row_count(&self) -> usize { lock(&self.rows).len() }

    /// Replaces all rows with the collection from the read endpoint.
    /// A failed read leaves an empty, still editable list. Returns the row count.
    pub async fn load(&self) -> Result<usize, EditorError> {
        let flight = self.begin(RequestState::Loading)?;
        self.render();
        let records = match self.fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!(editor = %self.config.name, error = %e, "load failed, starting with an empty list");
                Vec::new()
            }
        };
        Ok(self.install(records, flight))
    }

    /// Like [`load`](Self::load), but a failed read is returned as
    /// [`EditorError::Fetch`] and the current rows are kept.
    pub async fn try_load(&self) -> Result<usize, EditorError> {
        let flight = self.begin(RequestState::Loading)?;
        self.render();
        let records = self.fetch().await?;
        Ok(self.install(records, flight))
    }

    fn install(&self, records: Vec<Record>, flight: InFlight<'_>) -> usize {
        let rows: Vec<Row> = records.into_iter().map(|r| Row::from_record(&self.config.fields, r)).collect();
        let count = rows.len();
        *lock(&self.rows) = rows;
        debug!(editor = %self.config.name, count, "rows loaded");
        drop(flight);
        count
    }

    async fn fetch(&self) -> Result<Vec<Record>, FetchError> {
        let doc = self.transport.get_json(&self.config.read_url).await?;
        extract_collection(doc, self.config.collection_field.as_deref())
    }

    /// Appends a row pre-filled from `initial` (blank for unset fields).
    pub fn add_row(&self, initial: Record) -> Result<RowKey, EditorError> {
        self.ensure_idle()?;
        let row = Row::from_record(&self.config.fields, initial);
        let key = row.key;
        lock(&self.rows).push(row);
        self.render();
        Ok(key)
    }

    /// Detaches a row. Returns false when the key is unknown.
    pub fn remove_row(&self, key: RowKey) -> Result<bool, EditorError> {
        self.ensure_idle()?;
        let removed = {
            let mut rows = lock(&self.rows);
            let before = rows.len();
            rows.retain(|r| r.key != key);
            rows.len() != before
        };
        if removed { self.render(); }
        Ok(removed)
    }

    /// Writes an operator's input into a row. Returns false for an unknown
    /// row or a field outside the schema.
    pub fn set_field(&self, key: RowKey, field: &str, value: &str) -> bool {
        let mut rows = lock(&self.rows);
        let Some(row) = rows.iter_mut().find(|r| r.key == key) else { return false };
        let Some(slot) = row.values.iter_mut().find(|(n, _)| n == field) else { return false };
        slot.1 = value.to_string();
        true
    }

    /// Validation pass: returns the records that would be sent and the keys
    /// of the rows that were excluded. Excluded rows are marked invalid.
    pub fn payload(&self) -> (Vec<Record>, Vec<RowKey>) {
        let fields = &self.config.fields;
        let mut rows = lock(&self.rows);
        let mut valid = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();
        for row in rows.iter_mut() {
            let record = row.to_record(fields);
            row.missing = missing_required(fields, &record);
            if row.missing.is_empty() { valid.push(record) } else { rejected.push(row.key) }
        }
        (valid, rejected)
    }

    /// Validates and posts the collection, then reports the result through
    /// the notifier. Rows are left as they are whatever the outcome.
    pub async fn submit(&self) -> Result<SubmitOutcome, EditorError> {
        let flight = self.begin(RequestState::Submitting)?;
        let (records, rejected) = self.payload();
        self.render();
        if !rejected.is_empty() {
            warn!(editor = %self.config.name, skipped = rejected.len(), "rows with empty required fields excluded from save");
        }
        let sent = records.len();
        let body = Value::Array(records.into_iter().map(Value::from).collect());

        let mut headers = Vec::new();
        match self.csrf.token() {
            Some(token) => headers.push((CSRF_HEADER.to_string(), token)),
            None => warn!(editor = %self.config.name, "no anti-forgery token on the page"),
        }

        let outcome = match self.transport.post_json(&self.config.write_url, &headers, &body).await {
            Ok(reply) => match serde_json::from_value::<WriteResponse>(reply) {
                Ok(r) if r.success => SubmitOutcome::Saved { sent, skipped: rejected.len() },
                Ok(r) => SubmitOutcome::Rejected {
                    message: r
                        .message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| self.messages.rejected_generic.clone()),
                },
                Err(_) => SubmitOutcome::InvalidResponse,
            },
            Err(e) if e.is_transport() => {
                warn!(editor = %self.config.name, error = %e, "save request failed");
                SubmitOutcome::Network
            }
            Err(e @ FetchError::Parse { .. }) => {
                warn!(editor = %self.config.name, error = %e, "unreadable save response");
                SubmitOutcome::InvalidResponse
            }
            Err(e) => SubmitOutcome::Rejected { message: e.to_string() },
        };
        self.report(&outcome);
        drop(flight);
        Ok(outcome)
    }

    fn report(&self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Saved { sent, .. } => {
                info!(editor = %self.config.name, sent, "collection saved");
                self.notifier.notify(NoticeKind::Success, &self.messages.saved);
            }
            SubmitOutcome::Rejected { message } => {
                warn!(editor = %self.config.name, %message, "save rejected");
                self.notifier.notify(NoticeKind::Error, &format!("{}{}", self.messages.rejected_prefix, message));
            }
            SubmitOutcome::Network => self.notifier.notify(NoticeKind::Network, &self.messages.network),
            SubmitOutcome::InvalidResponse => self.notifier.notify(NoticeKind::Error, &self.messages.invalid_response),
        }
    }

    fn ensure_idle(&self) -> Result<(), EditorError> {
        match self.state() {
            RequestState::Idle => Ok(()),
            busy => Err(EditorError::Busy(busy)),
        }
    }

    fn begin(&self, next: RequestState) -> Result<InFlight<'_>, EditorError> {
        let mut state = lock(&self.state);
        if *state != RequestState::Idle {
            return Err(EditorError::Busy(*state));
        }
        *state = next;
        Ok(InFlight { editor: self })
    }

    fn render(&self) {
        let enabled = self.controls_enabled();
        let mut fragments: Vec<Fragment> = lock(&self.rows)
            .iter()
            .map(|row| row_fragment(&self.config.fields, row, enabled))
            .collect();
        fragments.push(controls_fragment(enabled));
        self.container.replace_children(fragments);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn disabled_attr(enabled: bool) -> &'static str {
    if enabled { "" } else { " disabled" }
}

fn row_fragment(fields: &[FieldSpec], row: &Row, enabled: bool) -> Fragment {
    let class = if row.missing.is_empty() { "editor-row" } else { "editor-row invalid" };
    let mut html = format!("<div class=\"{class}\" data-key=\"{}\">", row.key);
    for (spec, (_, value)) in fields.iter().zip(&row.values) {
        let invalid = row.missing.contains(&spec.name);
        let required = if spec.required { " required" } else { "" };
        let aria = if invalid { " aria-invalid=\"true\"" } else { "" };
        let name = escape(&spec.name);
        let input = match spec.kind {
            FieldKind::LongText => format!("<textarea name=\"{name}\"{required}{aria}>{}</textarea>", escape(value)),
            FieldKind::Flag => {
                let checked = if value == "true" { " checked" } else { "" };
                format!("<input type=\"checkbox\" name=\"{name}\"{checked}>")
            }
            kind => {
                let ty = match kind {
                    FieldKind::Url => "url",
                    FieldKind::Date => "date",
                    _ => "text",
                };
                format!("<input type=\"{ty}\" name=\"{name}\" value=\"{}\"{required}{aria}>", escape(value))
            }
        };
        html.push_str(&format!("<label>{} {input}</label>", escape(&spec.label)));
    }
    html.push_str(&format!(
        "<button type=\"button\" class=\"remove-row\" data-key=\"{}\"{}>Eliminar</button></div>",
        row.key,
        disabled_attr(enabled)
    ));
    Fragment::raw(html)
}

fn controls_fragment(enabled: bool) -> Fragment {
    let d = disabled_attr(enabled);
    Fragment::raw(format!(
        "<div class=\"editor-controls\"><button type=\"button\" class=\"add-row\"{d}>Añadir</button><button type=\"submit\" class=\"save\"{d}>Guardar</button></div>"
    ))
}
