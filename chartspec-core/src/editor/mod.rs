//! Editing surface of one visualization: spec text buffers, notation and dialect switching,
//! and write-back of the options to the host.
pub mod buffer;

pub use buffer::{BufferKey, BufferManager, EditorBuffer, SpecSnapshot, TextModel};

use crate::compile::compile;
use crate::layout::Debouncer;
use crate::query::{QueryColumn, QueryMetadata};
use crate::spec::{parse, Dialect, Notation, ParsedSpec, SpecError, VisualizationOptions};
use crate::synthesize::synthesize;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Quiet period in milliseconds before typed text is parsed
    #[serde(default = "default_input_debounce_ms")]
    pub input_debounce_ms: u64,
}

fn default_input_debounce_ms() -> u64 {
    700
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            input_debounce_ms: default_input_debounce_ms(),
        }
    }
}

impl EditorConfig {
    pub fn input_debounce(&self) -> Duration {
        Duration::from_millis(self.input_debounce_ms)
    }
}

pub type OnChange = Box<dyn FnMut(&VisualizationOptions)>;

pub struct SpecEditor {
    options: VisualizationOptions,
    columns: Vec<QueryColumn>,
    metadata: QueryMetadata,
    parsed: ParsedSpec,
    revision: u64,
    buffers: BufferManager,
    pending_input: Debouncer<String>,
    on_change: OnChange,
}

impl SpecEditor {
    pub fn new(
        options: VisualizationOptions,
        columns: Vec<QueryColumn>,
        metadata: QueryMetadata,
        config: EditorConfig,
        on_change: OnChange,
    ) -> Self {
        let parsed = Self::parse_text(&options, &columns, &metadata);
        let key = BufferKey::new(options.dialect, options.notation);
        let mut editor = Self {
            options,
            columns,
            metadata,
            parsed,
            revision: 0,
            buffers: BufferManager::new(key),
            pending_input: Debouncer::new(config.input_debounce()),
            on_change,
        };

        if editor.options.spec_text.trim().is_empty() {
            // Seed the buffer with the synthesized or default document
            editor.options.spec_text = editor
                .buffers
                .switch_to(key, SpecSnapshot::of(&editor.parsed, editor.revision));
            editor.reparse();
        } else {
            let text = editor.options.spec_text.clone();
            editor.buffers.seed(key, text, editor.revision);
        }
        editor
    }

    fn parse_text(
        options: &VisualizationOptions,
        columns: &[QueryColumn],
        metadata: &QueryMetadata,
    ) -> ParsedSpec {
        if options.spec_text.trim().is_empty() && !columns.is_empty() {
            return ParsedSpec {
                error: None,
                spec: synthesize(columns, metadata),
                notation: options.notation,
                dialect: Dialect::VegaLite,
            };
        }
        parse(&options.spec_text, Some(options.notation), options.dialect)
    }

    fn notify(&mut self) {
        (self.on_change)(&self.options);
    }

    pub fn options(&self) -> &VisualizationOptions {
        &self.options
    }

    pub fn parsed(&self) -> &ParsedSpec {
        &self.parsed
    }

    pub fn error(&self) -> Option<&SpecError> {
        self.parsed.error.as_ref()
    }

    pub fn active_key(&self) -> BufferKey {
        self.buffers.active()
    }

    pub fn buffers(&self) -> &BufferManager {
        &self.buffers
    }

    /// Text of the active buffer
    pub fn text(&self) -> &str {
        self.buffers
            .peek(self.buffers.active())
            .map(|buffer| buffer.text())
            .unwrap_or_default()
    }

    /// Keystroke in the active buffer. Parsing is deferred until the input settles.
    pub fn input<S: Into<String>>(&mut self, text: S, now: Instant) {
        let text = text.into();
        if let Some(buffer) = self.buffers.active_buffer_mut() {
            buffer.model.set_text(text.clone());
        }
        self.pending_input.push(text, now);
    }

    /// Apply settled input. Returns whether the spec text was updated.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_input.poll(now) {
            Some(text) => {
                self.update_spec(text);
                true
            }
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_input.deadline()
    }

    fn flush_input(&mut self) {
        if let Some(text) = self.pending_input.flush() {
            self.update_spec(text);
        }
    }

    /// Set the spec text and reparse it
    pub fn update_spec<S: Into<String>>(&mut self, text: S) {
        self.pending_input.cancel();
        self.options.spec_text = text.into();
        if let Some(buffer) = self.buffers.active_buffer_mut() {
            buffer.model.set_text(self.options.spec_text.clone());
        }
        self.reparse();
        self.notify();
    }

    /// Parse the spec text of the active buffer. The revision moves only when the parsed
    /// document changed.
    fn reparse(&mut self) {
        let parsed = parse(
            &self.options.spec_text,
            Some(self.options.notation),
            self.options.dialect,
        );
        if parsed.error.is_none() && parsed.spec != self.parsed.spec {
            self.revision += 1;
        }
        self.parsed = parsed;
        if self.parsed.error.is_none() {
            self.buffers.mark_synced(self.buffers.active(), self.revision);
        }
    }

    pub fn update_notation(&mut self, notation: Notation) {
        self.flush_input();
        if notation == self.options.notation {
            return;
        }
        self.options.notation = notation;
        let key = BufferKey::new(self.options.dialect, notation);
        self.options.spec_text = self
            .buffers
            .switch_to(key, SpecSnapshot::of(&self.parsed, self.revision));
        self.reparse();
        self.notify();
    }

    /// Switch between the grammar and the dialect.
    ///
    /// Moving to the grammar compiles the current document without a theme. When that fails the
    /// dialect is kept and the compile error is reported through [`SpecEditor::error`].
    pub fn update_dialect(&mut self, dialect: Dialect) {
        self.flush_input();
        if dialect == self.options.dialect {
            return;
        }
        let key = BufferKey::new(dialect, self.options.notation);

        match dialect {
            Dialect::Vega => {
                let compiled = compile(&self.parsed.spec, Theme::Custom);
                if let Some(error) = compiled.error {
                    log::warn!("Not switching to {dialect}: {error}");
                    self.parsed.error = Some(error);
                    return;
                }
                self.set_document(ParsedSpec {
                    error: None,
                    spec: compiled.spec,
                    notation: self.options.notation,
                    dialect,
                });
            }
            Dialect::VegaLite => match self.buffers.peek(key) {
                Some(buffer) => {
                    let parsed = parse(buffer.text(), Some(key.notation), dialect);
                    self.set_document(parsed);
                    self.buffers.mark_synced(key, self.revision);
                }
                None => {
                    let spec = if self.columns.is_empty() {
                        dialect.default_document()
                    } else {
                        synthesize(&self.columns, &self.metadata)
                    };
                    self.set_document(ParsedSpec {
                        error: None,
                        spec,
                        notation: self.options.notation,
                        dialect,
                    });
                }
            },
        }

        self.options.dialect = dialect;
        self.options.spec_text = self
            .buffers
            .switch_to(key, SpecSnapshot::of(&self.parsed, self.revision));
        self.notify();
    }

    fn set_document(&mut self, parsed: ParsedSpec) {
        self.revision += 1;
        self.parsed = parsed;
    }

    pub fn update_theme(&mut self, theme: Theme) {
        self.flush_input();
        self.options.theme = theme;
        self.notify();
    }

    pub fn undo(&mut self) -> bool {
        self.apply_history(TextModel::undo)
    }

    pub fn redo(&mut self) -> bool {
        self.apply_history(TextModel::redo)
    }

    fn apply_history(&mut self, step: fn(&mut TextModel) -> bool) -> bool {
        self.flush_input();
        let Some(buffer) = self.buffers.active_buffer_mut() else {
            return false;
        };
        if !step(&mut buffer.model) {
            return false;
        }
        let text = buffer.text().to_string();
        self.update_spec(text);
        true
    }

    /// Drop all buffers and pending input
    pub fn close(&mut self) {
        self.pending_input.cancel();
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ColumnType;
    use crate::spec::{SpecErrorKind, VEGA_SCHEMA};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(
        text: &str,
        notation: Notation,
        columns: Vec<QueryColumn>,
    ) -> (SpecEditor, Rc<RefCell<Vec<VisualizationOptions>>>) {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let editor = SpecEditor::new(
            VisualizationOptions::new(text, notation, Dialect::VegaLite),
            columns,
            QueryMetadata::default(),
            EditorConfig::default(),
            Box::new(move |options| sink.borrow_mut().push(options.clone())),
        );
        (editor, changes)
    }

    #[test]
    fn test_input_is_debounced() {
        let start = Instant::now();
        let (mut editor, changes) = editor("mark: bar\n", Notation::Yaml, vec![]);
        editor.input("mark: l", start);
        editor.input("mark: line", start + Duration::from_millis(200));
        assert_eq!(editor.text(), "mark: line");
        assert!(!editor.poll(start + Duration::from_millis(800)));
        assert!(editor.poll(start + Duration::from_millis(900)));

        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].spec_text, "mark: line");
        assert_eq!(editor.parsed().spec, json!({"mark": "line"}));
    }

    #[test]
    fn test_notation_switch_round_trip() {
        let (mut editor, changes) = editor("mark: bar\n", Notation::Yaml, vec![]);
        editor.update_notation(Notation::Json);
        assert_eq!(editor.options().spec_text, "{\n  \"mark\": \"bar\"\n}");
        assert_eq!(editor.active_key().to_string(), "vega-lite.json");

        editor.update_spec("{\"mark\": \"area\"}");
        editor.update_notation(Notation::Yaml);
        assert_eq!(editor.options().spec_text, "mark: area\n");
        assert_eq!(changes.borrow().len(), 3);

        // The yaml buffer keeps its history
        assert!(editor.undo());
        assert_eq!(editor.options().spec_text, "mark: bar\n");
    }

    #[test]
    fn test_invalid_text_does_not_overwrite_other_buffers() {
        let (mut editor, _) = editor("mark: bar\n", Notation::Yaml, vec![]);
        editor.update_notation(Notation::Json);
        editor.update_notation(Notation::Yaml);
        editor.update_spec("mark: [");
        assert_eq!(editor.error().unwrap().kind, SpecErrorKind::Parse);

        editor.update_notation(Notation::Json);
        assert_eq!(editor.options().spec_text, "{\n  \"mark\": \"bar\"\n}");
    }

    #[test]
    fn test_dialect_switch_compiles_then_reuses_buffer() {
        let text = "mark: point\nencoding:\n  x:\n    field: a\n    type: quantitative\n";
        let (mut editor, _) = editor(text, Notation::Yaml, vec![]);
        editor.update_dialect(Dialect::Vega);
        assert_eq!(editor.options().dialect, Dialect::Vega);
        assert_eq!(editor.parsed().spec["$schema"], json!(VEGA_SCHEMA));
        assert!(editor.options().spec_text.contains("marks:"));

        editor.update_dialect(Dialect::VegaLite);
        assert_eq!(editor.options().spec_text, text);
    }

    #[test]
    fn test_dialect_switch_refused_on_compile_error() {
        let (mut editor, changes) = editor("layer: []\n", Notation::Yaml, vec![]);
        editor.update_dialect(Dialect::Vega);
        assert_eq!(editor.options().dialect, Dialect::VegaLite);
        assert_eq!(editor.error().unwrap().kind, SpecErrorKind::Compile);
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_blank_text_seeds_synthesized_document() {
        let columns = vec![
            QueryColumn::new("day", ColumnType::Date),
            QueryColumn::new("count", ColumnType::Integer),
        ];
        let (editor, _) = editor("", Notation::Json, columns);
        assert!(editor.error().is_none());
        assert!(editor.text().contains("\"line\""));
        assert_eq!(editor.options().spec_text, editor.text());
        assert_eq!(editor.parsed().spec["mark"]["type"], json!("line"));
    }

    #[test]
    fn test_blank_text_without_columns_shows_default_document() {
        let (editor, changes) = editor("", Notation::Json, vec![]);
        assert!(!editor.options().spec_text.is_empty());
        assert_eq!(editor.options().spec_text, editor.text());
        assert_eq!(editor.parsed().spec, Dialect::VegaLite.default_document());
        assert!(changes.borrow().is_empty());
    }

    #[test]
    fn test_fresh_editor_has_nothing_to_undo() {
        for text in ["{\"mark\":\"bar\"}", "{\"mark\": "] {
            let (mut editor, changes) = editor(text, Notation::Json, vec![]);
            assert!(!editor.undo());
            assert_eq!(editor.text(), text);
            assert_eq!(editor.options().spec_text, text);
            assert!(changes.borrow().is_empty());
        }
    }

    #[test]
    fn test_notation_switch_reparses_visible_text() {
        let text = concat!(
            "mark: bar\n",
            "encoding:\n",
            "  x:\n    field: a\n    type: nominal\n",
            "  y:\n    field: b\n    type: quantitative\n",
        );
        let (mut editor, _) = editor(text, Notation::Yaml, vec![]);
        let expected = editor.parsed().spec.clone();
        editor.update_notation(Notation::Json);
        editor.update_notation(Notation::Yaml);

        editor.update_spec("mark: [");
        assert_eq!(editor.error().unwrap().kind, SpecErrorKind::Parse);

        editor.update_notation(Notation::Json);
        assert!(editor.options().spec_text.starts_with('{'));
        assert_eq!(editor.error(), None);
        assert_eq!(editor.parsed().spec, expected);
        assert_eq!(editor.parsed().notation, Notation::Json);

        editor.update_dialect(Dialect::Vega);
        assert_eq!(editor.error(), None);
        assert_eq!(editor.parsed().spec["marks"][0]["type"], json!("rect"));
    }
}
