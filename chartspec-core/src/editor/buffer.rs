use crate::spec::{serialize, Dialect, Notation, ParsedSpec};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Editable text with undo history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextModel {
    text: String,
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
}

impl TextModel {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text as a single undoable edit
    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if text == self.text {
            return;
        }
        let previous = std::mem::replace(&mut self.text, text);
        self.undo_stack.push(previous);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.text, previous);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.text, next);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKey {
    pub dialect: Dialect,
    pub notation: Notation,
}

impl BufferKey {
    pub fn new(dialect: Dialect, notation: Notation) -> Self {
        Self { dialect, notation }
    }
}

impl Display for BufferKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.dialect, self.notation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    pub model: TextModel,
    pub uri: String,
    /// Spec revision the text was last serialized from or parsed into
    synced_revision: u64,
}

impl EditorBuffer {
    fn new(key: BufferKey, text: String, revision: u64) -> Self {
        Self {
            model: TextModel::new(text),
            uri: format!("inmemory://chartspec/{key}"),
            synced_revision: revision,
        }
    }

    pub fn text(&self) -> &str {
        self.model.text()
    }

    pub fn synced_revision(&self) -> u64 {
        self.synced_revision
    }
}

/// Current spec as seen by the buffers
#[derive(Debug, Clone, Copy)]
pub struct SpecSnapshot<'a> {
    pub spec: &'a Value,
    /// Incremented every time `spec` changes
    pub revision: u64,
    pub has_error: bool,
}

impl<'a> SpecSnapshot<'a> {
    pub fn of(parsed: &'a ParsedSpec, revision: u64) -> Self {
        Self {
            spec: &parsed.spec,
            revision,
            has_error: parsed.error.is_some(),
        }
    }
}

/// Lazily created editor buffers, one per dialect and notation.
///
/// Buffers are never recreated once built so their undo history survives switching.
#[derive(Debug, Clone)]
pub struct BufferManager {
    buffers: HashMap<BufferKey, EditorBuffer>,
    active: BufferKey,
}

impl BufferManager {
    pub fn new(active: BufferKey) -> Self {
        Self {
            buffers: HashMap::new(),
            active,
        }
    }

    pub fn active(&self) -> BufferKey {
        self.active
    }

    pub fn contains(&self, key: BufferKey) -> bool {
        self.buffers.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn peek(&self, key: BufferKey) -> Option<&EditorBuffer> {
        self.buffers.get(&key)
    }

    pub fn active_buffer_mut(&mut self) -> Option<&mut EditorBuffer> {
        self.buffers.get_mut(&self.active)
    }

    /// Buffer for `key`, created from the serialized spec on first request.
    ///
    /// A cached buffer is rewritten when the spec changed since it was last synced, unless the
    /// spec currently has an error.
    pub fn get_buffer(&mut self, key: BufferKey, current: SpecSnapshot<'_>) -> &mut EditorBuffer {
        let buffer = self.buffers.entry(key).or_insert_with(|| {
            log::debug!("Creating editor buffer {key}");
            let text = serialize(current.spec, key.notation, "");
            EditorBuffer::new(key, text, current.revision)
        });
        if buffer.synced_revision != current.revision && !current.has_error {
            let text = serialize(current.spec, key.notation, buffer.model.text());
            buffer.model.set_text(text);
            buffer.synced_revision = current.revision;
        }
        buffer
    }

    /// Buffer for `key` holding `text` as typed, with no undo history
    pub fn seed<S: Into<String>>(
        &mut self,
        key: BufferKey,
        text: S,
        revision: u64,
    ) -> &mut EditorBuffer {
        self.buffers
            .entry(key)
            .or_insert_with(|| EditorBuffer::new(key, text.into(), revision))
    }

    /// Make `key` the active buffer and return its text
    pub fn switch_to(&mut self, key: BufferKey, current: SpecSnapshot<'_>) -> String {
        let text = self.get_buffer(key, current).text().to_string();
        self.active = key;
        text
    }

    /// Record that the buffer already reflects `revision`, so it is not rewritten
    pub fn mark_synced(&mut self, key: BufferKey, revision: u64) {
        if let Some(buffer) = self.buffers.get_mut(&key) {
            buffer.synced_revision = revision;
        }
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(spec: &Value, revision: u64, has_error: bool) -> SpecSnapshot<'_> {
        SpecSnapshot {
            spec,
            revision,
            has_error,
        }
    }

    #[test]
    fn test_text_model_history() {
        let mut model = TextModel::new("a");
        model.set_text("b");
        model.set_text("b");
        model.set_text("c");
        assert!(model.undo());
        assert_eq!(model.text(), "b");
        assert!(model.undo());
        assert!(!model.undo());
        assert!(model.redo());
        assert_eq!(model.text(), "b");
        model.set_text("d");
        assert!(!model.can_redo());
    }

    #[test]
    fn test_buffer_key_format() {
        let key = BufferKey::new(Dialect::VegaLite, Notation::Json);
        assert_eq!(key.to_string(), "vega-lite.json");
    }

    #[test]
    fn test_first_request_serializes() {
        let spec = json!({"mark": "bar"});
        let mut manager = BufferManager::new(BufferKey::new(Dialect::VegaLite, Notation::Yaml));
        let key = BufferKey::new(Dialect::VegaLite, Notation::Json);
        let buffer = manager.get_buffer(key, snapshot(&spec, 0, false));
        assert_eq!(buffer.text(), "{\n  \"mark\": \"bar\"\n}");
        assert_eq!(buffer.uri, "inmemory://chartspec/vega-lite.json");
    }

    #[test]
    fn test_cached_buffer_overwritten_only_without_error() {
        let mut manager = BufferManager::new(BufferKey::new(Dialect::VegaLite, Notation::Json));
        let key = BufferKey::new(Dialect::VegaLite, Notation::Json);
        manager.get_buffer(key, snapshot(&json!({"mark": "bar"}), 0, false));

        let changed = json!({"mark": "line"});
        let text = manager
            .get_buffer(key, snapshot(&changed, 1, true))
            .text()
            .to_string();
        assert!(text.contains("bar"));

        let buffer = manager.get_buffer(key, snapshot(&changed, 1, false));
        assert!(buffer.text().contains("line"));
        assert!(buffer.model.undo());
        assert!(buffer.text().contains("bar"));
    }

    #[test]
    fn test_switch_leaves_other_buffers() {
        let spec = json!({"mark": "bar"});
        let json_key = BufferKey::new(Dialect::VegaLite, Notation::Json);
        let yaml_key = BufferKey::new(Dialect::VegaLite, Notation::Yaml);
        let mut manager = BufferManager::new(json_key);
        manager.switch_to(json_key, snapshot(&spec, 0, false));
        let before = manager.peek(json_key).cloned();

        let text = manager.switch_to(yaml_key, snapshot(&spec, 0, false));
        assert_eq!(text, "mark: bar\n");
        assert_eq!(manager.active(), yaml_key);
        assert_eq!(manager.peek(json_key).cloned(), before);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_seeded_buffer_has_no_history() {
        let spec = json!({"mark": "bar"});
        let key = BufferKey::new(Dialect::VegaLite, Notation::Json);
        let mut manager = BufferManager::new(key);
        let buffer = manager.seed(key, "{\"mark\":\"bar\"}", 0);
        assert_eq!(buffer.text(), "{\"mark\":\"bar\"}");
        assert!(!buffer.model.can_undo());

        // Same revision, so the typed text is kept as-is
        let text = manager.switch_to(key, snapshot(&spec, 0, false));
        assert_eq!(text, "{\"mark\":\"bar\"}");
    }
}
