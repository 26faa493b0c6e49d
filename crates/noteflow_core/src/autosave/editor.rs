//! Editor buffer boundary.
//!
//! The rich-text component is owned by the host UI. Its change events are
//! forwarded by the host to `AutosaveEngine::on_content_changed`; the engine
//! only pushes content in and reads the buffer back on blur.

use crate::model::content::ContentDoc;

/// Opaque on-screen content buffer.
pub trait EditorBuffer {
    /// Replaces the on-screen content synchronously.
    fn set_content(&mut self, doc: &ContentDoc);
    /// Returns the current buffer snapshot.
    fn get_content(&self) -> ContentDoc;
}

/// Headless buffer for CLI hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryEditor {
    content: ContentDoc,
    programmatic_writes: usize,
}

impl MemoryEditor {
    /// Simulates user input landing in the buffer.
    pub fn type_content(&mut self, doc: ContentDoc) {
        self.content = doc;
    }

    /// Number of `set_content` calls received.
    pub fn programmatic_writes(&self) -> usize {
        self.programmatic_writes
    }
}

impl EditorBuffer for MemoryEditor {
    fn set_content(&mut self, doc: &ContentDoc) {
        self.content = doc.clone();
        self.programmatic_writes += 1;
    }

    fn get_content(&self) -> ContentDoc {
        self.content.clone()
    }
}
