use crate::{MalformationRecord, Token};

/// Structured observation channel for a decode session
///
/// The walker notifies the sink as it progresses; the sink never influences
/// control flow and decoding works identically with no sink installed. All
/// methods default to no-ops so implementers pick only the events they care
/// about.
pub trait EventSink {
    /// The walker entered a named section of the catalogue
    fn section_entered(&mut self, _name: &str) {}

    /// The walker consumed a structural field
    fn field_read(&mut self, _token: &Token) {}

    /// A non-fatal anomaly was recorded
    fn malformation_recorded(&mut self, _record: &MalformationRecord) {}
}

/// Sink that collects section names, useful for tests and tooling
#[derive(Debug, Default)]
pub struct SectionTrace {
    sections: Vec<String>,
}

impl SectionTrace {
    pub fn new() -> SectionTrace {
        SectionTrace::default()
    }

    /// The sections entered, in order
    pub fn sections(&self) -> &[String] {
        &self.sections
    }
}

impl EventSink for SectionTrace {
    fn section_entered(&mut self, name: &str) {
        self.sections.push(name.to_string());
    }
}
