/// Text used when nothing was selected.
pub const SEARCH_ALL_EVENTS: &str = "Search all events";

/// Ordered list of explanation fragments, one per pipeline stage that
/// contributed something.
#[derive(Debug, Default)]
pub(crate) struct Explanation {
    parts: Vec<String>,
}

impl Explanation {
    /// Record `label: a, b, c`. Nothing is recorded for an empty name list.
    pub fn record<S: AsRef<str>>(&mut self, label: &str, names: &[S]) {
        if names.is_empty() {
            return;
        }
        let joined = names
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", ");
        self.parts.push(format!("{label}: {joined}"));
    }

    pub fn finish(self) -> String {
        if self.parts.is_empty() {
            SEARCH_ALL_EVENTS.to_string()
        } else {
            self.parts.join(" | ")
        }
    }
}
