//! Running transcript of one in-progress utterance
//!
//! Recognition providers emit growing, possibly revised transcripts and
//! replay the full hypothesis on each event, so the latest event is always
//! authoritative. The aggregator lives for exactly one capture session.

/// One recognition callback from a speech capture provider
#[derive(Debug, Clone, Default)]
pub struct TranscriptEvent {
    /// Recognized segments, in utterance order
    pub fragments: Vec<String>,

    /// Whether the provider will revise this transcript further
    pub is_final: bool,
}

/// The text currently being recognized
#[derive(Debug, Clone, Default)]
pub struct Utterance {
    /// Best-effort running text, overwritten by each event
    pub text: String,

    /// Transitions false -> true at most once per capture
    pub is_final: bool,
}

/// Folds recognition events into the current utterance
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    current: Utterance,
}

impl TranscriptAggregator {
    /// Create an aggregator for a new capture session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one recognition event and return the updated utterance
    ///
    /// Fragments are concatenated order-preserving, with no separator
    /// normalization beyond what the provider supplies. Events arriving
    /// after finality are ignored.
    pub fn on_event(&mut self, event: &TranscriptEvent) -> &Utterance {
        if self.current.is_final {
            tracing::debug!("transcript event after finality ignored");
            return &self.current;
        }

        self.current.text = event.fragments.concat();
        self.current.is_final = event.is_final;
        &self.current
    }

    /// The current utterance
    #[must_use]
    pub const fn utterance(&self) -> &Utterance {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(fragments: &[&str], is_final: bool) -> TranscriptEvent {
        TranscriptEvent {
            fragments: fragments.iter().map(ToString::to_string).collect(),
            is_final,
        }
    }

    #[test]
    fn test_latest_event_is_authoritative() {
        let mut agg = TranscriptAggregator::new();

        agg.on_event(&event(&["how do I"], false));
        assert_eq!(agg.utterance().text, "how do I");
        assert!(!agg.utterance().is_final);

        // Providers may revise earlier words wholesale
        agg.on_event(&event(&["how do I water crops"], false));
        assert_eq!(agg.utterance().text, "how do I water crops");

        let last = agg.on_event(&event(&["how do I water my crops"], true));
        assert_eq!(last.text, "how do I water my crops");
        assert!(last.is_final);
    }

    #[test]
    fn test_fragments_concatenate_in_order() {
        let mut agg = TranscriptAggregator::new();
        let utt = agg.on_event(&event(&["what time ", "does the ", "library open"], true));
        assert_eq!(utt.text, "what time does the library open");
    }

    #[test]
    fn test_events_after_finality_are_ignored() {
        let mut agg = TranscriptAggregator::new();
        agg.on_event(&event(&["done"], true));

        let utt = agg.on_event(&event(&["late revision"], false));
        assert_eq!(utt.text, "done");
        assert!(utt.is_final);
    }
}
