// src/analysis.rs - Deferred "analyze drawing" task on a virtual clock
use crate::drawing::DrawingPoint;
use crate::shapes::recognize_word;
use thiserror::Error;
use tracing::{debug, info};

pub const FALLBACK_LABEL: &str = "UNKNOWN_ARTIFACT";
pub const START_ANNOUNCEMENT: &str = "Analyzing structural pattern...";

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis #{0} is still in flight")]
    AlreadyInFlight(u64),
}

/// Handle for one scheduled analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTicket(u64);

impl AnalysisTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub ticket: AnalysisTicket,
    pub label: String,
    pub announcement: String,
}

#[derive(Debug, Clone)]
struct PendingAnalysis {
    ticket: AnalysisTicket,
    due_at_ms: f64,
    path: Vec<DrawingPoint>,
    typed_text: String,
}

/// Holds at most one analysis. Nothing runs on its own: the owner advances
/// time by calling `poll` with the current timestamp.
#[derive(Debug)]
pub struct AnalysisTrigger {
    delay_ms: f64,
    next_id: u64,
    pending: Option<PendingAnalysis>,
}

impl AnalysisTrigger {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            next_id: 1,
            pending: None,
        }
    }

    /// Snapshot the inputs and schedule the result for `now_ms + delay`.
    pub fn schedule(
        &mut self,
        path: &[DrawingPoint],
        typed_text: &str,
        now_ms: f64,
    ) -> Result<AnalysisTicket, AnalysisError> {
        if let Some(pending) = &self.pending {
            return Err(AnalysisError::AlreadyInFlight(pending.ticket.id()));
        }

        let ticket = AnalysisTicket(self.next_id);
        self.next_id += 1;
        self.pending = Some(PendingAnalysis {
            ticket,
            due_at_ms: now_ms + self.delay_ms,
            path: path.to_vec(),
            typed_text: typed_text.to_string(),
        });
        info!(
            "Analysis #{} scheduled ({} points, typed {:?})",
            ticket.id(),
            path.len(),
            typed_text
        );
        Ok(ticket)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.due_at_ms)
    }

    /// Drop the pending analysis if it is the one `ticket` refers to.
    pub fn cancel(&mut self, ticket: AnalysisTicket) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => {
                debug!("Analysis #{} cancelled", ticket.id());
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Complete the pending analysis once its deadline has passed.
    pub fn poll(&mut self, now_ms: f64) -> Option<AnalysisOutcome> {
        if self.deadline()? > now_ms {
            return None;
        }
        let pending = self.pending.take()?;

        let label = resolve_label(&pending.path, &pending.typed_text);
        let announcement = announcement_for(&label);
        info!("Analysis #{} finished: {}", pending.ticket.id(), label);

        Some(AnalysisOutcome {
            ticket: pending.ticket,
            label,
            announcement,
        })
    }
}

/// Recognized word, else the typed text, else the fallback label.
pub fn resolve_label(path: &[DrawingPoint], typed_text: &str) -> String {
    let word = recognize_word(path);
    if !word.is_empty() {
        word
    } else if !typed_text.is_empty() {
        typed_text.to_string()
    } else {
        FALLBACK_LABEL.to_string()
    }
}

pub fn announcement_for(label: &str) -> String {
    match label.chars().next() {
        Some('A') => "A for Apple detected. Rendering schematic.".to_string(),
        Some('O') => "Orbular structure detected.".to_string(),
        Some('B') => "Box container detected.".to_string(),
        _ => format!("{} Identified.", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::strokes::loop_at;

    #[test]
    fn test_typed_text_fallback() {
        let mut trigger = AnalysisTrigger::new(1500.0);
        trigger.schedule(&[], "HI", 1000.0).unwrap();

        assert!(trigger.poll(2499.0).is_none());
        let outcome = trigger.poll(2500.0).unwrap();
        assert_eq!(outcome.label, "HI");
        assert_eq!(outcome.announcement, "HI Identified.");
        assert!(!trigger.is_pending());
    }

    #[test]
    fn test_drawing_beats_typed_text() {
        let mut trigger = AnalysisTrigger::new(1500.0);
        trigger.schedule(&loop_at(0.5, 0.5, 0.1, 16), "HI", 0.0).unwrap();
        let outcome = trigger.poll(1500.0).unwrap();
        assert_eq!(outcome.label, "O");
        assert_eq!(outcome.announcement, "Orbular structure detected.");
    }

    #[test]
    fn test_nothing_to_analyze() {
        assert_eq!(resolve_label(&[], ""), FALLBACK_LABEL);
        assert_eq!(announcement_for(FALLBACK_LABEL), "UNKNOWN_ARTIFACT Identified.");
    }

    #[test]
    fn test_announcement_prefixes() {
        assert_eq!(announcement_for("AO"), "A for Apple detected. Rendering schematic.");
        assert_eq!(announcement_for("BOX"), "Box container detected.");
        assert_eq!(announcement_for("?I"), "?I Identified.");
    }

    #[test]
    fn test_one_in_flight() {
        let mut trigger = AnalysisTrigger::new(1500.0);
        let first = trigger.schedule(&[], "A", 0.0).unwrap();
        assert_eq!(
            trigger.schedule(&[], "B", 10.0),
            Err(AnalysisError::AlreadyInFlight(first.id()))
        );
    }

    #[test]
    fn test_cancel_only_matching_ticket() {
        let mut trigger = AnalysisTrigger::new(1500.0);
        let first = trigger.schedule(&[], "A", 0.0).unwrap();
        assert!(trigger.cancel(first));
        assert!(trigger.poll(5000.0).is_none());

        let second = trigger.schedule(&[], "B", 0.0).unwrap();
        assert_ne!(first, second);
        assert!(!trigger.cancel(first));
        assert_eq!(trigger.deadline(), Some(1500.0));
    }

    #[test]
    fn test_inputs_are_snapshotted() {
        let mut trigger = AnalysisTrigger::new(10.0);
        let mut typed = String::from("HI");
        trigger.schedule(&[], &typed, 0.0).unwrap();
        typed.clear();
        assert_eq!(trigger.poll(10.0).unwrap().label, "HI");
    }
}
