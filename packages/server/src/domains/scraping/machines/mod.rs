//! Scrape dispatch state machine
//!
//! Pure decision logic - NO IO, only stage transitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScrapeStage {
    ResolveTarget,
    Extract,
    BackfillCanonical,
    SelfHeal,
    Persist,
    Ack,
    Retry,
}

impl ScrapeStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScrapeStage::Ack | ScrapeStage::Retry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeEvent {
    TargetResolved,
    Extracted {
        records: usize,
        /// A canonical URL is already stored for the company
        canonical_known: bool,
    },
    CanonicalBackfillFinished,
    SelfHealEmitted,
    Persisted,
    TransientFailure,
}

/// Scrape dispatch state machine
#[derive(Debug, Clone)]
pub struct ScrapeMachine {
    stage: ScrapeStage,
    records: usize,
}

impl ScrapeMachine {
    pub fn new() -> Self {
        Self {
            stage: ScrapeStage::ResolveTarget,
            records: 0,
        }
    }

    pub fn stage(&self) -> ScrapeStage {
        self.stage
    }

    fn after_extraction(&self) -> ScrapeStage {
        if self.records == 0 {
            ScrapeStage::SelfHeal
        } else {
            ScrapeStage::Persist
        }
    }

    /// Apply `event`. Returns the new stage, or None when the event does not
    /// apply to the current stage (the machine is left unchanged).
    pub fn decide(&mut self, event: &ScrapeEvent) -> Option<ScrapeStage> {
        let next = match (self.stage, event) {
            (ScrapeStage::ResolveTarget, ScrapeEvent::TargetResolved) => ScrapeStage::Extract,

            (
                ScrapeStage::Extract,
                ScrapeEvent::Extracted {
                    records,
                    canonical_known,
                },
            ) => {
                self.records = *records;
                if *canonical_known {
                    self.after_extraction()
                } else {
                    ScrapeStage::BackfillCanonical
                }
            }

            (ScrapeStage::BackfillCanonical, ScrapeEvent::CanonicalBackfillFinished) => {
                self.after_extraction()
            }

            (ScrapeStage::SelfHeal, ScrapeEvent::SelfHealEmitted) => ScrapeStage::Ack,
            (ScrapeStage::Persist, ScrapeEvent::Persisted) => ScrapeStage::Ack,

            (
                ScrapeStage::ResolveTarget | ScrapeStage::Extract | ScrapeStage::Persist,
                ScrapeEvent::TransientFailure,
            ) => ScrapeStage::Retry,

            _ => return None,
        };

        self.stage = next;
        Some(next)
    }
}

impl Default for ScrapeMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[ScrapeEvent]) -> Vec<ScrapeStage> {
        let mut machine = ScrapeMachine::new();
        events
            .iter()
            .map(|e| machine.decide(e).expect("event should apply"))
            .collect()
    }

    #[test]
    fn records_with_known_canonical_go_straight_to_persist() {
        let stages = run(&[
            ScrapeEvent::TargetResolved,
            ScrapeEvent::Extracted {
                records: 3,
                canonical_known: true,
            },
            ScrapeEvent::Persisted,
        ]);
        assert_eq!(
            stages,
            vec![ScrapeStage::Extract, ScrapeStage::Persist, ScrapeStage::Ack]
        );
    }

    #[test]
    fn zero_records_without_canonical_backfills_then_heals() {
        let stages = run(&[
            ScrapeEvent::TargetResolved,
            ScrapeEvent::Extracted {
                records: 0,
                canonical_known: false,
            },
            ScrapeEvent::CanonicalBackfillFinished,
            ScrapeEvent::SelfHealEmitted,
        ]);
        assert_eq!(
            stages,
            vec![
                ScrapeStage::Extract,
                ScrapeStage::BackfillCanonical,
                ScrapeStage::SelfHeal,
                ScrapeStage::Ack
            ]
        );
    }

    #[test]
    fn backfill_with_records_persists() {
        let mut machine = ScrapeMachine::new();
        machine.decide(&ScrapeEvent::TargetResolved);
        machine.decide(&ScrapeEvent::Extracted {
            records: 2,
            canonical_known: false,
        });
        assert_eq!(
            machine.decide(&ScrapeEvent::CanonicalBackfillFinished),
            Some(ScrapeStage::Persist)
        );
    }

    #[test]
    fn transient_failure_during_extract_retries() {
        let mut machine = ScrapeMachine::new();
        machine.decide(&ScrapeEvent::TargetResolved);
        assert_eq!(
            machine.decide(&ScrapeEvent::TransientFailure),
            Some(ScrapeStage::Retry)
        );
        assert!(machine.stage().is_terminal());
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut machine = ScrapeMachine::new();
        assert_eq!(machine.decide(&ScrapeEvent::Persisted), None);
        assert_eq!(machine.decide(&ScrapeEvent::SelfHealEmitted), None);
        assert_eq!(machine.stage(), ScrapeStage::ResolveTarget);

        machine.decide(&ScrapeEvent::TargetResolved);
        machine.decide(&ScrapeEvent::Extracted {
            records: 0,
            canonical_known: true,
        });
        // healing never fails the item
        assert_eq!(machine.decide(&ScrapeEvent::TransientFailure), None);
        assert_eq!(machine.stage(), ScrapeStage::SelfHeal);
    }
}
