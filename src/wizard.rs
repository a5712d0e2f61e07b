//! Client-side state of the kiosk selection flow: subject, then unit, then
//! sheet settings, then submission.
//!
//! The machine performs no I/O. Each event returns at most one effect the
//! client must carry out and feed back as another event. The server
//! re-validates everything on generation, so nothing here is authoritative.

use std::collections::HashMap;

use crate::dto::catalog_dto::UnitSummary;
use crate::dto::test_sheet_dto::GenerateTestSheetPayload;
use crate::models::question::DifficultyFilter;
use crate::models::test_sheet::{
    DEFAULT_INCLUDE_ANSWER, DEFAULT_INCLUDE_HINT, DEFAULT_QUESTION_COUNT,
    DEFAULT_SEPARATE_ANSWER_SHEET, MAX_QUESTION_COUNT, MIN_QUESTION_COUNT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    NoSubject,
    SubjectChosen { subject_id: i64 },
    UnitChosen { subject_id: i64, unit_id: i64 },
    Submitting { subject_id: i64, unit_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSettings {
    pub difficulty: DifficultyFilter,
    pub question_count: i64,
    pub include_hint: bool,
    pub include_answer: bool,
    pub separate_answer_sheet: bool,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyFilter::Mix,
            question_count: DEFAULT_QUESTION_COUNT,
            include_hint: DEFAULT_INCLUDE_HINT,
            include_answer: DEFAULT_INCLUDE_ANSWER,
            separate_answer_sheet: DEFAULT_SEPARATE_ANSWER_SHEET,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WizardEvent {
    SelectSubject(i64),
    UnitsLoaded {
        subject_id: i64,
        units: Vec<UnitSummary>,
    },
    SelectUnit(i64),
    ChangeDifficulty(DifficultyFilter),
    ChangeQuestionCount(i64),
    ChangeOptions {
        include_hint: bool,
        include_answer: bool,
        separate_answer_sheet: bool,
    },
    AvailabilityLoaded {
        unit_id: i64,
        difficulty: DifficultyFilter,
        available: i64,
    },
    Submit {
        confirmed: bool,
    },
    SubmissionSucceeded {
        sheet_id: i64,
    },
    SubmissionFailed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEffect {
    FetchUnits { subject_id: i64 },
    /// Units for this subject are already cached.
    RenderUnits { subject_id: i64 },
    FetchAvailability {
        unit_id: i64,
        difficulty: DifficultyFilter,
    },
    RequestConfirmation,
    PostGeneration(GenerateTestSheetPayload),
    NavigateToSheet { sheet_id: i64 },
}

#[derive(Debug, Clone)]
pub struct SelectionWizard {
    state: WizardState,
    settings: SheetSettings,
    availability: Option<i64>,
    unit_cache: HashMap<i64, Vec<UnitSummary>>,
    last_error: Option<String>,
}

impl Default for SelectionWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionWizard {
    pub fn new() -> Self {
        Self {
            state: WizardState::NoSubject,
            settings: SheetSettings::default(),
            availability: None,
            unit_cache: HashMap::new(),
            last_error: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn settings(&self) -> &SheetSettings {
        &self.settings
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Cached units of the chosen subject, if they have been loaded.
    pub fn units(&self) -> Option<&[UnitSummary]> {
        self.subject_id()
            .and_then(|id| self.unit_cache.get(&id))
            .map(Vec::as_slice)
    }

    /// Availability for the current unit and difficulty, once reported.
    pub fn available_count(&self) -> Option<i64> {
        self.availability
    }

    pub fn units_visible(&self) -> bool {
        !matches!(self.state, WizardState::NoSubject)
    }

    pub fn settings_visible(&self) -> bool {
        matches!(
            self.state,
            WizardState::UnitChosen { .. } | WizardState::Submitting { .. }
        )
    }

    pub fn submit_visible(&self) -> bool {
        self.settings_visible()
    }

    /// True when a unit is chosen, the count is in range, and the last
    /// availability report covers it.
    pub fn can_submit(&self) -> bool {
        let WizardState::UnitChosen { .. } = self.state else {
            return false;
        };
        let count = self.settings.question_count;
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&count) {
            return false;
        }
        self.available_count().is_some_and(|available| count <= available)
    }

    pub fn handle(&mut self, event: WizardEvent) -> Option<WizardEffect> {
        if matches!(self.state, WizardState::Submitting { .. }) {
            return self.handle_while_submitting(event);
        }

        match event {
            WizardEvent::SelectSubject(subject_id) => {
                self.state = WizardState::SubjectChosen { subject_id };
                self.availability = None;
                self.last_error = None;
                if self.unit_cache.contains_key(&subject_id) {
                    Some(WizardEffect::RenderUnits { subject_id })
                } else {
                    Some(WizardEffect::FetchUnits { subject_id })
                }
            }
            WizardEvent::UnitsLoaded { subject_id, units } => {
                self.unit_cache.insert(subject_id, units);
                (self.subject_id() == Some(subject_id))
                    .then_some(WizardEffect::RenderUnits { subject_id })
            }
            WizardEvent::SelectUnit(unit_id) => {
                let subject_id = self.subject_id()?;
                if let Some(units) = self.unit_cache.get(&subject_id) {
                    if !units.iter().any(|u| u.id == unit_id) {
                        return None;
                    }
                }
                self.state = WizardState::UnitChosen {
                    subject_id,
                    unit_id,
                };
                self.last_error = None;
                self.refresh_availability()
            }
            WizardEvent::ChangeDifficulty(difficulty) => {
                self.settings.difficulty = difficulty;
                self.refresh_availability()
            }
            WizardEvent::ChangeQuestionCount(count) => {
                self.settings.question_count = count;
                self.refresh_availability()
            }
            WizardEvent::ChangeOptions {
                include_hint,
                include_answer,
                separate_answer_sheet,
            } => {
                self.settings.include_hint = include_hint;
                self.settings.include_answer = include_answer;
                self.settings.separate_answer_sheet = separate_answer_sheet;
                None
            }
            WizardEvent::AvailabilityLoaded {
                unit_id,
                difficulty,
                available,
            } => {
                if self.unit_id() == Some(unit_id) && self.settings.difficulty == difficulty {
                    self.availability = Some(available);
                }
                None
            }
            WizardEvent::Submit { confirmed } => {
                if !self.can_submit() {
                    return None;
                }
                if !confirmed {
                    return Some(WizardEffect::RequestConfirmation);
                }
                let WizardState::UnitChosen {
                    subject_id,
                    unit_id,
                } = self.state
                else {
                    return None;
                };
                self.state = WizardState::Submitting {
                    subject_id,
                    unit_id,
                };
                Some(WizardEffect::PostGeneration(self.payload(subject_id, unit_id)))
            }
            WizardEvent::SubmissionSucceeded { .. } | WizardEvent::SubmissionFailed { .. } => None,
        }
    }

    fn handle_while_submitting(&mut self, event: WizardEvent) -> Option<WizardEffect> {
        let WizardState::Submitting {
            subject_id,
            unit_id,
        } = self.state
        else {
            return None;
        };

        match event {
            WizardEvent::SubmissionSucceeded { sheet_id } => {
                self.state = WizardState::NoSubject;
                self.availability = None;
                self.last_error = None;
                Some(WizardEffect::NavigateToSheet { sheet_id })
            }
            WizardEvent::SubmissionFailed { message } => {
                self.state = WizardState::UnitChosen {
                    subject_id,
                    unit_id,
                };
                self.last_error = Some(message);
                self.refresh_availability()
            }
            WizardEvent::UnitsLoaded { subject_id, units } => {
                self.unit_cache.insert(subject_id, units);
                None
            }
            // Everything else, including a second submit, is dropped while
            // a request is in flight.
            _ => None,
        }
    }

    fn refresh_availability(&mut self) -> Option<WizardEffect> {
        self.availability = None;
        let unit_id = self.unit_id()?;
        Some(WizardEffect::FetchAvailability {
            unit_id,
            difficulty: self.settings.difficulty,
        })
    }

    fn payload(&self, subject_id: i64, unit_id: i64) -> GenerateTestSheetPayload {
        GenerateTestSheetPayload {
            subject_id: Some(subject_id),
            unit_id: Some(unit_id),
            difficulty: Some(self.settings.difficulty.key().to_string()),
            question_count: self.settings.question_count,
            include_hint: Some(self.settings.include_hint),
            include_answer: Some(self.settings.include_answer),
            separate_answer_sheet: Some(self.settings.separate_answer_sheet),
        }
    }

    fn subject_id(&self) -> Option<i64> {
        match self.state {
            WizardState::NoSubject => None,
            WizardState::SubjectChosen { subject_id }
            | WizardState::UnitChosen { subject_id, .. }
            | WizardState::Submitting { subject_id, .. } => Some(subject_id),
        }
    }

    fn unit_id(&self) -> Option<i64> {
        match self.state {
            WizardState::UnitChosen { unit_id, .. } | WizardState::Submitting { unit_id, .. } => {
                Some(unit_id)
            }
            _ => None,
        }
    }
}
