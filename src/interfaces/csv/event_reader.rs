use crate::application::wizard::{Transition, WizardController};
use crate::domain::validation::Field;
use crate::error::{Result, WizardError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Input,
    Otp,
    Backspace,
    Paste,
    Submit,
    Back,
    Resend,
}

/// One row of an event script: `action,target,value`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct EventRecord {
    pub action: Action,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// A user action as the presentation layer would issue it.
#[derive(Debug, PartialEq, Clone)]
pub enum WizardEvent {
    Input { field: Field, value: String },
    OtpDigit { index: usize, value: String },
    Backspace { index: usize },
    Paste(String),
    Submit,
    Back,
    Resend,
}

fn cell_index(target: Option<&str>) -> Result<usize> {
    let raw = target.ok_or_else(|| WizardError::UnknownEvent("missing cell index".to_string()))?;
    raw.parse()
        .map_err(|_| WizardError::UnknownEvent(format!("invalid cell index '{raw}'")))
}

impl TryFrom<EventRecord> for WizardEvent {
    type Error = WizardError;

    fn try_from(record: EventRecord) -> Result<Self> {
        let value = record.value.unwrap_or_default();
        let target = record.target.as_deref();
        let event = match record.action {
            Action::Input => {
                let field = target
                    .ok_or_else(|| WizardError::UnknownEvent("missing field name".to_string()))?
                    .parse()?;
                WizardEvent::Input { field, value }
            }
            Action::Otp => WizardEvent::OtpDigit {
                index: cell_index(target)?,
                value,
            },
            Action::Backspace => WizardEvent::Backspace {
                index: cell_index(target)?,
            },
            Action::Paste => WizardEvent::Paste(value),
            Action::Submit => WizardEvent::Submit,
            Action::Back => WizardEvent::Back,
            Action::Resend => WizardEvent::Resend,
        };
        Ok(event)
    }
}

impl WizardEvent {
    /// Feeds the event to the controller. Edits report whether the value was
    /// accepted; navigation reports the resulting transition.
    pub async fn apply(self, wizard: &mut WizardController) -> Applied {
        match self {
            WizardEvent::Input { field, value } => Applied::Edit(wizard.input(field, &value)),
            WizardEvent::OtpDigit { index, value } => {
                Applied::Edit(wizard.enter_otp_digit(index, &value))
            }
            WizardEvent::Backspace { index } => Applied::Edit(wizard.otp_backspace(index)),
            WizardEvent::Paste(text) => Applied::Edit(wizard.paste_otp(&text)),
            WizardEvent::Submit => Applied::Move(wizard.submit().await),
            WizardEvent::Back => Applied::Move(wizard.back()),
            WizardEvent::Resend => Applied::Move(wizard.resend().await),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Applied {
    Edit(bool),
    Move(Transition),
}

/// Reads wizard events from a CSV source.
///
/// Wraps `csv::Reader` and yields one `Result<WizardEvent>` per row, so a bad
/// row can be reported and skipped without stopping the script.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and converts events.
    pub fn events(self) -> impl Iterator<Item = Result<WizardEvent>> {
        self.reader
            .into_deserialize::<EventRecord>()
            .map(|row| row.map_err(WizardError::from).and_then(WizardEvent::try_from))
    }
}
