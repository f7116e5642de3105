use super::validation::{Field, ValidationErrors};

pub const OTP_LENGTH: usize = 6;

/// The six one-digit cells of a verification code.
///
/// Cells are addressed by index; `focus` tracks which cell the next keystroke
/// belongs to so the presentation layer can move its cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpCode {
    cells: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpCode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one cell. An empty input clears it; a single digit fills it and
    /// moves focus to the next cell. Anything else is refused.
    pub fn enter(&mut self, index: usize, input: &str) -> bool {
        if index >= OTP_LENGTH {
            return false;
        }
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                self.cells[index] = None;
                self.focus = index;
                true
            }
            (Some(c), None) if c.is_ascii_digit() => {
                self.cells[index] = Some(c);
                self.focus = (index + 1).min(OTP_LENGTH - 1);
                true
            }
            _ => false,
        }
    }

    /// Backspace on a filled cell clears it; on an empty cell it moves focus back.
    pub fn backspace(&mut self, index: usize) -> bool {
        if index >= OTP_LENGTH {
            return false;
        }
        if self.cells[index].is_some() {
            self.cells[index] = None;
            self.focus = index;
        } else if index > 0 {
            self.focus = index - 1;
        }
        true
    }

    /// Spreads pasted text over the cells from the start. Non-digits are
    /// dropped and anything past six digits is ignored; cells beyond the pasted
    /// digits are cleared.
    pub fn paste(&mut self, text: &str) -> usize {
        let digits: Vec<char> = text
            .chars()
            .filter(char::is_ascii_digit)
            .take(OTP_LENGTH)
            .collect();
        self.cells = [None; OTP_LENGTH];
        for (cell, digit) in self.cells.iter_mut().zip(&digits) {
            *cell = Some(*digit);
        }
        self.focus = digits.len().min(OTP_LENGTH - 1);
        digits.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn cell(&self, index: usize) -> Option<char> {
        self.cells.get(index).copied().flatten()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn joined(&self) -> String {
        self.cells.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// One error for the whole code; cells are not validated individually.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let joined = self.joined();
        if joined.len() != OTP_LENGTH || !joined.chars().all(|c| c.is_ascii_digit()) {
            errors.insert(Field::Otp, "Please enter complete 6-digit code");
        }
        errors
    }
}
