//! One-time passcode values and the six-slot entry model.
//!
//! [`OtpInput`] mirrors how users type a code into six single-character
//! boxes: typing advances focus, backspace on an empty box steps back, and
//! pasting fills the boxes from the start with the digits of the clipboard.

use std::fmt;

use crate::{Error, Result};

/// Number of digits in a verification code.
pub const OTP_LENGTH: usize = 6;

/// A syntactically valid six-digit verification code.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OtpCode(String);

impl OtpCode {
    /// Parses a code, rejecting anything that is not exactly six ASCII digits.
    pub fn parse(code: &str) -> Result<Self> {
        if code.len() != OTP_LENGTH {
            return Err(Error::invalid_input()
                .with_message(format!("Please enter all {OTP_LENGTH} digits")));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_input().with_message("The code may only contain digits"));
        }
        Ok(Self(code.to_owned()))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Six single-digit slots plus the index of the focused slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtpInput {
    slots: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpInput {
    /// Creates an empty input focused on the first slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the focused slot.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Moves focus to `index`, clamped to the last slot.
    pub fn set_focus(&mut self, index: usize) {
        self.focus = index.min(OTP_LENGTH - 1);
    }

    /// Returns the digit in slot `index`, if any.
    pub fn slot(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    /// Returns the entered digits in slot order, skipping empty slots.
    pub fn digits(&self) -> String {
        self.slots.iter().flatten().collect()
    }

    /// Returns `true` when every slot holds a digit.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Returns the code once all six slots are filled.
    pub fn code(&self) -> Option<OtpCode> {
        self.is_complete()
            .then(|| OtpCode::parse(&self.digits()).ok())
            .flatten()
    }

    /// Types `ch` into slot `index`.
    ///
    /// Non-digits are ignored. A digit fills the slot and moves focus to the
    /// next slot unless `index` is the last one.
    pub fn type_char(&mut self, index: usize, ch: char) {
        if index >= OTP_LENGTH || !ch.is_ascii_digit() {
            return;
        }

        self.slots[index] = Some(ch);
        self.focus = if index + 1 < OTP_LENGTH { index + 1 } else { index };
    }

    /// Handles backspace in slot `index`.
    ///
    /// A filled slot is cleared and keeps focus; an empty slot moves focus
    /// to the previous one.
    pub fn backspace(&mut self, index: usize) {
        if index >= OTP_LENGTH {
            return;
        }

        if self.slots[index].take().is_some() {
            self.focus = index;
        } else {
            self.focus = index.saturating_sub(1);
        }
    }

    /// Pastes `text` into the input.
    ///
    /// Non-digits are stripped and the rest is truncated to six digits, which
    /// fill the slots from the start; remaining slots are emptied. Focus goes
    /// to the first empty slot, or the last slot when the input is full.
    pub fn paste(&mut self, text: &str) {
        let mut digits = text.chars().filter(char::is_ascii_digit).take(OTP_LENGTH);

        for slot in &mut self.slots {
            *slot = digits.next();
        }

        self.focus = self
            .slots
            .iter()
            .position(Option::is_none)
            .unwrap_or(OTP_LENGTH - 1);
    }

    /// Empties every slot and focuses the first one.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
