//! Human-readable invoice codes such as `APSPR004`.
//!
//! A code is the organization code, a short class code and a zero-padded
//! sequence number. The number continues from whatever the mirrored invoice
//! list already holds for the class.

use std::collections::HashMap;

use schooldesk_core::Invoice;

use crate::error::AppError;

/// Organization code used when none is configured.
pub const DEFAULT_ORGANIZATION_CODE: &str = "APS";

/// Ordered substring rules; the first match wins.
const CLASS_RULES: &[(&[&str], &str)] = &[
    (&["pre", "pkg"], "PR"),
    (&["lkg", "nursery"], "LK"),
    (&["ukg", "kinder"], "UK"),
    (&["1"], "C1"),
    (&["2"], "C2"),
];

const FALLBACK_CLASS_CODE: &str = "INV";

fn normalize(class_name: &str) -> String {
    class_name.trim().to_lowercase()
}

/// Maps a free-text class name onto one of `PR`, `LK`, `UK`, `C1`, `C2` or `INV`.
pub fn class_code(class_name: &str) -> &'static str {
    let normalized = normalize(class_name);
    CLASS_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| normalized.contains(needle)))
        .map(|(_, code)| *code)
        .unwrap_or(FALLBACK_CLASS_CODE)
}

pub fn prefix(organization_code: &str, class_name: &str) -> String {
    format!("{}{}", organization_code, class_code(class_name))
}

/// Value of the run of ASCII digits at the end of `display_id`.
///
/// Only a trailing run counts: `APSPR12A` has no suffix and reads as 0, as
/// does a run too large for `u32`.
fn trailing_number(display_id: &str) -> u32 {
    let digits = display_id.len()
        - display_id
            .bytes()
            .rev()
            .take_while(u8::is_ascii_digit)
            .count();
    display_id[digits..].parse().unwrap_or(0)
}

/// Next sequence number for `class_name` given the current invoice list.
///
/// An invoice counts toward the class when its code starts with the class
/// prefix, or when its stored class normalizes to the same name. The result is
/// one past the larger of that count and the highest numeric suffix seen, or
/// `None` once the suffix has reached `u32::MAX`.
pub fn next_sequence(organization_code: &str, class_name: &str, invoices: &[Invoice]) -> Option<u32> {
    let prefix = prefix(organization_code, class_name);
    let normalized = normalize(class_name);

    let mut matching = 0u32;
    let mut highest = 0u32;
    for invoice in invoices {
        let has_prefix = invoice.display_id.starts_with(&prefix);
        let same_class = invoice
            .student_class
            .as_deref()
            .is_some_and(|class| normalize(class) == normalized);
        if !(has_prefix || same_class) {
            continue;
        }
        matching += 1;
        if has_prefix {
            highest = highest.max(trailing_number(&invoice.display_id[prefix.len()..]));
        }
    }

    matching.max(highest).checked_add(1)
}

pub fn format_display_id(prefix: &str, sequence: u32) -> String {
    format!("{}{:03}", prefix, sequence)
}

/// Generates the next display identifier for `class_name` from a snapshot of
/// the invoice list. Pure; two callers holding the same snapshot get the same
/// answer, see [`SequenceAllocator`] for issuing codes.
pub fn generate_display_id(organization_code: &str, class_name: &str, invoices: &[Invoice]) -> Option<String> {
    next_sequence(organization_code, class_name, invoices)
        .map(|sequence| format_display_id(&prefix(organization_code, class_name), sequence))
}

fn exhausted(prefix: &str) -> AppError {
    AppError::Validation(format!("no display ids left for prefix {}", prefix))
}

/// Keeps a per-prefix high-water mark of written identifiers so a code is
/// never handed out twice, even while the mirrored invoice list has not caught
/// up with the last write.
///
/// Callers serialize peek-write-observe (the store holds it behind an async mutex).
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    organization_code: String,
    issued: HashMap<String, u32>,
}

impl SequenceAllocator {
    pub fn new(organization_code: impl Into<String>) -> Self {
        Self {
            organization_code: organization_code.into(),
            issued: HashMap::new(),
        }
    }

    pub fn organization_code(&self) -> &str {
        &self.organization_code
    }

    /// Next identifier for the class. Nothing is reserved until the caller
    /// reports the identifier as written with [`observe`](Self::observe).
    pub fn peek(&self, class_name: &str, invoices: &[Invoice]) -> Result<String, AppError> {
        let prefix = prefix(&self.organization_code, class_name);
        let computed = next_sequence(&self.organization_code, class_name, invoices);
        let sequence = match self.issued.get(&prefix) {
            Some(last) => computed.zip(last.checked_add(1)).map(|(c, l)| c.max(l)),
            None => computed,
        };
        sequence
            .map(|sequence| format_display_id(&prefix, sequence))
            .ok_or_else(|| exhausted(&prefix))
    }

    /// Records an identifier that is now stored on an invoice of `class_name`.
    pub fn observe(&mut self, class_name: &str, display_id: &str) {
        let prefix = prefix(&self.organization_code, class_name);
        let Some(rest) = display_id.strip_prefix(prefix.as_str()) else {
            return;
        };
        let sequence = trailing_number(rest);
        if sequence == 0 {
            return;
        }
        tracing::trace!(display_id, sequence, "Recorded invoice display id");
        let last = self.issued.entry(prefix).or_insert(0);
        *last = (*last).max(sequence);
    }
}
