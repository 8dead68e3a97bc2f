//! Canonical material slot list and its two-line text contract.
//!
//! The slot-info file crosses process boundaries: it is written once per run
//! and read by the modeling-tool hook and the engine hook. Its shape is fixed:
//!
//! ```text
//! name1,name2,...
//! name1:type1,name2:type2,...
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Outline type of a slot no mesh section references.
pub const OUTLINE_UNSET: i32 = -1;

/// Delimiter between fields on both lines.
pub const FIELD_DELIMITER: char = ',';

/// Delimiter between a slot name and its outline type on line 2.
pub const TYPE_DELIMITER: char = ':';

/// One canonical material slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Slot name exactly as shipped in the original asset.
    pub name: String,
    /// Outline type tag, [`OUTLINE_UNSET`] if no section uses the slot.
    pub outline_type: i32,
}

impl Slot {
    pub fn new(name: impl Into<String>, outline_type: i32) -> Self {
        Self {
            name: name.into(),
            outline_type,
        }
    }
}

/// The ordered canonical slot list of one asset.
///
/// Order is load-bearing: it is the import slot order and downstream steps
/// refer to slots by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    slots: Vec<Slot>,
}

impl SlotInfo {
    /// Builds a slot list, rejecting empty lists, duplicate names and names
    /// that would break the text contract.
    pub fn new(slots: Vec<Slot>) -> Result<Self, ParseError> {
        if slots.is_empty() {
            return Err(ParseError::NoSlots);
        }

        let mut seen = HashSet::new();
        for slot in &slots {
            if !is_valid_slot_name(&slot.name) {
                return Err(ParseError::InvalidSlotName(slot.name.clone()));
            }
            if !seen.insert(slot.name.as_str()) {
                return Err(ParseError::DuplicateSlot(slot.name.clone()));
            }
        }

        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot names in canonical order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Outline types in canonical order.
    pub fn outline_types(&self) -> Vec<i32> {
        self.slots.iter().map(|s| s.outline_type).collect()
    }

    /// Outline type of the named slot.
    pub fn outline_type(&self, name: &str) -> Option<i32> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.outline_type)
    }

    /// Serializes to the two-line text contract.
    pub fn to_wire(&self) -> String {
        let names = self
            .slots
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let types = self
            .slots
            .iter()
            .map(|s| format!("{}{}{}", s.name, TYPE_DELIMITER, s.outline_type))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}\n{}\n", names, types)
    }

    /// Parses the two-line text contract.
    ///
    /// Accepts `\r\n` line endings and whitespace around fields. Line 1 is the
    /// authority for order; line 2 must list the same names in the same order.
    pub fn from_wire(text: &str) -> Result<Self, ParseError> {
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.len() < 2 {
            return Err(ParseError::MissingLines { found: lines.len() });
        }

        let names: Vec<&str> = lines[0].split(FIELD_DELIMITER).map(str::trim).collect();
        let entries: Vec<&str> = lines[1].split(FIELD_DELIMITER).map(str::trim).collect();

        if names.len() != entries.len() {
            return Err(ParseError::LineMismatch {
                index: names.len().min(entries.len()),
                expected: format!("{} entries", names.len()),
                found: format!("{} entries", entries.len()),
            });
        }

        let mut slots = Vec::with_capacity(names.len());
        for (index, (name, entry)) in names.iter().zip(&entries).enumerate() {
            let (entry_name, outline) = entry
                .rsplit_once(TYPE_DELIMITER)
                .ok_or_else(|| ParseError::MalformedEntry(entry.to_string()))?;
            let entry_name = entry_name.trim();
            if entry_name != *name {
                return Err(ParseError::LineMismatch {
                    index,
                    expected: name.to_string(),
                    found: entry_name.to_string(),
                });
            }
            let outline_type = outline
                .trim()
                .parse::<i32>()
                .map_err(|_| ParseError::MalformedEntry(entry.to_string()))?;
            slots.push(Slot::new(*name, outline_type));
        }

        Self::new(slots)
    }
}

fn is_valid_slot_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name.trim() == name
        && !name.contains(FIELD_DELIMITER)
        && !name.contains(TYPE_DELIMITER)
        && !name.contains('\n')
        && !name.contains('\r')
}
