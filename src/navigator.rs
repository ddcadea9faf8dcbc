//! Keyboard-driven navigation over the candidates of a dotted path.
//!
//! Everything except the explicit selection is derived from `raw_path` on each call, so a
//! snapshot of the navigator can always be rendered without further bookkeeping.

use crate::resolver::{self, Candidate};
use crate::value::format_value;
use crate::{AipError, DataValue};
use tracing::{debug, warn};

/// Direction for stepping through the candidate list. The list wraps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Forward,
    Backward,
}

/// The navigation state of one open popup.
#[derive(Debug, Clone)]
pub struct PathNavigator {
    data: DataValue,
    raw_path: String,
    selected_index: Option<usize>,
    key_prefix: String,
    exclusion_filters: Vec<String>,
}

/// One row of the rendered candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewEntry {
    pub key: String,
    /// Byte length of the key prefix that matches the typed path (0 when it does not match).
    pub matched: usize,
    pub value: String,
}

impl ViewEntry {
    /// Splits the key into its highlighted and plain parts.
    pub fn split_key(&self) -> (&str, &str) {
        self.key.split_at(self.matched)
    }
}

/// Everything the renderer needs to draw the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub key_prefix: String,
    pub path: String,
    pub entries: Vec<ViewEntry>,
    pub highlighted: usize,
}

impl PathNavigator {
    pub fn new(data: DataValue, key_prefix: impl Into<String>, exclusion_filters: Vec<String>) -> Self {
        Self {
            data,
            raw_path: String::new(),
            selected_index: None,
            key_prefix: key_prefix.into(),
            exclusion_filters,
        }
    }

    /// Seeds the path; a default naming a node with children gets its trailing dot.
    pub fn with_initial_path(mut self, path: &str) -> Self {
        if !path.is_empty() {
            let seeded = resolver::key_with_trailing_dot(&self.data, path);
            self.set_raw_path(seeded);
        }
        self
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn set_raw_path(&mut self, text: impl Into<String>) {
        self.raw_path = text.into();
        self.selected_index = None;
    }

    pub fn clear_selection(&mut self) {
        self.selected_index = None;
    }

    /// The raw path without the segment still being typed.
    pub fn path_prefix(&self) -> &str {
        self.raw_path
            .rsplit_once('.')
            .map_or("", |(prefix, _partial)| prefix)
    }

    pub fn candidates(&self) -> Vec<Candidate<'_>> {
        resolver::sorted_children_at(&self.data, self.path_prefix(), &self.exclusion_filters)
    }

    fn position_of_best(&self, candidates: &[Candidate<'_>]) -> Option<usize> {
        candidates
            .iter()
            .position(|c| c.key.starts_with(self.raw_path.as_str()))
    }

    /// The first candidate whose key extends the full raw path, partial segment included.
    pub fn best_match(&self) -> Option<Candidate<'_>> {
        let candidates = self.candidates();
        let index = self.position_of_best(&candidates)?;
        candidates.into_iter().nth(index)
    }

    pub fn index_of_best_match(&self) -> Option<usize> {
        self.position_of_best(&self.candidates())
    }

    pub fn selected_or_best_match(&self) -> Option<Candidate<'_>> {
        let candidates = self.candidates();
        let index = match self.selected_index {
            Some(index) => index,
            None => self.position_of_best(&candidates)?,
        };
        candidates.into_iter().nth(index)
    }

    /// Moves the selection one step, starting from the best match when nothing is selected.
    /// With no best match either, forward lands on the first entry and backward on the last.
    pub fn cycle(&mut self, direction: Cycle) -> Option<usize> {
        let candidates = self.candidates();
        let len = candidates.len();
        if len == 0 {
            self.selected_index = None;
            return None;
        }

        let current = self
            .selected_index
            .filter(|index| *index < len)
            .or_else(|| self.position_of_best(&candidates));
        let next = match (direction, current) {
            (Cycle::Forward, Some(index)) => (index + 1) % len,
            (Cycle::Backward, Some(index)) => (index + len - 1) % len,
            (Cycle::Forward, None) => 0,
            (Cycle::Backward, None) => len - 1,
        };

        debug!(?direction, from = ?current, to = next, len, "cycle selection");
        self.selected_index = Some(next);
        self.selected_index
    }

    /// Completes the path to the selected or best candidate. Nodes with children gain a
    /// trailing dot so their members list straight away.
    pub fn descend(&mut self) -> Result<(), AipError> {
        let next = match self.selected_or_best_match() {
            Some(candidate) if candidate.value.has_children() => Ok(format!("{}.", candidate.key)),
            Some(candidate) => Ok(candidate.key),
            None => Err(AipError::NoMatchFound(self.raw_path.clone())),
        };

        match next {
            Ok(path) => {
                debug!(from = %self.raw_path, to = %path, "descend");
                self.set_raw_path(path);
                Ok(())
            }
            Err(err) => {
                warn!("{err}");
                self.set_raw_path(String::new());
                Err(err)
            }
        }
    }

    /// Goes up one level. The last character is ignored so that `a.b.` climbs to `a.`.
    pub fn ascend(&mut self) {
        let trimmed = match self.raw_path.char_indices().next_back() {
            Some((last, _)) => &self.raw_path[..last],
            None => "",
        };
        let next = match trimmed.rfind('.') {
            Some(dot) if dot > 0 => self.raw_path[..=dot].to_string(),
            _ => String::new(),
        };

        debug!(from = %self.raw_path, to = %next, "ascend");
        self.set_raw_path(next);
    }

    /// Picks a candidate by key, as a click on a list row does.
    pub fn choose_key(&mut self, key: &str) {
        let path = resolver::key_with_trailing_dot(&self.data, key);
        self.set_raw_path(path);
    }

    /// The reference to insert. Falls back to the literal text when nothing matches.
    pub fn confirm(&self) -> String {
        let key = self
            .selected_or_best_match()
            .map(|candidate| candidate.key)
            .unwrap_or_else(|| self.raw_path.clone());
        format!("{}{key}", self.key_prefix)
    }

    pub fn view(&self) -> PopupView {
        let candidates = self.candidates();
        let mut first_match = None;

        let entries: Vec<ViewEntry> = candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let matched = if candidate.key.starts_with(self.raw_path.as_str()) {
                    if first_match.is_none() && !self.raw_path.is_empty() {
                        first_match = Some(index);
                    }
                    self.raw_path.len()
                } else {
                    0
                };
                ViewEntry {
                    key: candidate.key.clone(),
                    matched,
                    value: format_value(candidate.value),
                }
            })
            .collect();

        let highlighted = self
            .selected_index
            .filter(|index| *index < entries.len())
            .or(first_match)
            .unwrap_or(0);

        PopupView {
            key_prefix: self.key_prefix.clone(),
            path: self.raw_path.clone(),
            entries,
            highlighted,
        }
    }
}
