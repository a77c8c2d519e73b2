//! Inline annotations (review comments) and their placement against rows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::diff::Changeset;

use super::Row;

/// Which side of the two-up table an annotation is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "LEFT")]
    Old,
    #[serde(alias = "RIGHT")]
    New,
}

impl Side {
    /// Wire name, as serialized
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Old => "OLD",
            Self::New => "NEW",
        }
    }
}

/// A caller-supplied comment positioned at a file line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineAnnotation {
    pub id: i64,
    pub author: String,
    #[serde(default)]
    pub avatar_url: String,
    pub body: String,
    pub path: String,
    pub line: u32,
    pub side: Side,
}

impl InlineAnnotation {
    /// Whether this annotation belongs to the given changeset's file
    #[must_use]
    pub fn targets(&self, cs: &Changeset) -> bool {
        self.path == cs.display_path() || (self.side == Side::Old && self.path == cs.old_path)
    }
}

/// Annotations of one file keyed by (line, side), remembering caller order.
pub(super) struct AnnotationIndex<'a> {
    by_key: HashMap<(u32, Side), Vec<(usize, &'a InlineAnnotation)>>,
}

impl<'a> AnnotationIndex<'a> {
    pub(super) fn new(cs: &Changeset, annotations: &'a [InlineAnnotation]) -> Self {
        let mut by_key: HashMap<(u32, Side), Vec<(usize, &'a InlineAnnotation)>> = HashMap::new();
        for (order, annotation) in annotations.iter().enumerate() {
            if annotation.targets(cs) {
                by_key
                    .entry((annotation.line, annotation.side))
                    .or_default()
                    .push((order, annotation));
            }
        }
        Self { by_key }
    }

    /// Remove and return the annotations that follow `row`: new side first, then old side.
    pub(super) fn take_for_row(&mut self, row: &Row) -> Vec<InlineAnnotation> {
        let mut placed = Vec::new();
        let keys = [
            row.new_line.map(|line| (line, Side::New)),
            row.old_line.map(|line| (line, Side::Old)),
        ];
        for key in keys.into_iter().flatten() {
            if let Some(found) = self.by_key.remove(&key) {
                placed.extend(found.into_iter().map(|(_, a)| a.clone()));
            }
        }
        placed
    }

    /// Whatever no row claimed, in caller order.
    pub(super) fn into_unplaced(self) -> Vec<InlineAnnotation> {
        let mut rest: Vec<(usize, &InlineAnnotation)> =
            self.by_key.into_values().flatten().collect();
        rest.sort_by_key(|(order, _)| *order);
        rest.into_iter().map(|(_, a)| a.clone()).collect()
    }
}
