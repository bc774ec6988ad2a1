//! Structural checks on frames and documents, and the dangling reference
//! scan.

use tracing::trace;

use crate::error::{OboError, Result};
use crate::model::{Clause, Document, Frame, FrameType};
use crate::tag::Tag;

// at most one of each, whatever the frame type
static SINGLE_VALUED: &[Tag] = &[
    Tag::IsAnonymous,
    Tag::Name,
    Tag::Def,
    Tag::Comment,
    Tag::IsAntiSymmetric,
    Tag::IsCyclic,
    Tag::IsReflexive,
    Tag::IsSymmetric,
    Tag::IsTransitive,
    Tag::IsFunctional,
    Tag::IsInverseFunctional,
    Tag::IsObsolete,
    Tag::CreatedBy,
    Tag::CreationDate,
];

static SINGLE_VALUED_IN_HEADER: &[Tag] = &[
    Tag::Ontology,
    Tag::FormatVersion,
    Tag::Date,
    Tag::DefaultNamespace,
    Tag::SavedBy,
    Tag::AutoGeneratedBy,
];

static SINGLE_VALUED_IN_TYPEDEF: &[Tag] = &[
    Tag::Domain,
    Tag::Range,
    Tag::IsMetadataTag,
    Tag::IsClassLevel,
];

impl Frame {
    /// Cardinality check. Stops at the first violation and never mutates.
    pub fn check(&self) -> Result<()> {
        match self.frame_type() {
            FrameType::Header => self.check_at_most_one(SINGLE_VALUED_IN_HEADER)?,
            FrameType::Typedef => self.check_at_most_one(SINGLE_VALUED_IN_TYPEDEF)?,
            _ => {}
        }
        if self.frame_type() != FrameType::Header {
            let ids: Vec<&Clause> = self.clauses_for(Tag::Id.text()).collect();
            if ids.len() != 1 {
                return Err(OboError::structure(self, "cardinality of id field must be 1"));
            }
            if ids[0].values().is_empty() {
                return Err(OboError::structure(self, "id field must be set"));
            }
            if self.id().is_none() {
                return Err(OboError::structure(self, "id field must be set"));
            }
        }
        if self.count(Tag::IntersectionOf.text()) == 1 {
            return Err(OboError::structure(
                self,
                "single intersection_of tags are not allowed",
            ));
        }
        self.check_at_most_one(SINGLE_VALUED)
    }

    fn check_at_most_one(&self, tags: &[Tag]) -> Result<()> {
        for tag in tags {
            if self.count(tag.text()) > 1 {
                return Err(OboError::structure(
                    self,
                    format!("multiple {} tags not allowed.", tag),
                ));
            }
        }
        Ok(())
    }
}

impl Document {
    /// Checks the header, then term, typedef and instance frames.
    pub fn check(&self) -> Result<()> {
        if let Some(header) = self.header() {
            header.check()?;
        }
        for frame in self
            .term_frames()
            .chain(self.typedef_frames())
            .chain(self.instance_frames())
        {
            frame.check()?;
        }
        Ok(())
    }
}

// ------------- Dangling references -------------
struct Scan<'d> {
    doc: &'d Document,
    follow_imports: bool,
    problems: Vec<String>,
}

impl<'d> Scan<'d> {
    fn relation(&mut self, id: Option<&str>, tag: &str, frame: &Frame) {
        let Some(id) = id else { return };
        if !self.doc.contains_typedef(id, self.follow_imports) {
            self.problems.push(format!(
                "The relation '{}' reference in the tag '{}' in the frame of id '{}' is not declared",
                id,
                tag,
                frame.id().unwrap_or("")
            ));
        }
    }
    fn class(&mut self, id: Option<&str>, tag: &str, frame: &Frame) {
        let Some(id) = id else { return };
        if !self.doc.contains_term(id, self.follow_imports) {
            self.problems.push(format!(
                "The class '{}' reference in the tag '{}' in the frame of id '{}' is not declared",
                id,
                tag,
                frame.id().unwrap_or("")
            ));
        }
    }

    fn term_clause(&mut self, frame: &Frame, clause: &Clause, tag: Tag) {
        if !tag.references_in_term() {
            return;
        }
        let first = clause.values().first().and_then(|v| v.as_id());
        match clause.value2().and_then(|v| v.as_id()) {
            Some(second) => {
                self.relation(first, clause.tag(), frame);
                self.class(Some(second), clause.tag(), frame);
            }
            None => self.class(first, clause.tag(), frame),
        }
    }

    fn typedef_clause(&mut self, frame: &Frame, clause: &Clause, tag: Tag) {
        let first = clause.values().first().and_then(|v| v.as_id());
        let second = clause.value2().and_then(|v| v.as_id());
        if tag.references_in_typedef() {
            self.relation(first, clause.tag(), frame);
        } else if matches!(tag, Tag::HoldsOverChain | Tag::EquivalentToChain | Tag::Relationship) {
            self.relation(first, clause.tag(), frame);
            self.relation(second, clause.tag(), frame);
        } else if matches!(tag, Tag::Domain | Tag::Range) {
            self.class(first, clause.tag(), frame);
        }
    }
}

/// Lists identifiers that term and typedef frames reference but that are
/// declared nowhere reachable. Only known tags are inspected. Never fails;
/// an empty list means every reference resolves.
pub fn dangling_references(doc: &Document, follow_imports: bool) -> Vec<String> {
    let mut scan = Scan {
        doc,
        follow_imports,
        problems: Vec::new(),
    };
    for frame in doc.term_frames() {
        for clause in frame.clauses() {
            if let Some(tag) = clause.known_tag() {
                scan.term_clause(frame, clause, tag);
            }
        }
    }
    for frame in doc.typedef_frames() {
        for clause in frame.clauses() {
            if let Some(tag) = clause.known_tag() {
                scan.typedef_clause(frame, clause, tag);
            }
        }
    }
    trace!(count = scan.problems.len(), "dangling reference scan finished");
    scan.problems
}

impl Document {
    pub fn dangling_references(&self, follow_imports: bool) -> Vec<String> {
        dangling_references(self, follow_imports)
    }
}
