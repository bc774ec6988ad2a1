//! Xref expansion: header macros such as
//! `treat-xrefs-as-genus-differentia: CL part_of NCBITaxon:7955` turn plain
//! `xref` clauses into logical axioms. Derived clauses go into bridge
//! documents, except for equivalence which is stated on the source frame.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{OboError, Result};
use crate::model::{Clause, Document, Frame, FrameType, SharedDocument};
use crate::tag::Tag;
use crate::value::id_space;

// ------------- Expansion -------------
/// What a header macro makes of an xref into its id space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    Equivalence,
    /// `is_a <source id>` on the bridge frame named by the xref, the same
    /// output as [`Expansion::HasSubclass`]. This differs on purpose from
    /// the older behavior of putting `is_a <xref>` on a bridge frame for the
    /// source id.
    IsA,
    HasSubclass,
    GenusDifferentia { relation: String, filler: String },
    ReverseGenusDifferentia { relation: String, filler: String },
    Relationship { relation: String },
}

impl Expansion {
    /// Builds the expansion for a macro clause, returning the id space it
    /// applies to. `None` means the clause is not an expansion macro.
    pub fn from_clause(clause: &Clause) -> Result<Option<(String, Expansion)>> {
        let tag = match clause.known_tag() {
            Some(tag) => tag,
            None => return Ok(None),
        };
        let text = clause.text().unwrap_or("");
        let parts: Vec<&str> = text.split_whitespace().collect();
        let space = parts.first().copied().unwrap_or("");
        let part = |i: usize, name: &str| -> Result<String> {
            parts
                .get(i)
                .map(|p| p.to_string())
                .ok_or_else(|| OboError::xref_macro(space, format!("{} is missing a {}", tag, name)))
        };
        let expansion = match tag {
            Tag::TreatXrefsAsEquivalent => Expansion::Equivalence,
            Tag::TreatXrefsAsIsA => Expansion::IsA,
            Tag::TreatXrefsAsHasSubclass => Expansion::HasSubclass,
            Tag::TreatXrefsAsGenusDifferentia => Expansion::GenusDifferentia {
                relation: part(1, "relation")?,
                filler: part(2, "filler")?,
            },
            Tag::TreatXrefsAsReverseGenusDifferentia => Expansion::ReverseGenusDifferentia {
                relation: part(1, "relation")?,
                filler: part(2, "filler")?,
            },
            Tag::TreatXrefsAsRelationship => Expansion::Relationship {
                relation: part(1, "relation")?,
            },
            _ => return Ok(None),
        };
        if space.is_empty() {
            return Err(OboError::xref_macro(space, format!("{} names no id space", tag)));
        }
        Ok(Some((space.to_owned(), expansion)))
    }

    /// The relation the macro uses, if any.
    pub fn relation(&self) -> Option<&str> {
        match self {
            Expansion::GenusDifferentia { relation, .. }
            | Expansion::ReverseGenusDifferentia { relation, .. }
            | Expansion::Relationship { relation } => Some(relation),
            _ => None,
        }
    }
}

impl fmt::Display for Expansion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expansion::Equivalence => write!(f, "equivalence"),
            Expansion::IsA => write!(f, "is_a"),
            Expansion::HasSubclass => write!(f, "has-subclass"),
            Expansion::GenusDifferentia { relation, filler } => {
                write!(f, "genus-differentia({} {})", relation, filler)
            }
            Expansion::ReverseGenusDifferentia { relation, filler } => {
                write!(f, "reverse-genus-differentia({} {})", relation, filler)
            }
            Expansion::Relationship { relation } => write!(f, "relationship({})", relation),
        }
    }
}

fn add_rule(rules: &mut HashMap<String, Expansion>, space: String, expansion: Expansion) -> Result<()> {
    if rules.contains_key(&space) {
        return Err(OboError::xref_macro(space, "more than one macro for this id space"));
    }
    debug!(id_space = %space, %expansion, "xref macro");
    rules.insert(space, expansion);
    Ok(())
}

// ------------- Expander -------------
/// Applies the expansion macros of a document's header. Expansion is not
/// idempotent: running it twice derives every clause twice.
pub struct XrefExpander<'d> {
    source: &'d mut Document,
    rules: HashMap<String, Expansion>,
    target: Option<SharedDocument>,
    bridges: HashMap<String, SharedDocument>,
}

impl<'d> XrefExpander<'d> {
    /// One bridge document for all macros, with ontology
    /// `<source ontology>/xref_expansions`, attached as an import of the
    /// source.
    pub fn new(source: &'d mut Document) -> Result<Self> {
        let ontology = source
            .header()
            .and_then(|h| h.tag_text(Tag::Ontology.text()))
            .unwrap_or("")
            .to_owned();
        let target = bridge_document(format!("{}/xref_expansions", ontology)).into_shared();
        let mut expander = Self::build(source, Some(Rc::clone(&target)), None)?;
        expander.source.add_import(target);
        Ok(expander)
    }

    /// One bridge document per macro, with ontology
    /// `<base>-<lowercased id space>`, each attached as an import of the
    /// source. Typedefs of relations used by a macro are copied into its
    /// bridge.
    pub fn with_target_base(source: &'d mut Document, base: &str) -> Result<Self> {
        Self::build(source, None, Some(base))
    }

    /// All derived clauses go into `target`, which is not attached to the
    /// source.
    pub fn with_target(source: &'d mut Document, target: SharedDocument) -> Result<Self> {
        Self::build(source, Some(target), None)
    }

    // all macros are checked before any bridge is attached to the source
    fn build(
        source: &'d mut Document,
        target: Option<SharedDocument>,
        base: Option<&str>,
    ) -> Result<Self> {
        let mut rules = HashMap::new();
        let mut spaces = Vec::new();
        if let Some(header) = source.header() {
            for clause in header.clauses() {
                let Some((space, expansion)) = Expansion::from_clause(clause)? else {
                    continue;
                };
                add_rule(&mut rules, space.clone(), expansion)?;
                spaces.push(space);
            }
        }
        let mut expander = Self {
            source,
            rules,
            target,
            bridges: HashMap::new(),
        };
        if let Some(base) = base {
            for space in spaces {
                let relation = expander.rules.get(&space).and_then(|e| e.relation()).map(str::to_owned);
                expander.add_bridge(base, &space, relation.as_deref());
            }
        }
        Ok(expander)
    }

    fn add_bridge(&mut self, base: &str, space: &str, relation: Option<&str>) {
        let mut bridge = bridge_document(format!("{}-{}", base, space.to_lowercase()));
        if let Some(relation) = relation {
            if let Some(typedef) = self.source.typedef_frame(relation) {
                if let Err(e) = bridge.add_typedef_frame(typedef.clone()) {
                    debug!(error = %e, relation, "typedef could not be copied into the bridge");
                }
            }
        }
        let bridge = bridge.into_shared();
        self.source.add_import(Rc::clone(&bridge));
        self.bridges.insert(space.to_owned(), bridge);
    }

    pub fn rules(&self) -> &HashMap<String, Expansion> {
        &self.rules
    }

    /// Document receiving the clauses derived for an id space.
    pub fn target_doc(&self, space: &str) -> Option<SharedDocument> {
        match &self.target {
            Some(target) => Some(Rc::clone(target)),
            None => self.bridges.get(space).cloned(),
        }
    }

    /// Rewrites every xref of every term frame whose id space has a macro.
    /// Returns the number of clauses added.
    pub fn expand(&mut self) -> Result<usize> {
        let mut pending = Vec::new();
        for frame in self.source.term_frames() {
            let Some(id) = frame.id() else { continue };
            for clause in frame.clauses_for(Tag::Xref.text()) {
                let Some(xref) = clause.values().first().and_then(|v| v.as_id()) else {
                    continue;
                };
                if let Some(expansion) = self.rules.get(id_space(xref)) {
                    pending.push((id.to_owned(), xref.to_owned(), expansion.clone()));
                }
            }
        }
        let mut added = 0;
        for (id, xref, expansion) in pending {
            added += self.apply(&id, &xref, &expansion)?;
        }
        debug!(added, "xref expansion finished");
        Ok(added)
    }

    fn apply(&mut self, id: &str, xref: &str, expansion: &Expansion) -> Result<usize> {
        let space = id_space(xref);
        match expansion {
            Expansion::Equivalence => {
                if let Some(frame) = self.source.term_frame_mut(id) {
                    frame.add_clause(Clause::with_value(Tag::EquivalentTo.text(), xref));
                }
                Ok(1)
            }
            Expansion::IsA | Expansion::HasSubclass => {
                self.add_to_target(space, xref, vec![Clause::with_value(Tag::IsA.text(), id)])
            }
            Expansion::GenusDifferentia { relation, filler } => self.add_to_target(
                space,
                id,
                vec![
                    Clause::with_value(Tag::IntersectionOf.text(), xref),
                    Clause::with_pair(Tag::IntersectionOf.text(), relation.as_str(), filler.as_str()),
                ],
            ),
            Expansion::ReverseGenusDifferentia { relation, filler } => self.add_to_target(
                space,
                xref,
                vec![
                    Clause::with_value(Tag::IntersectionOf.text(), id),
                    Clause::with_pair(Tag::IntersectionOf.text(), relation.as_str(), filler.as_str()),
                ],
            ),
            Expansion::Relationship { relation } => self.add_to_target(
                space,
                id,
                vec![Clause::with_pair(Tag::Relationship.text(), relation.as_str(), xref)],
            ),
        }
    }

    // adds clauses to the frame `frame_id` of the bridge for `space`,
    // creating the frame as a term frame when it is not there yet
    fn add_to_target(&mut self, space: &str, frame_id: &str, clauses: Vec<Clause>) -> Result<usize> {
        let Some(target) = self.target_doc(space) else {
            return Ok(0);
        };
        let mut doc = target.borrow_mut();
        if doc.term_frame(frame_id).is_none() {
            doc.add_term_frame(Frame::with_id(FrameType::Term, frame_id))?;
        }
        let count = clauses.len();
        if let Some(frame) = doc.term_frame_mut(frame_id) {
            for clause in clauses {
                frame.add_clause(clause);
            }
        }
        Ok(count)
    }
}

fn bridge_document(ontology: String) -> Document {
    let mut header = Frame::new(FrameType::Header);
    header.add_clause(Clause::with_value(Tag::Ontology.text(), ontology));
    let mut doc = Document::new();
    doc.set_header(header);
    doc
}
