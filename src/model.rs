use std::cell::RefCell;
use std::rc::Rc;

// identifier to frame maps keep insertion order and use a fast hasher
use core::hash::BuildHasherDefault;
use indexmap::map::Entry;
use indexmap::IndexMap;
use seahash::SeaHasher;

// used to print out readable forms of a construct
use std::fmt;

use tracing::debug;

use crate::error::{OboError, Result};
use crate::tag::Tag;
use crate::value::{QualifierValue, Value, Xref};

pub type IdHasher = BuildHasherDefault<SeaHasher>;
pub type FrameMap = IndexMap<String, Frame, IdHasher>;

/// A document shared between several parents, e.g. an import reached from
/// two places, or a bridge document kept by the xref expander.
pub type SharedDocument = Rc<RefCell<Document>>;

// ------------- Clause -------------
/// One tag with its values, optionally carrying xrefs and qualifiers.
/// Position 0 of `values` is the primary value, position 1 the secondary
/// value used by binary relation tags.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    tag: String,
    values: Vec<Value>,
    xrefs: Vec<Xref>,
    qualifiers: Vec<QualifierValue>,
}

impl Clause {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }
    pub fn with_value(tag: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut clause = Self::new(tag);
        clause.values.push(value.into());
        clause
    }
    /// A binary clause such as `relationship: part_of X:1`.
    pub fn with_pair(tag: impl Into<String>, first: impl Into<Value>, second: impl Into<Value>) -> Self {
        let mut clause = Self::with_value(tag, first);
        clause.values.push(second.into());
        clause
    }
    pub fn tag(&self) -> &str {
        &self.tag
    }
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }
    /// The registry entry for this clause's tag, if it is a known tag.
    pub fn known_tag(&self) -> Option<Tag> {
        Tag::from_text(&self.tag)
    }
    pub fn is(&self, tag: Tag) -> bool {
        self.tag == tag.text()
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// The primary value. A clause without one is structurally broken.
    pub fn value(&self) -> Result<&Value> {
        self.values
            .first()
            .ok_or_else(|| OboError::structure(self, "clause value is missing"))
    }
    pub fn value2(&self) -> Option<&Value> {
        self.values.get(1)
    }
    /// Primary value as text, if it is text.
    pub fn text(&self) -> Option<&str> {
        self.values.first().and_then(Value::as_text)
    }
    pub fn text2(&self) -> Option<&str> {
        self.value2().and_then(Value::as_text)
    }
    pub fn bool(&self) -> Option<bool> {
        self.values.first().and_then(Value::as_bool)
    }
    /// Replaces all values with a single one.
    pub fn set_value(&mut self, value: impl Into<Value>) {
        self.values.clear();
        self.values.push(value.into());
    }
    pub fn add_value(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }
    pub fn set_values(&mut self, values: Vec<Value>) {
        self.values = values;
    }
    pub fn xrefs(&self) -> &[Xref] {
        &self.xrefs
    }
    pub fn add_xref(&mut self, xref: Xref) {
        self.xrefs.push(xref);
    }
    pub fn set_xrefs(&mut self, xrefs: Vec<Xref>) {
        self.xrefs = xrefs;
    }
    pub fn qualifiers(&self) -> &[QualifierValue] {
        &self.qualifiers
    }
    pub fn add_qualifier(&mut self, qualifier: QualifierValue) {
        self.qualifiers.push(qualifier);
    }
    pub fn set_qualifiers(&mut self, qualifiers: Vec<QualifierValue>) {
        self.qualifiers = qualifiers;
    }
    pub fn has_no_annotations(&self) -> bool {
        self.xrefs.is_empty() && self.qualifiers.is_empty()
    }
    /// Signals the clause is quiescent: spare capacity is released, and an
    /// empty collection ends up holding no allocation at all. Later
    /// mutation simply grows the vectors again.
    pub fn freeze(&mut self) {
        self.values.shrink_to_fit();
        self.xrefs.shrink_to_fit();
        self.qualifiers.shrink_to_fit();
    }
}

// order-insensitive comparison that respects duplicates
fn same_multiset<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut matched = vec![false; b.len()];
    a.iter().all(|x| {
        match b.iter().enumerate().position(|(i, y)| !matched[i] && x == y) {
            Some(i) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}

impl PartialEq for Clause {
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag {
            return false;
        }
        let values_equal = if self.values.len() == 1 && other.values.len() == 1 {
            self.values[0].loosely_equals(&other.values[0])
        } else {
            self.values == other.values
        };
        values_equal
            && same_multiset(&self.xrefs, &other.xrefs)
            && same_multiset(&self.qualifiers, &other.qualifiers)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.tag)?;
        for value in &self.values {
            write!(f, " {}", value)?;
        }
        if !self.qualifiers.is_empty() {
            write!(f, "{{")?;
            for qualifier in &self.qualifiers {
                write!(f, "{} ", qualifier)?;
            }
            write!(f, "}}")?;
        }
        if !self.xrefs.is_empty() {
            write!(f, "[")?;
            for xref in &self.xrefs {
                write!(f, "{} ", xref)?;
            }
            write!(f, "]")?;
        }
        write!(f, ")")
    }
}

// ------------- Frame -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Header,
    Term,
    Typedef,
    Instance,
    Annotation,
}
impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FrameType::Header => "Header",
            FrameType::Term => "Term",
            FrameType::Typedef => "Typedef",
            FrameType::Instance => "Instance",
            FrameType::Annotation => "Annotation",
        };
        write!(f, "{}", name)
    }
}

/// One stanza: an identifier (absent only for the header), a type and the
/// clauses in the order they were read. Several clauses may share a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    id: Option<String>,
    frame_type: FrameType,
    clauses: Vec<Clause>,
}

impl Frame {
    pub fn new(frame_type: FrameType) -> Self {
        Self {
            id: None,
            frame_type,
            clauses: Vec::new(),
        }
    }
    pub fn with_id(frame_type: FrameType, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            frame_type,
            clauses: Vec::new(),
        }
    }
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }
    pub fn frame_type(&self) -> FrameType {
        self.frame_type
    }
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
    pub fn clauses_mut(&mut self) -> &mut Vec<Clause> {
        &mut self.clauses
    }
    pub fn set_clauses(&mut self, clauses: Vec<Clause>) {
        self.clauses = clauses;
    }
    pub fn add_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }
    /// Every clause with the given tag, in file order. The iterator borrows
    /// the tag as well as the frame.
    pub fn clauses_for<'f>(&'f self, tag: &'f str) -> impl Iterator<Item = &'f Clause> + 'f {
        self.clauses.iter().filter(move |c| c.tag == tag)
    }
    /// The first clause with the given tag.
    pub fn clause(&self, tag: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.tag == tag)
    }
    pub fn clause_mut(&mut self, tag: &str) -> Option<&mut Clause> {
        self.clauses.iter_mut().find(|c| c.tag == tag)
    }
    pub fn count(&self, tag: &str) -> usize {
        self.clauses_for(tag).count()
    }
    /// Primary value of the first clause with this tag.
    pub fn tag_value(&self, tag: &str) -> Option<&Value> {
        self.clause(tag).and_then(|c| c.values.first())
    }
    /// Primary value of the first clause with this tag, as text.
    pub fn tag_text(&self, tag: &str) -> Option<&str> {
        self.clause(tag).and_then(Clause::text)
    }
    /// Primary values of every clause with this tag.
    pub fn tag_values(&self, tag: &str) -> Vec<&Value> {
        self.clauses
            .iter()
            .filter(|c| c.tag == tag)
            .filter_map(|c| c.values.first())
            .collect()
    }
    /// Xref values held by the first clause with this tag.
    pub fn tag_xrefs(&self, tag: &str) -> Vec<&Xref> {
        self.clause(tag)
            .map(|c| c.values.iter().filter_map(Value::as_xref).collect())
            .unwrap_or_default()
    }
    /// Distinct tags in order of first appearance.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for clause in &self.clauses {
            if !tags.contains(&clause.tag.as_str()) {
                tags.push(&clause.tag);
            }
        }
        tags
    }
    /// Appends the clauses of another frame describing the same entity.
    /// No deduplication takes place.
    pub fn merge(&mut self, other: Frame) -> Result<()> {
        if self.id != other.id {
            return Err(OboError::merge(format!(
                "ids do not match: {:?} and {:?}",
                self.id, other.id
            )));
        }
        if self.frame_type != other.frame_type {
            return Err(OboError::merge(format!(
                "frame types do not match: {} and {}",
                self.frame_type, other.frame_type
            )));
        }
        self.clauses.extend(other.clauses);
        Ok(())
    }
    pub fn freeze(&mut self) {
        for clause in self.clauses.iter_mut() {
            clause.freeze();
        }
        self.clauses.shrink_to_fit();
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Frame({} ", self.id.as_deref().unwrap_or(""))?;
        for clause in &self.clauses {
            write!(f, "{} ", clause)?;
        }
        write!(f, ")")
    }
}

// ------------- Document -------------
/// A header frame, three identifier keyed frame maps and the documents this
/// one imports. Imports are shared, never owned exclusively: an import may
/// hang off several parents and survives any one of them.
#[derive(Debug, Default)]
pub struct Document {
    header: Option<Frame>,
    terms: FrameMap,
    typedefs: FrameMap,
    instances: FrameMap,
    annotations: Vec<Frame>,
    imports: Vec<SharedDocument>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }
    pub fn header(&self) -> Option<&Frame> {
        self.header.as_ref()
    }
    pub fn header_mut(&mut self) -> Option<&mut Frame> {
        self.header.as_mut()
    }
    pub fn set_header(&mut self, header: Frame) {
        self.header = Some(header);
    }
    pub fn term_frames(&self) -> impl Iterator<Item = &Frame> {
        self.terms.values()
    }
    pub fn typedef_frames(&self) -> impl Iterator<Item = &Frame> {
        self.typedefs.values()
    }
    pub fn instance_frames(&self) -> impl Iterator<Item = &Frame> {
        self.instances.values()
    }
    pub fn annotation_frames(&self) -> &[Frame] {
        &self.annotations
    }
    pub fn term_frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.terms.values_mut()
    }
    pub fn typedef_frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.typedefs.values_mut()
    }
    pub fn instance_frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.instances.values_mut()
    }
    pub fn term_frame(&self, id: &str) -> Option<&Frame> {
        self.terms.get(id)
    }
    pub fn term_frame_mut(&mut self, id: &str) -> Option<&mut Frame> {
        self.terms.get_mut(id)
    }
    pub fn typedef_frame(&self, id: &str) -> Option<&Frame> {
        self.typedefs.get(id)
    }
    pub fn typedef_frame_mut(&mut self, id: &str) -> Option<&mut Frame> {
        self.typedefs.get_mut(id)
    }
    pub fn instance_frame(&self, id: &str) -> Option<&Frame> {
        self.instances.get(id)
    }
    fn map(&self, frame_type: FrameType) -> Option<&FrameMap> {
        match frame_type {
            FrameType::Term => Some(&self.terms),
            FrameType::Typedef => Some(&self.typedefs),
            FrameType::Instance => Some(&self.instances),
            _ => None,
        }
    }
    /// Local lookup in the map for the given frame type.
    pub fn frame(&self, frame_type: FrameType, id: &str) -> Option<&Frame> {
        self.map(frame_type).and_then(|m| m.get(id))
    }

    /// Adds a frame, merging it into an existing frame with the same id.
    pub fn add_frame(&mut self, frame: Frame) -> Result<()> {
        match frame.frame_type {
            FrameType::Term => Self::keep(&mut self.terms, frame),
            FrameType::Typedef => Self::keep(&mut self.typedefs, frame),
            FrameType::Instance => Self::keep(&mut self.instances, frame),
            FrameType::Annotation => {
                self.annotations.push(frame);
                Ok(())
            }
            FrameType::Header => match self.header.as_mut() {
                Some(header) => header.merge(frame),
                None => {
                    self.header = Some(frame);
                    Ok(())
                }
            },
        }
    }
    pub fn add_term_frame(&mut self, frame: Frame) -> Result<()> {
        Self::keep(&mut self.terms, frame)
    }
    pub fn add_typedef_frame(&mut self, frame: Frame) -> Result<()> {
        Self::keep(&mut self.typedefs, frame)
    }
    pub fn add_instance_frame(&mut self, frame: Frame) -> Result<()> {
        Self::keep(&mut self.instances, frame)
    }
    fn keep(map: &mut FrameMap, frame: Frame) -> Result<()> {
        let id = match frame.id() {
            Some(id) => id.to_owned(),
            None => return Err(OboError::structure(&frame, "id field must be set")),
        };
        match map.entry(id) {
            Entry::Occupied(mut e) => e.get_mut().merge(frame),
            Entry::Vacant(e) => {
                e.insert(frame);
                Ok(())
            }
        }
    }
    /// Merges every term, typedef and instance frame of another document.
    pub fn merge_contents(&mut self, other: &Document) -> Result<()> {
        for frame in other.term_frames() {
            self.add_term_frame(frame.clone())?;
        }
        for frame in other.typedef_frames() {
            self.add_typedef_frame(frame.clone())?;
        }
        for frame in other.instance_frames() {
            self.add_instance_frame(frame.clone())?;
        }
        Ok(())
    }
    /// Gives the header an `ontology` clause unless it already has one.
    pub fn add_default_ontology_header(&mut self, ontology: &str) {
        let header = self.header.get_or_insert_with(|| Frame::new(FrameType::Header));
        if header.clause(Tag::Ontology.text()).is_none() {
            header.add_clause(Clause::with_value(Tag::Ontology.text(), ontology));
        }
    }
    pub fn freeze_frames(&mut self) {
        if let Some(header) = self.header.as_mut() {
            header.freeze();
        }
        for frame in self
            .terms
            .values_mut()
            .chain(self.typedefs.values_mut())
            .chain(self.instances.values_mut())
            .chain(self.annotations.iter_mut())
        {
            frame.freeze();
        }
    }

    // ------------- Imports -------------
    pub fn imports(&self) -> &[SharedDocument] {
        &self.imports
    }
    pub fn add_import(&mut self, doc: SharedDocument) {
        self.imports.push(doc);
    }
    pub fn set_imports(&mut self, imports: Vec<SharedDocument>) {
        self.imports = imports;
    }
    /// Stable identity of this document, derived from its header. Used to
    /// guard import traversal against cycles.
    pub fn descriptor(&self) -> String {
        match &self.header {
            Some(header) => format!("OBODoc({})", header),
            None => String::from("OBODoc()"),
        }
    }

    /// Looks a term frame up, optionally following imports depth first.
    pub fn lookup_term_frame(&self, id: &str, follow_imports: bool) -> Option<Frame> {
        self.lookup(FrameType::Term, id, follow_imports)
    }
    pub fn lookup_typedef_frame(&self, id: &str, follow_imports: bool) -> Option<Frame> {
        self.lookup(FrameType::Typedef, id, follow_imports)
    }
    pub fn contains_term(&self, id: &str, follow_imports: bool) -> bool {
        self.resolves(FrameType::Term, id, follow_imports)
    }
    pub fn contains_typedef(&self, id: &str, follow_imports: bool) -> bool {
        self.resolves(FrameType::Typedef, id, follow_imports)
    }
    pub fn lookup(&self, frame_type: FrameType, id: &str, follow_imports: bool) -> Option<Frame> {
        self.visit(frame_type, id, follow_imports, &mut |f: &Frame| f.clone())
    }
    pub fn resolves(&self, frame_type: FrameType, id: &str, follow_imports: bool) -> bool {
        self.visit(frame_type, id, follow_imports, &mut |_: &Frame| ()).is_some()
    }
    fn visit<R>(
        &self,
        frame_type: FrameType,
        id: &str,
        follow_imports: bool,
        found: &mut dyn FnMut(&Frame) -> R,
    ) -> Option<R> {
        if !follow_imports {
            return self.frame(frame_type, id).map(found);
        }
        let mut visited = vec![self.descriptor()];
        self.visit_imports(frame_type, id, &mut visited, found)
    }
    fn visit_imports<R>(
        &self,
        frame_type: FrameType,
        id: &str,
        visited: &mut Vec<String>,
        found: &mut dyn FnMut(&Frame) -> R,
    ) -> Option<R> {
        if let Some(frame) = self.frame(frame_type, id) {
            return Some(found(frame));
        }
        for import in &self.imports {
            let doc = match import.try_borrow() {
                Ok(doc) => doc,
                Err(_) => {
                    debug!("skipping an import that is being modified");
                    continue;
                }
            };
            let descriptor = doc.descriptor();
            if visited.contains(&descriptor) {
                continue;
            }
            visited.push(descriptor);
            if let Some(result) = doc.visit_imports(frame_type, id, visited, found) {
                return Some(result);
            }
        }
        None
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}
