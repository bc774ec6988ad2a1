use oboformat::error::OboError;
use oboformat::model::{Clause, Document, Frame, FrameType};
use oboformat::tag::{self, Tag, TagOrdering, UNRANKED};
use oboformat::value::{QualifierValue, Value, Xref};

// ------------- Clause -------------
#[test]
fn boolean_and_text_truth_compare_equal() {
    let a = Clause::with_value("is_obsolete", true);
    let b = Clause::with_value("is_obsolete", "true");
    assert_eq!(a, b);
    let c = Clause::with_value("is_obsolete", "false");
    assert_ne!(a, c);
    let d = Clause::with_value("is_anonymous", true);
    assert_ne!(a, d);
}

#[test]
fn xrefs_and_qualifiers_compare_as_multisets() {
    let mut a = Clause::with_value("def", "d");
    a.add_xref(Xref::new("A:1"));
    a.add_xref(Xref::new("B:1"));
    a.add_qualifier(QualifierValue::new("k", "v"));
    let mut b = Clause::with_value("def", "d");
    b.add_xref(Xref::annotated("B:1", "ignored"));
    b.add_xref(Xref::new("A:1"));
    b.add_qualifier(QualifierValue::new("k", "v"));
    assert_eq!(a, b);

    // duplicates count
    let mut c = Clause::with_value("def", "d");
    c.add_xref(Xref::new("A:1"));
    c.add_xref(Xref::new("A:1"));
    c.add_qualifier(QualifierValue::new("k", "v"));
    assert_ne!(a, c);
}

#[test]
fn clause_accessors() {
    let mut clause = Clause::with_pair("relationship", "part_of", "X:1");
    assert_eq!(clause.text(), Some("part_of"));
    assert_eq!(clause.text2(), Some("X:1"));
    assert!(clause.has_no_annotations());
    clause.set_value("has_part");
    assert_eq!(clause.values(), &[Value::from("has_part")]);
    let empty = Clause::new("name");
    assert!(matches!(empty.value(), Err(OboError::FrameStructure { .. })));
    assert_eq!(clause.known_tag(), Some(Tag::Relationship));
    assert_eq!(Clause::new("custom").known_tag(), None);
}

#[test]
fn clause_display() {
    let mut clause = Clause::with_value("def", "text");
    clause.add_qualifier(QualifierValue::new("q", "v"));
    clause.add_xref(Xref::annotated("A:1", "note"));
    assert_eq!(clause.to_string(), "def( text{{q=v} }[<A:1 \"note\"> ])");
}

#[test]
fn freeze_keeps_contents() {
    let mut frame = Frame::with_id(FrameType::Term, "X:1");
    frame.add_clause(Clause::with_value("id", "X:1"));
    frame.add_clause(Clause::with_value("name", "foo"));
    let before = frame.clone();
    frame.freeze();
    assert_eq!(frame, before);
    frame.add_clause(Clause::with_value("comment", "added after freezing"));
    assert_eq!(frame.clauses().len(), 3);
}

// ------------- Xref -------------
#[test]
fn xref_identity_ignores_annotation() {
    assert_eq!(Xref::annotated("X:1", "a"), Xref::annotated("X:1", "b"));
    assert_ne!(Xref::new("X:1"), Xref::new("X:2"));
    assert_eq!(Xref::new("GO:0001").id_space(), "GO");
    assert_eq!(Xref::new("plain").id_space(), "plain");
}

#[test]
fn qualifiers_sort_by_rendered_text() {
    let mut qualifiers = vec![
        QualifierValue::new("b", "1"),
        QualifierValue::new("a", "2"),
        QualifierValue::new("a", "1"),
    ];
    qualifiers.sort();
    let rendered: Vec<String> = qualifiers.iter().map(|q| q.to_string()).collect();
    assert_eq!(rendered, vec!["{a=1}", "{a=2}", "{b=1}"]);
}

// ------------- Frame -------------
fn term(id: &str, clauses: usize) -> Frame {
    let mut frame = Frame::with_id(FrameType::Term, id);
    for i in 0..clauses {
        frame.add_clause(Clause::with_value("comment", format!("c{}", i)));
    }
    frame
}

#[test]
fn merge_appends_clauses() {
    let mut a = term("X:1", 2);
    a.merge(term("X:1", 3)).expect("same id and type merge");
    assert_eq!(a.clauses().len(), 5);
}

#[test]
fn merge_rejects_mismatches() {
    let mut a = term("X:1", 1);
    assert!(matches!(a.merge(term("X:2", 1)), Err(OboError::FrameMerge { .. })));
    let mut typedef = Frame::with_id(FrameType::Typedef, "X:1");
    assert!(matches!(typedef.merge(term("X:1", 1)), Err(OboError::FrameMerge { .. })));
    assert_eq!(a.clauses().len(), 1);
}

#[test]
fn frame_helpers() {
    let mut frame = Frame::with_id(FrameType::Term, "X:1");
    frame.add_clause(Clause::with_value("id", "X:1"));
    frame.add_clause(Clause::with_value("is_a", "X:2"));
    frame.add_clause(Clause::with_value("is_a", "X:3"));
    frame.add_clause(Clause::with_value("xref", Xref::new("DB:1")));
    assert_eq!(frame.tags(), vec!["id", "is_a", "xref"]);
    assert_eq!(frame.count("is_a"), 2);
    let parents: Vec<&str> = frame.tag_values("is_a").into_iter().filter_map(Value::as_text).collect();
    assert_eq!(parents, vec!["X:2", "X:3"]);
    assert_eq!(frame.tag_xrefs("xref"), vec![&Xref::new("DB:1")]);
    assert!(frame.clause("name").is_none());
}

// values are borrowed from the frame only, not from the tag asked for
fn primary_values<'f>(frame: &'f Frame, tag: &str) -> Vec<&'f Value> {
    frame.tag_values(tag)
}

#[test]
fn tag_values_outlive_the_tag() {
    let mut frame = Frame::with_id(FrameType::Term, "X:1");
    frame.add_clause(Clause::with_value("id", "X:1"));
    frame.add_clause(Clause::with_pair("relationship", "part_of", "X:2"));
    frame.add_clause(Clause::with_value("relationship", "has_part"));
    let values = {
        let tag = String::from("relationship");
        primary_values(&frame, &tag)
    };
    assert_eq!(values, vec![&Value::from("part_of"), &Value::from("has_part")]);
    assert!(primary_values(&frame, "is_a").is_empty());
}

// ------------- Document -------------
#[test]
fn documents_merge_frames_by_id() {
    let mut doc = Document::new();
    doc.add_frame(term("X:1", 1)).expect("first frame");
    doc.add_frame(term("X:1", 2)).expect("merged frame");
    assert_eq!(doc.term_frames().count(), 1);
    assert_eq!(doc.term_frame("X:1").map(|f| f.clauses().len()), Some(3));
    let anonymous = Frame::new(FrameType::Term);
    assert!(matches!(doc.add_frame(anonymous), Err(OboError::FrameStructure { .. })));
}

#[test]
fn merge_contents_copies_every_frame() {
    let mut a = Document::new();
    a.add_frame(term("X:1", 1)).expect("frame");
    let mut b = Document::new();
    b.add_frame(term("X:1", 1)).expect("frame");
    b.add_frame(term("X:2", 1)).expect("frame");
    b.add_frame(Frame::with_id(FrameType::Typedef, "rel")).expect("frame");
    a.merge_contents(&b).expect("contents merge");
    assert_eq!(a.term_frame("X:1").map(|f| f.clauses().len()), Some(2));
    assert!(a.term_frame("X:2").is_some());
    assert!(a.typedef_frame("rel").is_some());
}

#[test]
fn default_ontology_header() {
    let mut doc = Document::new();
    doc.add_default_ontology_header("first");
    doc.add_default_ontology_header("second");
    let header = doc.header().expect("header");
    assert_eq!(header.tag_text("ontology"), Some("first"));
    assert_eq!(header.count("ontology"), 1);
}

fn named(ontology: &str) -> Document {
    let mut doc = Document::new();
    doc.add_default_ontology_header(ontology);
    doc
}

#[test]
fn lookups_follow_imports() {
    let mut imported = named("imported");
    imported.add_frame(term("I:1", 1)).expect("frame");
    let mut doc = named("main");
    doc.add_import(imported.into_shared());
    assert!(doc.lookup_term_frame("I:1", false).is_none());
    assert_eq!(
        doc.lookup_term_frame("I:1", true).and_then(|f| f.id().map(str::to_owned)),
        Some("I:1".to_owned())
    );
    assert!(!doc.contains_typedef("I:1", true));
}

#[test]
fn lookups_terminate_on_import_cycles() {
    let x = named("x").into_shared();
    let y = named("y").into_shared();
    x.borrow_mut().add_import(y.clone());
    y.borrow_mut().add_import(x.clone());
    y.borrow_mut().add_frame(term("Y:1", 1)).expect("frame");
    assert!(!x.borrow().contains_term("missing", true));
    assert!(x.borrow().contains_term("Y:1", true));
    // break the cycle so both documents are dropped
    y.borrow_mut().set_imports(Vec::new());
}

// ------------- Tags -------------
#[test]
fn tag_registry_lookups() {
    let is_a = tag::lookup("is_a").expect("known tag");
    assert_eq!(is_a.tag(), Tag::IsA);
    assert_eq!(is_a.priority(), 65);
    assert_eq!(is_a.typedef_priority(), 115);
    assert_eq!(is_a.header_priority(), UNRANKED);
    assert!(tag::lookup("no_such_tag").is_none());
    assert_eq!(Tag::from_text("format-version"), Some(Tag::FormatVersion));
    assert!(Tag::all().all(|t| Tag::from_text(t.text()) == Some(t)));
    assert_eq!(tag::map_deprecated("xref_analog"), "xref");
    assert_eq!(tag::map_deprecated("name"), "name");
    assert_eq!(tag::deprecated_synonym_scope("broad_synonym"), Some(Tag::Broad));
}

#[test]
fn tag_orderings() {
    let mut tags = vec!["name", "custom_b", "is_a", "id", "custom_a"];
    tag::sort_tags(&mut tags, TagOrdering::Generic);
    assert_eq!(tags, vec!["id", "name", "is_a", "custom_b", "custom_a"]);

    let mut header = vec!["ontology", "unknown", "date", "format-version"];
    tag::sort_tags(&mut header, TagOrdering::Header);
    assert_eq!(header, vec!["format-version", "date", "ontology", "unknown"]);

    assert_eq!(tag::typedef_order("is_a", "domain"), std::cmp::Ordering::Greater);
    assert_eq!(tag::generic_order("x", "y"), std::cmp::Ordering::Equal);
}
