use oboformat::error::OboError;
use oboformat::expand::{Expansion, XrefExpander};
use oboformat::model::{Clause, Document};
use oboformat::parser::Parser;

fn parse(text: &str) -> Document {
    Parser::new().parse_str(text).expect("document parses")
}

fn texts(clauses: &[Clause], tag: &str) -> Vec<String> {
    clauses
        .iter()
        .filter(|c| c.tag() == tag)
        .map(|c| {
            c.values()
                .iter()
                .filter_map(|v| v.as_id())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[test]
fn is_a_macro_fills_the_bridge() {
    let mut doc = parse("ontology: test\ntreat-xrefs-as-is_a: DB\n\n[Term]\nid: A:1\nxref: DB:2\n");
    let added = {
        let mut expander = XrefExpander::new(&mut doc).expect("macros are valid");
        assert_eq!(expander.rules().get("DB"), Some(&Expansion::IsA));
        expander.expand().expect("expansion")
    };
    assert_eq!(added, 1);

    // the source frame keeps exactly its id and xref clauses
    let source = doc.term_frame("A:1").expect("source frame");
    assert_eq!(source.clauses().len(), 2);
    assert_eq!(source.count("is_a"), 0);

    assert_eq!(doc.imports().len(), 1);
    let bridge = doc.imports()[0].borrow();
    assert_eq!(
        bridge.header().and_then(|h| h.tag_text("ontology")),
        Some("test/xref_expansions")
    );
    let target = bridge.term_frame("DB:2").expect("bridge frame");
    assert_eq!(texts(target.clauses(), "is_a"), vec!["A:1"]);
}

#[test]
fn xrefs_outside_macro_spaces_are_left_alone() {
    let mut doc = parse(
        "ontology: test\ntreat-xrefs-as-has-subclass: DB\n\n[Term]\nid: A:1\nxref: OTHER:1\nxref: DB:7\n",
    );
    let mut expander = XrefExpander::new(&mut doc).expect("macros are valid");
    assert_eq!(expander.expand().expect("expansion"), 1);
    let target = expander.target_doc("DB").expect("bridge");
    let bridge = target.borrow();
    assert!(bridge.term_frame("OTHER:1").is_none());
    assert_eq!(
        texts(bridge.term_frame("DB:7").expect("frame").clauses(), "is_a"),
        vec!["A:1"]
    );
}

#[test]
fn genus_differentia_macro() {
    let mut doc = parse(
        "ontology: zfa\ntreat-xrefs-as-genus-differentia: CL part_of NCBITaxon:7955\n\n\
         [Term]\nid: ZFA:1\nxref: CL:0000540\n",
    );
    let mut expander = XrefExpander::new(&mut doc).expect("macros are valid");
    assert_eq!(expander.expand().expect("expansion"), 2);
    let target = expander.target_doc("CL").expect("bridge");
    let bridge = target.borrow();
    let frame = bridge.term_frame("ZFA:1").expect("frame");
    assert_eq!(
        texts(frame.clauses(), "intersection_of"),
        vec!["CL:0000540", "part_of NCBITaxon:7955"]
    );
}

#[test]
fn reverse_genus_differentia_macro() {
    let mut doc = parse(
        "ontology: zfa\ntreat-xrefs-as-reverse-genus-differentia: CL part_of NCBITaxon:7955\n\n\
         [Term]\nid: ZFA:1\nxref: CL:0000540\n",
    );
    let mut expander = XrefExpander::new(&mut doc).expect("macros are valid");
    expander.expand().expect("expansion");
    let target = expander.target_doc("CL").expect("bridge");
    let bridge = target.borrow();
    let frame = bridge.term_frame("CL:0000540").expect("frame");
    assert_eq!(
        texts(frame.clauses(), "intersection_of"),
        vec!["ZFA:1", "part_of NCBITaxon:7955"]
    );
}

#[test]
fn relationship_macro() {
    let mut doc = parse(
        "ontology: x\ntreat-xrefs-as-relationship: MA homologous_to\n\n[Term]\nid: X:1\nxref: MA:9\n",
    );
    let mut expander = XrefExpander::new(&mut doc).expect("macros are valid");
    expander.expand().expect("expansion");
    let target = expander.target_doc("MA").expect("bridge");
    let bridge = target.borrow();
    let frame = bridge.term_frame("X:1").expect("frame");
    assert_eq!(texts(frame.clauses(), "relationship"), vec!["homologous_to MA:9"]);
}

#[test]
fn equivalence_is_stated_on_the_source() {
    let mut doc = parse("ontology: x\ntreat-xrefs-as-equivalent: DB\n\n[Term]\nid: A:1\nxref: DB:2\n");
    XrefExpander::new(&mut doc)
        .expect("macros are valid")
        .expand()
        .expect("expansion");
    let source = doc.term_frame("A:1").expect("source frame");
    assert_eq!(texts(source.clauses(), "equivalent_to"), vec!["DB:2"]);
    let bridge = doc.imports()[0].borrow();
    assert_eq!(bridge.term_frames().count(), 0);
}

#[test]
fn one_macro_per_id_space() {
    let mut doc = parse("ontology: x\ntreat-xrefs-as-is_a: DB\ntreat-xrefs-as-equivalent: DB\n");
    match XrefExpander::new(&mut doc) {
        Err(OboError::XrefMacroConfig { id_space, .. }) => assert_eq!(id_space, "DB"),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("conflicting macros were accepted"),
    }
    assert!(doc.imports().is_empty());
}

#[test]
fn rejected_setup_leaves_the_source_untouched() {
    let mut doc = parse(
        "ontology: x\ntreat-xrefs-as-is_a: DB\ntreat-xrefs-as-equivalent: DB\n\n[Term]\nid: A:1\nxref: DB:2\n",
    );
    assert!(matches!(
        XrefExpander::with_target_base(&mut doc, "base"),
        Err(OboError::XrefMacroConfig { .. })
    ));
    assert!(doc.imports().is_empty());
    assert_eq!(doc.term_frame("A:1").map(|f| f.clauses().len()), Some(2));

    let mut incomplete = parse(
        "ontology: x\ntreat-xrefs-as-is_a: DB\ntreat-xrefs-as-relationship: MA\n",
    );
    assert!(XrefExpander::with_target_base(&mut incomplete, "base").is_err());
    assert!(incomplete.imports().is_empty());
}

#[test]
fn incomplete_macros_are_rejected() {
    let mut doc = parse("ontology: x\ntreat-xrefs-as-genus-differentia: CL part_of\n");
    assert!(matches!(
        XrefExpander::new(&mut doc),
        Err(OboError::XrefMacroConfig { .. })
    ));
}

#[test]
fn per_space_bridges_carry_the_relation() {
    let mut doc = parse(
        "ontology: x\n\
         treat-xrefs-as-relationship: MA part_of\n\
         treat-xrefs-as-is_a: DB\n\n\
         [Term]\nid: X:1\nxref: MA:9\nxref: DB:1\n\n\
         [Typedef]\nid: part_of\nname: part of\n",
    );
    {
        let mut expander = XrefExpander::with_target_base(&mut doc, "base").expect("macros are valid");
        assert_eq!(expander.expand().expect("expansion"), 2);
        let ma = expander.target_doc("MA").expect("bridge for MA");
        let ma = ma.borrow();
        assert_eq!(ma.header().and_then(|h| h.tag_text("ontology")), Some("base-ma"));
        assert!(ma.typedef_frame("part_of").is_some());
        assert!(ma.term_frame("X:1").is_some());
        let db = expander.target_doc("DB").expect("bridge for DB");
        let db = db.borrow();
        assert_eq!(db.header().and_then(|h| h.tag_text("ontology")), Some("base-db"));
        assert!(db.typedef_frames().next().is_none());
        assert!(db.term_frame("DB:1").is_some());
    }
    assert_eq!(doc.imports().len(), 2);
}

#[test]
fn explicit_target_is_not_imported() {
    let mut doc = parse("ontology: x\ntreat-xrefs-as-is_a: DB\n\n[Term]\nid: A:1\nxref: DB:2\n");
    let target = Document::new().into_shared();
    XrefExpander::with_target(&mut doc, target.clone())
        .expect("macros are valid")
        .expand()
        .expect("expansion");
    assert!(doc.imports().is_empty());
    assert!(target.borrow().term_frame("DB:2").is_some());
}
