use std::fs;
use std::path::Path;

use oboformat::config::ParserConfig;
use oboformat::error::OboError;
use oboformat::model::Document;
use oboformat::parser::Parser;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("write fixture");
}

fn following() -> Parser {
    Parser::with_config(ParserConfig {
        follow_imports: true,
        ..ParserConfig::default()
    })
}

fn fixtures() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "main.obo",
        "format-version: 1.4\nontology: main\nimport: sub.obo\n\n[Term]\nid: A:1\nis_a: B:1\n",
    );
    write(
        dir.path(),
        "sub.obo",
        "format-version: 1.4\nontology: sub\n\n[Term]\nid: B:1\nname: imported\n",
    );
    dir
}

#[test]
fn imports_are_followed() {
    let dir = fixtures();
    let parser = following();
    let doc = parser.parse_path(dir.path().join("main.obo")).expect("main parses");
    assert_eq!(doc.imports().len(), 1);
    assert!(doc.contains_term("B:1", true));
    assert!(!doc.contains_term("B:1", false));
    assert!(parser.check_dangling_references(&doc).is_empty());

    let import = doc
        .header()
        .and_then(|h| h.tag_text("import"))
        .expect("import clause");
    assert!(import.starts_with("file://"));
    assert!(import.ends_with("/sub.obo"));
    assert!(parser.cache().contains(import));
}

#[test]
fn imports_are_not_followed_by_default() {
    let dir = fixtures();
    let parser = Parser::new();
    let doc = parser.parse_path(dir.path().join("main.obo")).expect("main parses");
    assert!(doc.imports().is_empty());
    assert!(parser.cache().is_empty());
    // the clause is still rewritten to an absolute location
    let import = doc.header().and_then(|h| h.tag_text("import"));
    assert!(import.is_some_and(|i| i.starts_with("file://")));
    assert_eq!(parser.check_dangling_references(&doc).len(), 1);
}

#[test]
fn import_cycles_terminate() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(dir.path(), "a.obo", "ontology: a\nimport: b.obo\n\n[Term]\nid: A:1\n");
    write(dir.path(), "b.obo", "ontology: b\nimport: a.obo\n\n[Term]\nid: B:1\n");
    let doc = following().parse_path(dir.path().join("a.obo")).expect("a parses");
    assert_eq!(doc.imports().len(), 1);
    let b = doc.imports()[0].borrow();
    assert!(b.term_frame("B:1").is_some());
    assert!(b.imports().is_empty());
}

#[test]
fn preseeded_cache_serves_remote_imports() {
    let parser = following();
    let mut remote = Document::new();
    remote.add_default_ontology_header("remote");
    let remote = remote.into_shared();
    assert!(parser.add_import("http://example.org/sub.obo", remote.clone()));
    assert!(!parser.add_import("http://example.org/sub.obo", remote));

    let doc = parser
        .parse_str("import: http://example.org/sub.obo\n\n[Term]\nid: A:1\n")
        .expect("cached import is used");
    assert_eq!(doc.imports().len(), 1);
    let imported = doc.imports()[0].borrow();
    assert_eq!(
        imported.header().and_then(|h| h.tag_text("ontology")),
        Some("remote")
    );
    assert_eq!(imported.descriptor(), "OBODoc(Frame( ontology( remote) ))");
}

#[test]
fn remote_imports_need_a_provider() {
    let result = following().parse_str("import: http://example.org/missing.obo\n");
    assert!(matches!(result, Err(OboError::Io { .. })));
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Parser::new().parse_path(dir.path().join("nope.obo"));
    match result {
        Err(OboError::Io { location, .. }) => assert!(location.contains("nope.obo")),
        other => panic!("expected an io error, got {other:?}"),
    }
}
