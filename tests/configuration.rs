use std::fs;

use oboformat::config::{load_defaults, InstancePolicy, Loader, ParserConfig};
use oboformat::parser::Parser;

#[test]
fn embedded_defaults() {
    let config = load_defaults().expect("defaults load");
    assert_eq!(config.parser, ParserConfig::default());
    assert!(!config.parser.follow_imports);
    assert_eq!(config.parser.instance_stanzas, InstancePolicy::Abandon);
    assert!(config.parser.add_default_namespace);
}

#[test]
fn overrides_win() {
    let config = Loader::new()
        .set_override("parser.instance_stanzas", "skip")
        .expect("override")
        .set_override("parser.follow_imports", true)
        .expect("override")
        .build()
        .expect("config builds");
    assert_eq!(config.parser.instance_stanzas, InstancePolicy::Skip);
    assert!(config.parser.follow_imports);
}

#[test]
fn files_layer_over_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("oboformat.toml");
    fs::write(&path, "[parser]\nadd_default_namespace = false\n").expect("write config");
    let config = Loader::new().with_file(&path).build().expect("config builds");
    assert!(!config.parser.add_default_namespace);
    assert_eq!(config.parser.instance_stanzas, InstancePolicy::Abandon);

    let missing = dir.path().join("absent.toml");
    assert!(Loader::new().with_file(&missing).build().is_err());
    let config = Loader::new()
        .with_optional_file(&missing)
        .build()
        .expect("optional file may be absent");
    assert!(config.parser.add_default_namespace);
}

#[test]
fn unknown_policies_are_rejected() {
    let result = Loader::new()
        .set_override("parser.instance_stanzas", "ignore")
        .expect("override")
        .build();
    assert!(result.is_err());
}

#[test]
fn parser_follows_its_configuration() {
    let config = Loader::new()
        .set_override("parser.instance_stanzas", "skip")
        .expect("override")
        .build()
        .expect("config builds");
    let parser = Parser::from_config(&config);
    assert_eq!(parser.config().instance_stanzas, InstancePolicy::Skip);
    let doc = parser
        .parse_str("[Instance]\nid: I:1\n\n[Term]\nid: X:1\n")
        .expect("document parses");
    assert!(doc.term_frame("X:1").is_some());
}
