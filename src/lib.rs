//! obo-format – reading, checking and expanding OBO flat-file ontologies.
//!
//! An OBO file is a header followed by stanzas (`[Term]`, `[Typedef]`,
//! `[Instance]`), each a list of `tag: value` lines. Parsing produces a
//! [`model::Document`]:
//! * A [`model::Frame`] is one stanza: an identifier, a [`model::FrameType`]
//!   and its clauses in file order.
//! * A [`model::Clause`] is one tag with typed [`value::Value`]s, plus any
//!   trailing [`value::Xref`] list and [`value::QualifierValue`] block.
//! * A [`model::Document`] keeps the header, identifier keyed frame maps that
//!   merge repeated stanzas, and the documents it imports.
//!
//! ## Modules
//! * [`tag`] – The catalog of known tags, their output priorities and the
//!   rewrite tables for legacy spellings.
//! * [`value`] – Clause values, cross-references and qualifiers.
//! * [`model`] – Clauses, frames and documents, with merge and freeze.
//! * [`parser`] – The recursive-descent [`parser::Parser`], import
//!   resolution and the shared import cache.
//! * [`validate`] – Cardinality checks and the dangling reference scan.
//! * [`expand`] – The [`expand::XrefExpander`] for header xref macros.
//! * [`config`] – Layered configuration for the parser.
//!
//! ## Quick Start
//! ```
//! use oboformat::parser::Parser;
//! let doc = Parser::new()
//!     .parse_str("format-version: 1.2\n\n[Term]\nid: X:1\nname: foo\n")
//!     .unwrap();
//! let term = doc.term_frame("X:1").unwrap();
//! assert_eq!(term.tag_text("name"), Some("foo"));
//! assert!(doc.check().is_ok());
//! ```
//!
//! ## Logging
//! Tolerated irregularities in the input (unquoted qualifier values, xref
//! identifiers with spaces, legacy tags) are reported through `tracing`
//! with the offending line number; install a subscriber to see them.

pub mod config;
pub mod error;
pub mod expand;
pub mod model;
pub mod parser;
pub mod source;
pub mod stream;
pub mod tag;
pub mod validate;
pub mod value;

pub use config::{InstancePolicy, Loader, OboConfig, ParserConfig};
pub use error::{OboError, Result};
pub use expand::{Expansion, XrefExpander};
pub use model::{Clause, Document, Frame, FrameType, SharedDocument};
pub use parser::Parser;
pub use source::{FileProvider, ImportCache, Source, SourceProvider};
pub use tag::{Tag, TagOrdering};
pub use value::{QualifierValue, Value, Xref};
