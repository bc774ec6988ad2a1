//! Recursive-descent parser for OBO 1.4 flat files.
//!
//! The grammar is line oriented: header clauses, then `[Term]`, `[Typedef]`
//! and `[Instance]` stanzas, each line being `tag: value`. Which value rule
//! applies depends on the tag and on the stanza it appears in; the rules are
//! kept in one dispatch table per context and unknown tags fall back to
//! plain unquoted text.

use std::collections::HashMap;
use std::io::{BufRead, Cursor};
use std::path::Path;
use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{InstancePolicy, OboConfig, ParserConfig};
use crate::error::{Cause, OboError, Result};
use crate::model::{Clause, Document, Frame, FrameType, SharedDocument};
use crate::source::{
    location_key, resolve_import, FileProvider, ImportCache, Location, Source, SourceProvider,
};
use crate::stream::LineStream;
use crate::tag::{self, Tag};
use crate::validate;
use crate::value::{parse_header_date, QualifierValue, Xref};

// characters ending a bare identifier
const BRACE: &str = " !{";
// characters ending an xref identifier
const XREF_END: &str = "\",]!{";

lazy_static! {
    static ref TRAILING_WS: Regex = Regex::new(r"\s+$").expect("static pattern");
}

fn remove_trailing_ws(text: &str) -> String {
    TRAILING_WS.replace(text, "").into_owned()
}

// ------------- Parser -------------
/// Entry point for reading OBO documents. A parser can be reused; every
/// document it reads through imports lands in its [`ImportCache`].
pub struct Parser {
    config: ParserConfig,
    cache: ImportCache,
    provider: Rc<dyn SourceProvider>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            cache: ImportCache::new(),
            provider: Rc::new(FileProvider),
        }
    }
    pub fn from_config(config: &OboConfig) -> Self {
        Self::with_config(config.parser.clone())
    }
    /// Shares an existing import cache, e.g. one pre-seeded with documents.
    pub fn with_cache(mut self, cache: ImportCache) -> Self {
        self.cache = cache;
        self
    }
    /// Replaces the provider used to open paths and URLs.
    pub fn with_provider(mut self, provider: Rc<dyn SourceProvider>) -> Self {
        self.provider = provider;
        self
    }
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
    pub fn cache(&self) -> &ImportCache {
        &self.cache
    }
    pub fn follow_imports(&self) -> bool {
        self.config.follow_imports
    }
    pub fn set_follow_imports(&mut self, follow: bool) {
        self.config.follow_imports = follow;
    }
    /// Registers a document under an import location. Returns true if the
    /// location was not cached before.
    pub fn add_import(&self, key: impl Into<String>, doc: SharedDocument) -> bool {
        self.cache.insert(key, doc)
    }

    /// Parses a local path or an `http:`, `https:` or `file:` URL.
    pub fn parse(&self, location: &str) -> Result<Document> {
        self.parse_source(Source::from_location(location)?)
    }
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<Document> {
        self.parse_source(Source::Path(path.as_ref().to_path_buf()))
    }
    pub fn parse_url(&self, url: &Url) -> Result<Document> {
        self.parse_source(Source::Url(url.clone()))
    }
    pub fn parse_reader<R: BufRead + 'static>(&self, reader: R) -> Result<Document> {
        self.parse_source(Source::Reader(Box::new(reader)))
    }
    pub fn parse_str(&self, text: &str) -> Result<Document> {
        self.parse_reader(Cursor::new(text.to_owned()))
    }

    pub fn parse_source(&self, source: Source) -> Result<Document> {
        let location = source.location();
        let key = location.as_ref().map(location_key);
        if let Some(key) = &key {
            self.cache.begin(key);
        }
        let result = self.read_source(source, location.as_ref());
        if let Some(key) = &key {
            self.cache.finish(key);
        }
        result
    }

    fn read_source(&self, source: Source, location: Option<&Location>) -> Result<Document> {
        let described = format!("{:?}", source);
        let opened = match source {
            Source::Path(path) => self.provider.open_path(&path),
            Source::Url(url) => self.provider.open_url(&url),
            Source::Reader(reader) => Ok(reader),
        };
        let reader = opened.map_err(|e| OboError::Io {
            location: described.clone(),
            source: e,
        })?;
        debug!(source = %described, "parsing");
        let mut grammar = Grammar::new(reader, &self.config)?;
        let mut doc = Document::new();
        grammar.parse_document(&mut doc)?;
        self.resolve_imports(&mut doc, location)?;
        Ok(doc)
    }

    // Rewrites import clauses to absolute locations and, when following
    // imports, attaches the imported documents to `doc`.
    fn resolve_imports(&self, doc: &mut Document, location: Option<&Location>) -> Result<()> {
        let mut paths = Vec::new();
        if let Some(header) = doc.header_mut() {
            for clause in header.clauses_mut().iter_mut().filter(|c| c.is(Tag::Import)) {
                let resolved = match clause.text() {
                    Some(path) => resolve_import(path, location),
                    None => continue,
                };
                clause.set_value(resolved.as_str());
                paths.push(resolved);
            }
        }
        if !self.config.follow_imports {
            return Ok(());
        }
        let mut imports = Vec::new();
        for path in paths {
            if let Some(cached) = self.cache.get(&path) {
                imports.push(cached);
                continue;
            }
            if !self.cache.begin(&path) {
                warn!(import = %path, "import cycle detected, not parsing the import again");
                continue;
            }
            let nested = Parser {
                config: self.config.clone(),
                cache: self.cache.clone(),
                provider: Rc::clone(&self.provider),
            };
            let result = nested.parse(&path);
            self.cache.finish(&path);
            let imported = result?.into_shared();
            self.cache.insert(path.as_str(), Rc::clone(&imported));
            imports.push(imported);
        }
        doc.set_imports(imports);
        Ok(())
    }

    /// Reports identifiers used in term and typedef frames that resolve to
    /// no declared frame. Follows imports when this parser does.
    pub fn check_dangling_references(&self, doc: &Document) -> Vec<String> {
        validate::dangling_references(doc, self.config.follow_imports)
    }
}

// ------------- Dispatch -------------
type Rule = fn(&mut Grammar, &mut Clause) -> Result<()>;

// builds a tag to rule table, several tags may share one rule
macro_rules! rules {
    ( $( [ $( $tag:ident ),+ ] => $rule:ident ),* $(,)? ) => {{
        let mut table: HashMap<Tag, Rule> = HashMap::new();
        $( $( table.insert(Tag::$tag, Grammar::$rule as Rule); )+ )*
        table
    }};
}

lazy_static! {
    static ref HEADER_RULES: HashMap<Tag, Rule> = rules! {
        [Synonymtypedef] => parse_synonym_typedef,
        [Subsetdef] => parse_subsetdef,
        [Date] => parse_header_date,
        [PropertyValue] => parse_header_property_value,
        [Import] => parse_import,
        [Idspace] => parse_idspace,
    };
    static ref TERM_RULES: HashMap<Tag, Rule> = rules! {
        [IsAnonymous, Builtin, IsObsolete] => parse_boolean,
        [Name, Comment, CreatedBy, Subset] => parse_unquoted_string,
        [Namespace, AltId, IsA, UnionOf, EquivalentTo, DisjointFrom, ReplacedBy, Consider] => parse_id_ref,
        [Def] => parse_def,
        [Synonym] => parse_synonym,
        [Xref] => parse_direct_xref,
        [PropertyValue] => parse_property_value,
        [IntersectionOf] => parse_term_intersection_of,
        [Relationship] => parse_relationship,
        [CreationDate] => parse_iso_date,
    };
    static ref TYPEDEF_RULES: HashMap<Tag, Rule> = rules! {
        [
            IsAnonymous, Builtin, IsObsolete, IsAntiSymmetric, IsCyclic, IsReflexive,
            IsSymmetric, IsAsymmetric, IsTransitive, IsFunctional, IsInverseFunctional,
            IsMetadataTag, IsClassLevel
        ] => parse_boolean,
        [Name, Comment, CreatedBy] => parse_unquoted_string,
        [
            Namespace, AltId, Subset, IsA, UnionOf, EquivalentTo, DisjointFrom, ReplacedBy,
            Consider, InverseOf, TransitiveOver, DisjointOver, Domain, Range
        ] => parse_id_ref,
        [Def] => parse_def,
        [Synonym] => parse_synonym,
        [Xref] => parse_direct_xref,
        [PropertyValue] => parse_property_value,
        [IntersectionOf] => parse_typedef_intersection_of,
        [Relationship] => parse_relationship,
        [CreationDate] => parse_iso_date,
        [HoldsOverChain, EquivalentToChain] => parse_id_ref_pair,
        [ExpandAssertionTo, ExpandExpressionTo] => parse_owl_def,
    };
}

fn rule_for(table: &HashMap<Tag, Rule>, tag: &str) -> Rule {
    Tag::from_text(tag)
        .and_then(|t| table.get(&t).copied())
        .unwrap_or(Grammar::parse_unquoted_string)
}

// ------------- Grammar -------------
// what to do after a stanza has been read
enum Flow {
    Continue,
    Stop,
}

struct Grammar {
    stream: LineStream,
    instances: InstancePolicy,
    add_default_namespace: bool,
}

impl Grammar {
    fn new(reader: Box<dyn BufRead>, config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            stream: LineStream::new(reader)?,
            instances: config.instance_stanzas,
            add_default_namespace: config.add_default_namespace,
        })
    }

    fn error(&self, message: impl Into<String>) -> OboError {
        OboError::parse(message, self.stream.line_no(), self.stream.line())
    }
    fn error_caused(&self, message: impl Into<String>, cause: impl Into<Cause>) -> OboError {
        OboError::parse_caused(message, self.stream.line_no(), self.stream.line(), cause)
    }
    fn warn(&self, message: &str) {
        warn!(line = self.stream.line_no(), text = %self.stream.line(), "{}", message);
    }

    fn parse_document(&mut self, doc: &mut Document) -> Result<()> {
        let mut header = Frame::new(FrameType::Header);
        self.parse_header_frame(&mut header)?;
        header.freeze();
        let default_namespace = header.tag_text(Tag::DefaultNamespace.text()).map(str::to_owned);
        doc.set_header(header);
        self.skip_blank_lines()?;
        while !self.stream.eof() {
            if let Flow::Stop = self.parse_entity_frame(doc)? {
                break;
            }
            self.skip_blank_lines()?;
        }
        if let (true, Some(namespace)) = (self.add_default_namespace, default_namespace) {
            add_namespace(doc.term_frames_mut(), &namespace);
            add_namespace(doc.typedef_frames_mut(), &namespace);
            add_namespace(doc.instance_frames_mut(), &namespace);
        }
        Ok(())
    }

    // ------------- Header -------------
    fn parse_header_frame(&mut self, header: &mut Frame) -> Result<()> {
        while self.parse_header_clause_nl(header)? {}
        Ok(())
    }

    fn parse_header_clause_nl(&mut self, header: &mut Frame) -> Result<bool> {
        self.skip_blank_lines()?;
        if self.stream.eof() || self.stream.peek_char_is('[') {
            return Ok(false);
        }
        let tag = self.parse_tag()?;
        let mut clause = Clause::new(tag.as_str());
        rule_for(&HEADER_RULES, &tag)(self, &mut clause)?;
        header.add_clause(clause);
        self.parse_hidden_comment();
        self.force_nl_or_eof()?;
        Ok(true)
    }

    fn parse_header_property_value(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_property_value(clause)?;
        self.parse_qualifiers_and_hidden_comment(clause)
    }

    // ------------- Stanzas -------------
    fn parse_entity_frame(&mut self, doc: &mut Document) -> Result<Flow> {
        self.skip_blank_lines()?;
        let rest = self.stream.rest();
        if rest.starts_with("[Term]") {
            self.parse_frame(doc, FrameType::Term)?;
        } else if rest.starts_with("[Instance]") {
            return self.handle_instance_frame();
        } else {
            self.parse_frame(doc, FrameType::Typedef)?;
        }
        Ok(Flow::Continue)
    }

    fn handle_instance_frame(&mut self) -> Result<Flow> {
        match self.instances {
            InstancePolicy::Abandon => {
                error!(
                    line = self.stream.line_no(),
                    "Instance frames are not supported yet, parsing stopped"
                );
                while !self.stream.eof() {
                    self.stream.advance_line()?;
                }
                Ok(Flow::Stop)
            }
            InstancePolicy::Skip => {
                warn!(line = self.stream.line_no(), "skipping unsupported [Instance] frame");
                self.stream.advance_line()?;
                while !self.stream.eof() && !self.stream.line().trim_start().starts_with('[') {
                    self.stream.advance_line()?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn parse_frame(&mut self, doc: &mut Document, frame_type: FrameType) -> Result<()> {
        let (opener, rules): (&str, &HashMap<Tag, Rule>) = match frame_type {
            FrameType::Term => ("[Term]", &*TERM_RULES),
            _ => ("[Typedef]", &*TYPEDEF_RULES),
        };
        let mut frame = Frame::new(frame_type);
        self.skip_blank_lines()?;
        if !self.stream.consume(opener) {
            return Err(self.error(format!(
                "Expected a {} frame, but found unknown stanza type.",
                opener
            )));
        }
        self.force_nl_or_eof()?;
        self.parse_id_line(&mut frame)?;
        self.skip_blank_lines()?;
        while !(self.stream.eof() || self.stream.peek_char_is('[')) {
            self.parse_frame_clause_eol(&mut frame, frame_type, rules)?;
            self.skip_blank_lines()?;
        }
        frame.freeze();
        let described = frame.to_string();
        doc.add_frame(frame).map_err(|e| {
            self.error_caused(
                format!("Could not add frame {} to document, duplicate frame definition?", described),
                e,
            )
        })
    }

    fn parse_id_line(&mut self, frame: &mut Frame) -> Result<()> {
        let tag = self.parse_tag()?;
        if tag != Tag::Id.text() {
            return Err(self.error(format!(
                "Expected id tag as first line in frame, but was: {}",
                tag
            )));
        }
        let id = self.stream.scan_until(BRACE, false);
        if id.trim().is_empty() {
            return Err(self.error("Could not find an valid id, id is empty."));
        }
        let mut clause = Clause::with_value(tag, id.as_str());
        frame.set_id(id);
        self.parse_eol(&mut clause)?;
        frame.add_clause(clause);
        Ok(())
    }

    fn parse_frame_clause_eol(
        &mut self,
        frame: &mut Frame,
        frame_type: FrameType,
        rules: &HashMap<Tag, Rule>,
    ) -> Result<()> {
        if self.stream.peek_char_is('!') {
            self.parse_hidden_comment();
            return self.force_nl_or_eof();
        }
        let mut tag = self.parse_tag()?;
        if frame_type == FrameType::Typedef && tag == tag::DEPRECATED_IS_METADATA {
            info!(line = self.stream.line_no(), "is_metadata DEPRECATED; switching to is_metadata_tag");
            tag = Tag::IsMetadataTag.text().to_owned();
        }
        let mut clause = Clause::new(tag.as_str());
        match tag::deprecated_synonym_scope(&tag) {
            Some(scope) => self.parse_deprecated_synonym(&mut clause, scope)?,
            None => rule_for(rules, &tag)(self, &mut clause)?,
        }
        self.parse_eol(&mut clause)?;
        frame.add_clause(clause);
        Ok(())
    }

    // ------------- Tag-value pairs -------------
    fn parse_tag(&mut self) -> Result<String> {
        if self.stream.eof() {
            return Err(self.error("Expected an id tag, not end of file."));
        }
        if self.stream.eol() {
            return Err(self.error("Expected an id tag, not end of line"));
        }
        let i = match self.stream.index_of(':') {
            Some(i) => i,
            None => return Err(self.error("Could not find tag separator ':' in line.")),
        };
        let tag = self.stream.rest()[..i].to_owned();
        self.stream.advance(i + 1);
        self.parse_ws()?;
        self.skip_ws();
        Ok(tag::map_deprecated(&tag).to_owned())
    }

    fn read_id(&mut self, optional: bool) -> Result<Option<String>> {
        let id = self.stream.scan_until(BRACE, false);
        if id.is_empty() {
            if optional {
                return Ok(None);
            }
            return Err(self.error("Expected an identifier."));
        }
        Ok(Some(id))
    }

    fn parse_id_ref(&mut self, clause: &mut Clause) -> Result<()> {
        if let Some(id) = self.read_id(false)? {
            clause.add_value(id);
        }
        Ok(())
    }

    fn parse_optional_id_ref(&mut self, clause: &mut Clause) -> Result<()> {
        if let Some(id) = self.read_id(true)? {
            clause.add_value(id);
        }
        Ok(())
    }

    fn parse_id_ref_pair(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref(clause)?;
        self.parse_one_or_more_ws()?;
        self.parse_id_ref(clause)
    }

    fn parse_relationship(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref_pair(clause)
    }

    fn parse_iso_date(&mut self, clause: &mut Clause) -> Result<()> {
        let date = self.stream.scan_until(BRACE, false);
        clause.set_value(date);
        Ok(())
    }

    fn parse_header_date(&mut self, clause: &mut Clause) -> Result<()> {
        self.skip_ws();
        let text = remove_trailing_ws(&self.stream.scan_until("!", false));
        match parse_header_date(&text) {
            Ok(date) => {
                clause.add_value(date);
                Ok(())
            }
            Err(e) => Err(self.error_caused(format!("Could not parse date from string: {}", text), e)),
        }
    }

    fn parse_subsetdef(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref(clause)?;
        self.parse_one_or_more_ws()?;
        if !self.stream.consume("\"") {
            return Err(self.error("Expected a quoted subset description."));
        }
        let description = self.scan_until_adv("\"");
        clause.add_value(description);
        self.parse_qualifiers_and_hidden_comment(clause)
    }

    fn parse_synonym_typedef(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref(clause)?;
        self.parse_one_or_more_ws()?;
        if self.stream.consume("\"") {
            let description = self.scan_until_adv("\"");
            clause.add_value(description);
            if self.stream.peek_char_is(' ') {
                self.parse_one_or_more_ws()?;
                self.parse_optional_id_ref(clause)?;
            }
        }
        self.parse_qualifiers_and_hidden_comment(clause)
    }

    fn parse_import(&mut self, clause: &mut Clause) -> Result<()> {
        self.skip_ws();
        let path = remove_trailing_ws(&self.stream.scan_until("!{", false));
        clause.set_value(path);
        // annotations on imports are read and dropped
        self.skip_ws();
        if self.stream.peek_char_is('{') {
            self.scan_until_adv("}");
        }
        self.parse_hidden_comment();
        Ok(())
    }

    fn parse_idspace(&mut self, clause: &mut Clause) -> Result<()> {
        self.skip_ws();
        self.parse_id_ref_pair(clause)?;
        self.skip_ws();
        if self.stream.consume("\"") {
            let description = self.scan_until_adv("\"");
            clause.add_value(description);
        } else {
            let description = self.stream.scan_until(BRACE, false);
            if !description.is_empty() {
                clause.add_value(description);
            }
        }
        self.parse_qualifiers_and_hidden_comment(clause)
    }

    fn parse_property_value_slot(&mut self, clause: &mut Clause) -> Result<()> {
        if self.stream.consume("\"") {
            let text = self.scan_until_adv("\"");
            clause.add_value(text);
            Ok(())
        } else {
            self.parse_id_ref(clause)
        }
    }

    fn parse_property_value(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_property_value_slot(clause)?;
        self.parse_one_or_more_ws()?;
        self.parse_property_value_slot(clause)?;
        // optional third slot
        self.skip_ws();
        if self.stream.consume("\"") {
            let text = self.scan_until_adv("\"");
            clause.add_value(text);
        } else {
            let text = self.stream.scan_until(BRACE, false);
            if !text.trim().is_empty() {
                clause.add_value(text);
            }
        }
        Ok(())
    }

    fn parse_term_intersection_of(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref(clause)?;
        self.skip_ws();
        if !self.stream.eol() && !self.stream.peek_char_is('!') && !self.stream.peek_char_is('{') {
            self.parse_optional_id_ref(clause)?;
        }
        Ok(())
    }

    fn parse_typedef_intersection_of(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_id_ref(clause)
    }

    fn parse_boolean(&mut self, clause: &mut Clause) -> Result<()> {
        if self.stream.consume("true") {
            clause.set_value(true);
        } else if self.stream.consume("false") {
            clause.set_value(false);
        } else {
            return Err(self.error("Could not parse bool value."));
        }
        Ok(())
    }

    fn parse_unquoted_string(&mut self, clause: &mut Clause) -> Result<()> {
        self.skip_ws();
        let text = remove_trailing_ws(&self.stream.scan_until("!{", false));
        clause.set_value(text);
        if self.stream.peek_char_is('{') {
            self.parse_qualifier_block(clause)?;
        }
        self.parse_hidden_comment();
        Ok(())
    }

    // ------------- Quoted text -------------
    fn parse_quoted(&mut self, clause: &mut Clause, missing: &str) -> Result<()> {
        if !self.stream.consume("\"") {
            return Err(self.error(missing));
        }
        let text = self.scan_until_adv("\"");
        clause.set_value(text);
        self.skip_ws();
        Ok(())
    }

    fn parse_def(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_quoted(clause, "Definitions should always be a quoted string.")?;
        self.parse_xref_list(clause, true)
    }

    fn parse_owl_def(&mut self, clause: &mut Clause) -> Result<()> {
        let missing = format!("The {} clause is always a quoted string.", clause.tag());
        self.parse_quoted(clause, &missing)?;
        self.parse_xref_list(clause, true)
    }

    fn parse_synonym(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_quoted(clause, "The synonym is always a quoted string.")?;
        // optional scope, then optional synonym type
        for _ in 0..2 {
            if self.stream.peek_char_is('[') {
                break;
            }
            self.parse_optional_id_ref(clause)?;
            self.skip_ws();
        }
        self.parse_xref_list(clause, false)
    }

    fn parse_deprecated_synonym(&mut self, clause: &mut Clause, scope: Tag) -> Result<()> {
        clause.set_tag(Tag::Synonym.text());
        self.parse_quoted(clause, "The synonym is always a quoted string.")?;
        clause.add_value(scope.text());
        self.parse_xref_list(clause, false)
    }

    // ------------- Xrefs -------------
    fn parse_xref_list(&mut self, clause: &mut Clause, optional: bool) -> Result<()> {
        if self.stream.consume("[") {
            if self.parse_xref(clause)? {
                while self.stream.consume(",") && self.parse_xref(clause)? {}
            }
            self.skip_ws();
            if !self.stream.consume("]") {
                return Err(self.error(format!(
                    "Missing closing ']' for xref list at pos: {}",
                    self.stream.pos()
                )));
            }
        } else if !optional {
            return Err(self.error(format!(
                "Clause: {}; expected an xref list, or at least an empty list '[]' at pos: {}",
                clause.tag(),
                self.stream.pos()
            )));
        }
        Ok(())
    }

    fn parse_xref_id(&mut self) -> String {
        self.skip_ws();
        let id = self.stream.scan_until(XREF_END, true);
        let id = id.trim();
        if id.contains(' ') {
            self.warn(&format!("accepting bad xref with spaces: <{}>", id));
        }
        id.to_owned()
    }

    fn parse_xref_annotation(&mut self, xref: &mut Xref) {
        self.skip_ws();
        if self.stream.consume("\"") {
            let annotation = self.scan_until_adv("\"");
            xref.set_annotation(annotation);
        }
        self.skip_ws();
    }

    // an xref inside a trailing list
    fn parse_xref(&mut self, clause: &mut Clause) -> Result<bool> {
        let id = self.parse_xref_id();
        if id.is_empty() {
            return Ok(false);
        }
        let mut xref = Xref::new(id);
        self.parse_xref_annotation(&mut xref);
        clause.add_xref(xref);
        self.parse_qualifier_block(clause)?;
        Ok(true)
    }

    // an xref that is the value of the clause itself
    fn parse_direct_xref(&mut self, clause: &mut Clause) -> Result<()> {
        let id = self.parse_xref_id();
        if id.is_empty() {
            return Err(self.error("Expected an xref identifier."));
        }
        let mut xref = Xref::new(id);
        self.parse_xref_annotation(&mut xref);
        clause.add_value(xref);
        self.parse_qualifier_block(clause)
    }

    // ------------- Qualifiers -------------
    fn parse_qualifiers_and_hidden_comment(&mut self, clause: &mut Clause) -> Result<()> {
        self.skip_ws();
        self.parse_qualifier_block(clause)?;
        self.parse_hidden_comment();
        Ok(())
    }

    fn parse_qualifier_block(&mut self, clause: &mut Clause) -> Result<()> {
        if !self.stream.consume("{") {
            return Ok(());
        }
        if self.parse_qualifier(clause)? {
            while self.stream.consume(",") && self.parse_qualifier(clause)? {}
        }
        self.skip_ws();
        if !self.stream.consume("}") {
            return Err(self.error("Missing closing '}' for trailing qualifier block."));
        }
        Ok(())
    }

    fn parse_qualifier(&mut self, clause: &mut Clause) -> Result<bool> {
        self.skip_ws();
        if self.stream.peek_char_is('}') {
            return Ok(false);
        }
        if !self.stream.rest().contains('=') {
            return Err(self.error(
                "Missing '=' in trailing qualifier block. This might happen for not properly escaped '{', '}' chars in comments.",
            ));
        }
        let key = self.scan_until_adv("=");
        let key = key.trim_end();
        self.skip_ws();
        let mut value = if self.stream.consume("\"") {
            self.scan_until_adv("\"")
        } else {
            let value = self.stream.scan_until(" ,}", false);
            self.warn(&format!(
                "qualifier values should be enclosed in quotes. You have: {}={}",
                key, value
            ));
            value
        };
        if value.trim().is_empty() {
            self.warn("Empty value for qualifier in trailing qualifier block.");
            value.clear();
        }
        clause.add_qualifier(QualifierValue::new(key, value));
        self.skip_ws();
        Ok(true)
    }

    // ------------- Whitespace, comments, line ends -------------
    fn scan_until_adv(&mut self, delimiters: &str) -> String {
        let text = self.stream.scan_until(delimiters, false);
        self.stream.advance_char();
        text
    }

    fn parse_eol(&mut self, clause: &mut Clause) -> Result<()> {
        self.parse_qualifiers_and_hidden_comment(clause)?;
        self.force_nl_or_eof()
    }

    fn parse_hidden_comment(&mut self) {
        self.skip_ws();
        if self.stream.peek_char_is('!') {
            self.stream.force_eol();
        }
    }

    fn force_nl_or_eof(&mut self) -> Result<()> {
        self.skip_ws();
        if self.stream.eol() {
            return self.stream.advance_line();
        }
        if self.stream.eof() {
            return Ok(());
        }
        Err(self.error(format!(
            "expected newline or end of line but found: {}",
            self.stream.rest()
        )))
    }

    // blank lines, whitespace and comment-only lines
    fn skip_blank_lines(&mut self) -> Result<()> {
        loop {
            self.skip_ws();
            self.parse_hidden_comment();
            if !self.stream.eol() {
                return Ok(());
            }
            self.stream.advance_line()?;
        }
    }

    // exactly one space is expected after a tag, but its absence is tolerated
    fn parse_ws(&mut self) -> Result<()> {
        if self.stream.eol() {
            return Err(self.error(format!(
                "Expected at least one white space, but found end of line at pos: {}",
                self.stream.pos()
            )));
        }
        if self.stream.eof() {
            return Err(self.error("Expected at least one white space, but found end of file."));
        }
        if self.stream.peek_char_is(' ') {
            self.stream.advance(1);
        } else {
            self.warn(&format!("Expected white space at pos: {}", self.stream.pos()));
        }
        Ok(())
    }

    fn parse_one_or_more_ws(&mut self) -> Result<()> {
        let mut n = 0;
        while self.stream.peek_char_is(' ') {
            self.stream.advance(1);
            n += 1;
        }
        if n == 0 {
            return Err(self.error(format!(
                "Expected at least one white space at pos: {}",
                self.stream.pos()
            )));
        }
        Ok(())
    }

    fn skip_ws(&mut self) {
        while self.stream.peek_char_is(' ') {
            self.stream.advance(1);
        }
    }
}

fn add_namespace<'d>(frames: impl Iterator<Item = &'d mut Frame>, namespace: &str) {
    for frame in frames {
        if frame.clause(Tag::Namespace.text()).is_none() {
            frame.add_clause(Clause::with_value(Tag::Namespace.text(), namespace));
        }
    }
}
