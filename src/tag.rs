//! The tag registry: every clause tag the OBO 1.4 grammar knows about, its
//! canonical text and the three output priorities a serializer has to honor.
//!
//! Unknown tags are legal (they are parsed as free text), so lookups return
//! `Option`. Ordering helpers place unknown tags after every known tag and
//! keep them in their original relative order.

use lazy_static::lazy_static;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Priority given to tags that have no rank in a particular ordering.
pub const UNRANKED: u32 = 10000;

/// Fixed header date layout, `dd:MM:yyyy HH:mm`.
pub const HEADER_DATE_FORMAT: &str = "%d:%m:%Y %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagDescriptor {
    tag: Tag,
    text: &'static str,
    header_priority: u32,
    priority: u32,
    typedef_priority: u32,
}
impl TagDescriptor {
    pub fn tag(&self) -> Tag {
        self.tag
    }
    pub fn text(&self) -> &'static str {
        self.text
    }
    pub fn header_priority(&self) -> u32 {
        self.header_priority
    }
    pub fn priority(&self) -> u32 {
        self.priority
    }
    pub fn typedef_priority(&self) -> u32 {
        self.typedef_priority
    }
    pub fn rank(&self, ordering: TagOrdering) -> u32 {
        match ordering {
            TagOrdering::Header => self.header_priority,
            TagOrdering::Generic => self.priority,
            TagOrdering::Typedef => self.typedef_priority,
        }
    }
}

// Generates the Tag enum together with a catalog in declaration order, so
// that `Tag as usize` indexes straight into CATALOG.
macro_rules! tags {
    ( $( $variant:ident => $text:literal [ $header:expr, $generic:expr, $typedef:expr ] ),* $(,)? ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Tag {
            $( $variant, )*
        }

        static CATALOG: &[TagDescriptor] = &[
            $(
                TagDescriptor {
                    tag: Tag::$variant,
                    text: $text,
                    header_priority: $header,
                    priority: $generic,
                    typedef_priority: $typedef,
                },
            )*
        ];
    };
}

const U: u32 = UNRANKED;

tags! {
    // header tags
    FormatVersion => "format-version" [0, U, U],
    // ontology sits late in the header, after the macros, as OBO-Edit writes it
    Ontology => "ontology" [85, U, U],
    DataVersion => "data-version" [10, U, U],
    Date => "date" [15, U, U],
    SavedBy => "saved-by" [20, U, U],
    AutoGeneratedBy => "auto-generated-by" [25, U, U],
    Import => "import" [80, U, U],
    Subsetdef => "subsetdef" [35, U, U],
    Synonymtypedef => "synonymtypedef" [40, U, U],
    DefaultNamespace => "default-namespace" [45, U, U],
    Idspace => "idspace" [50, U, U],
    TreatXrefsAsEquivalent => "treat-xrefs-as-equivalent" [55, U, U],
    TreatXrefsAsReverseGenusDifferentia => "treat-xrefs-as-reverse-genus-differentia" [U, U, U],
    TreatXrefsAsGenusDifferentia => "treat-xrefs-as-genus-differentia" [60, U, U],
    TreatXrefsAsRelationship => "treat-xrefs-as-relationship" [65, U, U],
    TreatXrefsAsIsA => "treat-xrefs-as-is_a" [70, U, U],
    TreatXrefsAsHasSubclass => "treat-xrefs-as-has-subclass" [U, U, U],
    OwlAxioms => "owl-axioms" [110, U, U],
    Remark => "remark" [75, U, U],
    // frame tags
    Id => "id" [U, 5, 5],
    Name => "name" [U, 15, 15],
    Namespace => "namespace" [U, 20, 20],
    AltId => "alt_id" [U, 25, 25],
    Def => "def" [U, 30, 30],
    Comment => "comment" [U, 35, 35],
    Subset => "subset" [U, 40, 40],
    Synonym => "synonym" [U, 45, 45],
    Xref => "xref" [U, 50, 50],
    Builtin => "builtin" [U, 55, 70],
    PropertyValue => "property_value" [100, 98, 55],
    IsA => "is_a" [U, 65, 115],
    IntersectionOf => "intersection_of" [U, 70, 120],
    UnionOf => "union_of" [U, 80, 125],
    EquivalentTo => "equivalent_to" [U, 85, 130],
    DisjointFrom => "disjoint_from" [U, 90, 135],
    Relationship => "relationship" [U, 95, 165],
    CreatedBy => "created_by" [U, 130, 191],
    CreationDate => "creation_date" [U, 140, 192],
    IsObsolete => "is_obsolete" [U, 110, 169],
    ReplacedBy => "replaced_by" [U, 115, 185],
    IsAnonymous => "is_anonymous" [U, 10, 10],
    Domain => "domain" [U, U, 60],
    Range => "range" [U, U, 65],
    IsAntiSymmetric => "is_anti_symmetric" [U, U, 75],
    IsCyclic => "is_cyclic" [U, U, 80],
    IsReflexive => "is_reflexive" [U, U, 85],
    IsSymmetric => "is_symmetric" [U, U, 90],
    IsTransitive => "is_transitive" [U, U, 100],
    IsFunctional => "is_functional" [U, U, 105],
    IsInverseFunctional => "is_inverse_functional" [U, U, 110],
    TransitiveOver => "transitive_over" [U, U, 145],
    HoldsOverChain => "holds_over_chain" [U, 60, 71],
    EquivalentToChain => "equivalent_to_chain" [U, U, 155],
    DisjointOver => "disjoint_over" [U, U, 160],
    ExpandAssertionTo => "expand_assertion_to" [U, U, 195],
    ExpandExpressionTo => "expand_expression_to" [U, U, 200],
    IsClassLevel => "is_class_level" [U, U, 210],
    IsMetadataTag => "is_metadata_tag" [U, U, 205],
    Consider => "consider" [U, 120, 190],
    InverseOf => "inverse_of" [U, U, 140],
    IsAsymmetric => "is_asymmetric" [U, U, U],
    NamespaceIdRule => "namespace-id-rule" [46, U, U],
    LogicalDefinitionViewRelation => "logical-definition-view-relation" [U, U, U],
    // keywords rather than tags, kept here so there is a single table
    Scope => "scope" [U, U, U],
    HasSynonymType => "has_synonym_type" [U, U, U],
    Broad => "BROAD" [U, U, U],
    Narrow => "NARROW" [U, U, U],
    Exact => "EXACT" [U, U, U],
    Related => "RELATED" [U, U, U],
}

// Legacy spellings rewritten before anything else looks at a tag.
static DEPRECATED_TAGS: &[(&str, Tag)] = &[
    ("inverse_of_on_instance_level", Tag::InverseOf),
    ("xref_analog", Tag::Xref),
    ("xref_unknown", Tag::Xref),
    ("instance_level_is_transitive", Tag::IsTransitive),
];

// Legacy synonym tags, each folded into `synonym` with a scope keyword.
static DEPRECATED_SYNONYMS: &[(&str, Tag)] = &[
    ("exact_synonym", Tag::Exact),
    ("narrow_synonym", Tag::Narrow),
    ("broad_synonym", Tag::Broad),
    ("related_synonym", Tag::Related),
];

/// Old typedef spelling of `is_metadata_tag`.
pub const DEPRECATED_IS_METADATA: &str = "is_metadata";

// Tags whose values name other frames, by frame context.
static TERM_REFERENCE_TAGS: &[Tag] = &[
    Tag::IntersectionOf,
    Tag::UnionOf,
    Tag::EquivalentTo,
    Tag::DisjointFrom,
    Tag::Relationship,
    Tag::IsA,
];
static TYPEDEF_REFERENCE_TAGS: &[Tag] = &[
    Tag::IntersectionOf,
    Tag::UnionOf,
    Tag::EquivalentTo,
    Tag::DisjointFrom,
    Tag::InverseOf,
    Tag::TransitiveOver,
    Tag::DisjointOver,
    Tag::IsA,
];

lazy_static! {
    static ref BY_TEXT: HashMap<&'static str, &'static TagDescriptor> =
        CATALOG.iter().map(|d| (d.text, d)).collect();
}

impl Tag {
    pub fn descriptor(self) -> &'static TagDescriptor {
        &CATALOG[self as usize]
    }
    pub fn text(self) -> &'static str {
        self.descriptor().text
    }
    pub fn from_text(text: &str) -> Option<Tag> {
        lookup(text).map(|d| d.tag)
    }
    /// Every known tag, in catalog order.
    pub fn all() -> impl Iterator<Item = Tag> {
        CATALOG.iter().map(|d| d.tag)
    }
    /// Tags whose values reference frames inside a term frame.
    pub fn references_in_term(self) -> bool {
        TERM_REFERENCE_TAGS.contains(&self)
    }
    /// Tags whose values reference frames inside a typedef frame.
    pub fn references_in_typedef(self) -> bool {
        TYPEDEF_REFERENCE_TAGS.contains(&self)
    }
}
impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}
impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        self.text()
    }
}

pub fn lookup(text: &str) -> Option<&'static TagDescriptor> {
    BY_TEXT.get(text).copied()
}

/// Number of entries in the catalog, keywords included.
pub fn len() -> usize {
    CATALOG.len()
}

/// Rewrites a legacy tag spelling onto its canonical text, otherwise returns
/// the input untouched.
pub fn map_deprecated(text: &str) -> &str {
    DEPRECATED_TAGS
        .iter()
        .find(|(old, _)| *old == text)
        .map(|(_, tag)| tag.text())
        .unwrap_or(text)
}

/// Scope keyword for a legacy synonym tag such as `exact_synonym`.
pub fn deprecated_synonym_scope(text: &str) -> Option<Tag> {
    DEPRECATED_SYNONYMS
        .iter()
        .find(|(old, _)| *old == text)
        .map(|(_, scope)| *scope)
}

// ------------- Ordering -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOrdering {
    Header,
    Generic,
    Typedef,
}

pub fn rank(text: &str, ordering: TagOrdering) -> u32 {
    lookup(text).map(|d| d.rank(ordering)).unwrap_or(UNRANKED)
}

pub fn compare(a: &str, b: &str, ordering: TagOrdering) -> Ordering {
    rank(a, ordering).cmp(&rank(b, ordering))
}

pub fn header_order(a: &str, b: &str) -> Ordering {
    compare(a, b, TagOrdering::Header)
}

pub fn generic_order(a: &str, b: &str) -> Ordering {
    compare(a, b, TagOrdering::Generic)
}

pub fn typedef_order(a: &str, b: &str) -> Ordering {
    compare(a, b, TagOrdering::Typedef)
}

/// Stable sort by ascending rank; ties (all unranked tags among them) keep
/// their original relative order.
pub fn sort_tags<S: AsRef<str>>(tags: &mut [S], ordering: TagOrdering) {
    tags.sort_by(|a, b| compare(a.as_ref(), b.as_ref(), ordering));
}
