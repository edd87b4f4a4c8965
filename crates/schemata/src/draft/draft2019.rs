use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Keyword;
use crate::keywords::array::{ADDITIONAL_ITEMS, CONTAINS, ITEMS_LEGACY, MAX_ITEMS, MIN_ITEMS, UNIQUE_ITEMS};
use crate::keywords::composition::{ALL_OF, ANY_OF, NOT, ONE_OF};
use crate::keywords::conditional::IF;
use crate::keywords::defs::{DEFINITIONS, DEFS};
use crate::keywords::dependencies::{DEPENDENT_REQUIRED, DEPENDENT_SCHEMAS};
use crate::keywords::number::{EXCLUSIVE_MAXIMUM, EXCLUSIVE_MINIMUM, MAXIMUM, MINIMUM, MULTIPLE_OF};
use crate::keywords::object::{
    ADDITIONAL_PROPERTIES, MAX_PROPERTIES, MIN_PROPERTIES, PATTERN_PROPERTIES, PROPERTIES, PROPERTY_NAMES,
    REQUIRED,
};
use crate::keywords::reference::{ANCHOR, ID, RECURSIVE_ANCHOR, RECURSIVE_REF, REF, SCHEMA};
use crate::keywords::string::{FORMAT, MAX_LENGTH, MIN_LENGTH, PATTERN};
use crate::keywords::unevaluated::{UNEVALUATED_ITEMS, UNEVALUATED_PROPERTIES};
use crate::keywords::value::{CONST, ENUM, TYPE};

pub(super) static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://json-schema\.org/draft/2019-09/schema#?$").expect("invalid draft-2019-09 id pattern")
});

pub(super) const KEYWORDS: &[Keyword] = &[
    ID,
    SCHEMA,
    ANCHOR,
    RECURSIVE_ANCHOR,
    REF,
    RECURSIVE_REF,
    DEFS,
    DEFINITIONS,
    TYPE,
    ENUM,
    CONST,
    MULTIPLE_OF,
    MINIMUM,
    MAXIMUM,
    EXCLUSIVE_MINIMUM,
    EXCLUSIVE_MAXIMUM,
    MIN_LENGTH,
    MAX_LENGTH,
    PATTERN,
    FORMAT,
    ITEMS_LEGACY,
    ADDITIONAL_ITEMS,
    CONTAINS,
    MIN_ITEMS,
    MAX_ITEMS,
    UNIQUE_ITEMS,
    REQUIRED,
    PROPERTIES,
    PATTERN_PROPERTIES,
    ADDITIONAL_PROPERTIES,
    PROPERTY_NAMES,
    MIN_PROPERTIES,
    MAX_PROPERTIES,
    DEPENDENT_REQUIRED,
    DEPENDENT_SCHEMAS,
    IF,
    ALL_OF,
    ANY_OF,
    ONE_OF,
    NOT,
    UNEVALUATED_PROPERTIES,
    UNEVALUATED_ITEMS,
];
