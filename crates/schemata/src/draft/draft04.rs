use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Keyword;
use crate::keywords::array::{ADDITIONAL_ITEMS, ITEMS_LEGACY, MAX_ITEMS, MIN_ITEMS, UNIQUE_ITEMS};
use crate::keywords::composition::{ALL_OF, ANY_OF, NOT, ONE_OF};
use crate::keywords::defs::{DEFINITIONS, DEFS};
use crate::keywords::dependencies::DEPENDENCIES;
use crate::keywords::number::{MAXIMUM_04, MINIMUM_04, MULTIPLE_OF};
use crate::keywords::object::{
    ADDITIONAL_PROPERTIES, MAX_PROPERTIES, MIN_PROPERTIES, PATTERN_PROPERTIES, PROPERTIES, REQUIRED,
};
use crate::keywords::reference::{ID_04, REF, SCHEMA};
use crate::keywords::string::{FORMAT, MAX_LENGTH, MIN_LENGTH, PATTERN};
use crate::keywords::value::{ENUM, TYPE};

pub(super) static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://json-schema\.org/draft-04/schema#?$").expect("invalid draft-04 id pattern")
});

pub(super) const KEYWORDS: &[Keyword] = &[
    ID_04,
    SCHEMA,
    REF,
    DEFS,
    DEFINITIONS,
    TYPE,
    ENUM,
    MULTIPLE_OF,
    MINIMUM_04,
    MAXIMUM_04,
    MIN_LENGTH,
    MAX_LENGTH,
    PATTERN,
    FORMAT,
    ITEMS_LEGACY,
    ADDITIONAL_ITEMS,
    MIN_ITEMS,
    MAX_ITEMS,
    UNIQUE_ITEMS,
    REQUIRED,
    PROPERTIES,
    PATTERN_PROPERTIES,
    ADDITIONAL_PROPERTIES,
    MIN_PROPERTIES,
    MAX_PROPERTIES,
    DEPENDENCIES,
    ALL_OF,
    ANY_OF,
    ONE_OF,
    NOT,
];
