//! Built-in dialects
//!
//! One keyword table per draft. Table order is validation order; reducer
//! and resolver order comes from each descriptor's `order`.
//!
//! | draft | `$schema` | references |
//! |-------|-----------|------------|
//! | draft-04 | `http://json-schema.org/draft-04/schema#` | `$ref`, `id` |
//! | draft-06 | `http://json-schema.org/draft-06/schema#` | `$ref`, `$id` |
//! | draft-07 | `http://json-schema.org/draft-07/schema#` | `$ref`, `$id` |
//! | 2019-09 | `https://json-schema.org/draft/2019-09/schema` | `$ref`, `$recursiveRef`, `$anchor` |
//! | 2020-12 | `https://json-schema.org/draft/2020-12/schema` | `$ref`, `$dynamicRef`, `$anchor` |

mod draft04;
mod draft06;
mod draft07;
mod draft2019;
mod draft2020;
mod errors;

use std::sync::{Arc, LazyLock};

use crate::dialect::{Dialect, Draft};

pub use errors::templates;

pub fn draft04() -> Dialect {
    Dialect::new(Draft::Draft04, draft04::ID_PATTERN.clone(), draft04::KEYWORDS.to_vec(), templates())
}

pub fn draft06() -> Dialect {
    Dialect::new(Draft::Draft06, draft06::ID_PATTERN.clone(), draft06::KEYWORDS.to_vec(), templates())
}

pub fn draft07() -> Dialect {
    Dialect::new(Draft::Draft07, draft07::ID_PATTERN.clone(), draft07::KEYWORDS.to_vec(), templates())
}

pub fn draft2019_09() -> Dialect {
    Dialect::new(
        Draft::Draft2019_09,
        draft2019::ID_PATTERN.clone(),
        draft2019::KEYWORDS.to_vec(),
        templates(),
    )
}

pub fn draft2020_12() -> Dialect {
    Dialect::new(
        Draft::Draft2020_12,
        draft2020::ID_PATTERN.clone(),
        draft2020::KEYWORDS.to_vec(),
        templates(),
    )
}

static ALL: LazyLock<Vec<Arc<Dialect>>> = LazyLock::new(|| {
    vec![
        Arc::new(draft04()),
        Arc::new(draft06()),
        Arc::new(draft07()),
        Arc::new(draft2019_09()),
        Arc::new(draft2020_12()),
    ]
});

/// Every built-in dialect, oldest first. The last one is the default.
pub fn all() -> Vec<Arc<Dialect>> {
    ALL.clone()
}
