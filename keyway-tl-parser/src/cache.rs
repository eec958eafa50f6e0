//! Process-wide cache of parsed descriptors.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::errors::ParseError;
use crate::schema::TypeSchema;

type Cache = Mutex<HashMap<&'static str, Arc<TypeSchema>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(Default::default)
}

/// Returns the parsed schema for `descriptor`, parsing it on first use.
///
/// Parsing is pure, so two callers racing on the same descriptor may both
/// parse it; whichever inserts first wins and both observe equal schemas.
/// Failed parses are not cached.
pub fn schema_for(descriptor: &'static str) -> Result<Arc<TypeSchema>, ParseError> {
    if let Some(schema) = cache().lock().unwrap_or_else(|e| e.into_inner()).get(descriptor) {
        return Ok(Arc::clone(schema));
    }

    let parsed = Arc::new(descriptor.parse::<TypeSchema>()?);
    let mut map = cache().lock().unwrap_or_else(|e| e.into_inner());
    Ok(Arc::clone(map.entry(descriptor).or_insert(parsed)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lookup_hits_cache() {
        let d = "cached_thing#0badf00d a:int = Thing";
        let first = schema_for(d).unwrap();
        let second = schema_for(d).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn errors_are_not_cached() {
        assert!(schema_for("broken#zz = X").is_err());
        assert!(schema_for("broken#zz = X").is_err());
    }
}
