use std::collections::{BTreeMap, btree_map::Entry};

use heck::AsPascalCase;
use unicase::UniCase;

/// Normalizes an API name for use as a file name and module identifier,
/// by replacing the first run of `-` or `.` characters with `_`.
///
/// # Examples
///
/// ```
/// # use refpack::codegen::normalize_name;
/// assert_eq!(normalize_name("derbysoft-proxy"), "derbysoft_proxy");
/// assert_eq!(normalize_name("win.-api"), "win_api");
/// assert_eq!(normalize_name("simard"), "simard");
/// ```
pub fn normalize_name(name: &str) -> String {
    let Some(start) = name.find(['-', '.']) else {
        return name.to_owned();
    };
    let end = name[start..]
        .find(|c| c != '-' && c != '.')
        .map_or(name.len(), |len| start + len);
    format!("{}_{}", &name[..start], &name[end..])
}

/// Produces type names that never collide with other names in this space,
/// even if they only differ by case.
#[derive(Debug, Default)]
pub struct UniqueNames(BTreeMap<UniCase<String>, usize>);

impl UniqueNames {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a unique name, adding a numeric suffix on collisions.
    /// Suffixed names are claimed too, so a later request for the same
    /// spelling gets a fresh suffix.
    pub fn uniquify(&mut self, name: String) -> String {
        let key = UniCase::new(name.clone());
        let Some(&taken) = self.0.get(&key) else {
            self.0.insert(key, 1);
            return name;
        };
        let mut count = taken;
        loop {
            count += 1;
            let candidate = format!("{name}{count}");
            if let Entry::Vacant(entry) = self.0.entry(UniCase::new(candidate.clone())) {
                entry.insert(1);
                self.0.insert(key, count);
                return candidate;
            }
        }
    }
}

/// Converts a schema or API name to a PascalCase TypeScript type name.
pub fn ts_type_name(name: &str) -> String {
    let pascal = AsPascalCase(name).to_string();
    match pascal.chars().next() {
        Some(c) if is_ts_ident_start(c) => pascal,
        Some(_) => format!("_{pascal}"),
        None => "_".to_owned(),
    }
}

/// Returns `true` if `name` can be written as an unquoted property name.
pub fn is_ts_ident(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ts_ident_start) && chars.all(is_ts_ident_continue)
}

fn is_ts_ident_start(c: char) -> bool {
    c == '$' || c == '_' || unicode_ident::is_xid_start(c)
}

fn is_ts_ident_continue(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}
