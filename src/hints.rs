use crate::ClassRegistry;
use std::collections::{BTreeSet, HashMap};

/// Raw disambiguation hint tables, parsed from caller-supplied text
///
/// Hint files are tab separated `key<TAB>value[<TAB>ignored]` lines. The
/// core never touches the filesystem; callers read the files and feed the
/// contents in.
#[derive(Debug, Default, Clone)]
pub struct Hints {
    /// Identifiers must resolve through the hint table when present in it
    pub strict: bool,

    /// Source identifier to candidate strings (labels or further aliases)
    pub class_labels: HashMap<String, BTreeSet<String>>,

    /// N64 numeric identity to display/lookup label overrides
    pub enum_prj_id: Option<HashMap<u16, Option<String>>>,
}

impl Hints {
    /// Creates an empty hint set
    pub fn new(strict: bool) -> Hints {
        Hints {
            strict,
            ..Hints::default()
        }
    }

    /// Merges class label alias lines into the table
    pub fn parse_class_labels(&mut self, text: &str) {
        for line in text.lines() {
            let mut parts = line.splitn(3, '\t');
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(k), Some(v)) => (k.trim(), v.trim()),
                _ => continue,
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }
            self.class_labels
                .entry(key.to_string())
                .or_default()
                .insert(value.to_string());
        }
    }

    /// Merges numeric PrjID override lines into the table
    ///
    /// Keys accept decimal or `0x` prefixed hex. An empty value records the
    /// id as known but unnamed.
    pub fn parse_enum_prj_id(&mut self, text: &str) {
        let table = self.enum_prj_id.get_or_insert_with(HashMap::new);
        for line in text.lines() {
            let mut parts = line.splitn(3, '\t');
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(k), Some(v)) => (k.trim(), v.trim()),
                _ => continue,
            };
            let id = match parse_flexible_u16(key) {
                Some(id) => id,
                None => continue,
            };
            let value = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
            table.insert(id, value);
        }
    }
}

fn parse_flexible_u16(input: &str) -> Option<u16> {
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        u16::from_str_radix(hex, 16).ok()
    } else {
        input.parse().ok()
    }
}

/// Resolved closure of which canonical class labels an ambiguous source
/// identifier may denote
///
/// Construction expands the raw alias graph to a fixed point: aliases
/// contribute their own candidates and are pruned from the final sets,
/// identifiers that are themselves canonical include themselves, and the
/// expansion repeats until a full pass adds nothing. Cycles terminate via
/// the no-change test, not acyclicity. Immutable once built.
#[derive(Debug)]
pub struct LabelResolver {
    strict: bool,
    class_labels: HashMap<String, BTreeSet<String>>,
    enum_prj_id: HashMap<u16, Option<String>>,
}

impl LabelResolver {
    /// Builds the resolver by closing the hint graph over the registry's
    /// canonical labels
    pub fn new(hints: &Hints, registry: &ClassRegistry) -> LabelResolver {
        let mut class_labels = hints.class_labels.clone();
        close_over(&mut class_labels, &|label| registry.contains(label));
        LabelResolver {
            strict: hints.strict,
            class_labels,
            enum_prj_id: hints.enum_prj_id.clone().unwrap_or_default(),
        }
    }

    /// Whether identifiers present in the table must resolve through it
    pub fn strict(&self) -> bool {
        self.strict
    }

    /// The canonical labels `key` may denote, when `key` is in the table
    pub fn candidates(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.class_labels.get(key)
    }

    /// Label override for an N64 numeric identity
    pub fn prj_label(&self, id: u16) -> Option<&str> {
        self.enum_prj_id.get(&id).and_then(|v| v.as_deref())
    }
}

/// One full closure pass cycle over the alias graph
///
/// Exposed within the crate so the idempotence property is directly
/// testable.
pub(crate) fn close_over(
    map: &mut HashMap<String, BTreeSet<String>>,
    is_canonical: &dyn Fn(&str) -> bool,
) {
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in &keys {
        if is_canonical(key) {
            map.get_mut(key).unwrap().insert(key.clone());
        }
    }

    loop {
        let mut changed = false;
        for key in &keys {
            let members: Vec<String> = map[key].iter().cloned().collect();
            for member in members {
                if !is_canonical(&member) {
                    map.get_mut(key).unwrap().remove(&member);
                }
                // the member may itself be an alias key; union its
                // candidates after following it once
                if let Some(next) = map.get(&member).cloned() {
                    let set = map.get_mut(key).unwrap();
                    for label in next {
                        changed |= set.insert(label);
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BznFormat;

    fn raw(entries: &[(&str, &[&str])]) -> HashMap<String, BTreeSet<String>> {
        entries
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn test_tsv_parsing() {
        let mut hints = Hints::new(true);
        hints.parse_class_labels("avtank\twingman\navtank\tturrettank\tcomment\nbad-line\n");
        let set = &hints.class_labels["avtank"];
        assert_eq!(set.len(), 2);
        assert!(set.contains("wingman") && set.contains("turrettank"));
    }

    #[test]
    fn test_flexible_u16_keys() {
        let mut hints = Hints::new(true);
        hints.parse_enum_prj_id("0x0010\twingman\n17\t\n0xzz\tskipped\n");
        let table = hints.enum_prj_id.as_ref().unwrap();
        assert_eq!(table[&0x10].as_deref(), Some("wingman"));
        assert_eq!(table[&17], None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_closure_follows_alias_chains() {
        // svtank is an alias for avtank which resolves to real labels
        let mut map = raw(&[
            ("svtank", &["avtank"]),
            ("avtank", &["wingman", "turrettank"]),
        ]);
        let canonical = |l: &str| l == "wingman" || l == "turrettank";
        close_over(&mut map, &canonical);

        let expected: BTreeSet<String> =
            ["wingman", "turrettank"].iter().map(|s| s.to_string()).collect();
        assert_eq!(map["svtank"], expected);
        assert_eq!(map["avtank"], expected);
    }

    #[test]
    fn test_closure_cycle_terminates() {
        let mut map = raw(&[("a", &["b", "wingman"]), ("b", &["a", "apc"])]);
        let canonical = |l: &str| l == "wingman" || l == "apc";
        close_over(&mut map, &canonical);

        let expected: BTreeSet<String> =
            ["wingman", "apc"].iter().map(|s| s.to_string()).collect();
        assert_eq!(map["a"], expected);
        assert_eq!(map["b"], expected);
    }

    #[test]
    fn test_closure_idempotent() {
        let mut map = raw(&[
            ("a", &["b", "wingman"]),
            ("b", &["c"]),
            ("c", &["apc", "a"]),
        ]);
        let canonical = |l: &str| l == "wingman" || l == "apc";
        close_over(&mut map, &canonical);
        let once = map.clone();
        close_over(&mut map, &canonical);
        assert_eq!(map, once);
    }

    #[test]
    fn test_canonical_key_includes_itself() {
        let registry = ClassRegistry::new(BznFormat::Battlezone).unwrap();
        let mut hints = Hints::new(true);
        hints.parse_class_labels("wingman\tapc\n");
        let resolver = LabelResolver::new(&hints, &registry);
        let set = resolver.candidates("wingman").unwrap();
        assert!(set.contains("wingman"));
        assert!(set.contains("apc"));
    }
}
