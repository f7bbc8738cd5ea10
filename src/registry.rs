use crate::{
    entity::{self, EntityCtx, GameObject},
    format::BznFormat,
    Error, ErrorKind, TokenStream,
};
use std::collections::HashMap;

/// Decodes one entity's class payload from a positioned stream
pub type EntityFactory = fn(&mut TokenStream, &EntityCtx) -> Result<GameObject, Error>;

struct Registration {
    label: &'static str,
    formats: &'static [BznFormat],
    factory: EntityFactory,
}

const BZ1: &[BznFormat] = &[BznFormat::Battlezone, BznFormat::BattlezoneN64];
const BZ2: &[BznFormat] = &[BznFormat::Battlezone2];
const ALL: &[BznFormat] = &[
    BznFormat::Battlezone,
    BznFormat::BattlezoneN64,
    BznFormat::Battlezone2,
];

/// The static catalogue of entity decoders
///
/// Each entry registers an explicit (label, formats, factory) tuple; the
/// registry construction is a pure filter over this table.
static REGISTRATIONS: &[Registration] = &[
    Registration {
        label: "wingman",
        formats: BZ1,
        factory: entity::decode_wingman,
    },
    Registration {
        label: "turrettank",
        formats: BZ1,
        factory: entity::decode_turrettank,
    },
    Registration {
        label: "apc",
        formats: BZ1,
        factory: entity::decode_apc,
    },
    Registration {
        label: "scavenger",
        formats: BZ1,
        factory: entity::decode_scavenger,
    },
    Registration {
        label: "building",
        formats: ALL,
        factory: entity::decode_building,
    },
    Registration {
        label: "person",
        formats: ALL,
        factory: entity::decode_person,
    },
    Registration {
        label: "powerup",
        formats: BZ1,
        factory: entity::decode_powerup,
    },
    Registration {
        label: "avtank",
        formats: BZ2,
        factory: entity::decode_avtank,
    },
    Registration {
        label: "scrap",
        formats: BZ2,
        factory: entity::decode_scrap,
    },
];

/// Class label to entity factory map for one format variant
///
/// Built once per session; immutable and shareable across sessions
/// afterwards. A label registered twice for the same variant is a
/// configuration error raised here, not at decode time.
pub struct ClassRegistry {
    format: BznFormat,
    factories: HashMap<&'static str, EntityFactory>,
}

impl ClassRegistry {
    /// Builds the registry for a format variant from the static catalogue
    pub fn new(format: BznFormat) -> Result<ClassRegistry, Error> {
        let mut factories = HashMap::new();
        for reg in REGISTRATIONS {
            if !reg.formats.contains(&format) {
                continue;
            }
            if factories.insert(reg.label, reg.factory).is_some() {
                return Err(ErrorKind::DuplicateClassLabel {
                    label: reg.label.to_string(),
                }
                .into());
            }
        }
        Ok(ClassRegistry { format, factories })
    }

    /// The variant this registry was filtered to
    pub fn format(&self) -> BznFormat {
        self.format
    }

    /// True when `label` has a factory registered for the active variant
    pub fn contains(&self, label: &str) -> bool {
        self.factories.contains_key(label)
    }

    pub(crate) fn factory(&self, label: &str) -> Option<EntityFactory> {
        self.factories.get(label).copied()
    }
}
