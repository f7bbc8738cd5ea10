use crate::{
    entity::EntityDescriptor,
    format::{BznFormat, SaveType},
    malform::MalformationRecord,
    token::Vector2D,
};

/// Mission identity fields, filled per format and version
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MissionInfo {
    /// Mission name, or the synthesized `BZn64Mission_XXXX` identity
    pub name: Option<String>,

    /// Script dll name, later revisions only
    pub dll_name: Option<String>,
}

/// One area of interest entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AreaOfInterest {
    /// Vestigial path pointer; absent on N64
    pub path_ptr: Option<u32>,
    pub team: i32,
    pub interesting: bool,
    pub inside: bool,
    pub value: i32,
    pub force: i32,
}

/// One named path with its ordered waypoints
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AiPath {
    /// Path label, or the synthesized `bzn64path_XXXX` identity
    pub label: Option<String>,
    pub points: Vec<Vector2D>,
}

/// The fully decoded contents of one file
///
/// Produced by [`FormatWalker::decode`](crate::FormatWalker::decode).
/// Fields that only exist in some formats or version ranges are `Option`;
/// `None` means the field was absent from the file, not that it was empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Which format variant the file decoded as
    pub format: BznFormat,

    /// The file's self-declared version
    pub version: u32,

    /// Final classification, after any speculative correction
    pub save_type: SaveType,

    /// Whether the file declared itself binary, where the field exists
    pub binary_save: Option<bool>,

    /// Embedded source filename, where the field exists
    pub msn_filename: Option<String>,

    /// Sequence counter carried in the header; the entity table declares
    /// its own size separately
    pub seq_count: i32,

    /// Second copy of the save type, consumed and retained uninterpreted
    pub redundant_save_type: Option<i32>,

    /// Terrain name, where the field exists
    pub terrain_name: Option<String>,

    /// Elapsed mission time, where the field exists
    pub start_time: Option<f32>,

    /// All decoded entities, in file order
    pub entities: Vec<EntityDescriptor>,

    /// Mission identity fields
    pub mission: MissionInfo,

    /// Areas of interest, in file order
    pub aois: Vec<AreaOfInterest>,

    /// Named paths, in file order
    pub ai_paths: Vec<AiPath>,

    /// Satellite owner entries, when the optional trailer was present
    pub satellite_owners: Option<[i32; 3]>,

    /// Trailing terrain name from the oldest revision's footer
    pub legacy_terrain: Option<String>,

    /// Every non-fatal anomaly recorded during the decode
    pub malformations: Vec<MalformationRecord>,
}
