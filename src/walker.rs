use crate::{
    document::{AiPath, AreaOfInterest, Document, MissionInfo},
    entity::{EntityCtx, EntityDescriptor},
    events::EventSink,
    format::{BznFormat, SaveType},
    hints::LabelResolver,
    malform::{MalformationKind, MalformationLedger, MalformationRecord},
    registry::ClassRegistry,
    token::{FieldType, Token},
    Error, ErrorKind, TokenStream,
};
use std::collections::HashMap;

/// How the mission reference is laid out after the entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissionShape {
    /// `name` char, then the engine object pointer
    Bz1Name,

    /// Unvalidated short formatted as `BZn64Mission_XXXX`
    N64Id,

    /// The handful of BZ2 revisions that wrote `name` instead of `dllName`
    Bz2Name,

    /// `dllName` char
    Bz2DllName,

    /// Anonymous char marker (binary only) then `dllName` char
    Bz2SizedDll,
}

/// Tag flavor of a vestigial engine pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PtrShape {
    PtrTag,
    VoidTag,
}

/// Terrain name field layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerrainShape {
    Absent,
    Named(&'static str),
    /// Revision 1171 wrote either `g_TerrainName` or `TerrainName`
    EitherName,
}

/// The section catalogue for one (format, version) pair
///
/// Computed once up front so every version gate is visible in a single
/// table instead of being scattered through the decode.
#[derive(Debug, Clone, Copy)]
struct SectionPlan {
    version_token: bool,
    save_type_field: bool,
    bz1_sub_header: bool,
    bz2_sub_header: bool,
    redundant_save_type: bool,
    mission_save_field: bool,
    terrain: TerrainShape,
    start_time: bool,
    save_retry: bool,
    group_targets: bool,
    mission: MissionShape,
    s_object: Option<PtrShape>,
    undef_bool_probe: bool,
    unknown_size_block: bool,
    user_process_block: bool,
    aoi_ptr: Option<&'static str>,
    path_marker: bool,
    path_name_check: bool,
    path_old_ptr: Option<PtrShape>,
    path_s_object_probe: bool,
    n64_ids: bool,
    satellite: bool,
    ai_tasks: bool,
    pad_data: bool,
    pad_data2: bool,
    trailing_terrain: bool,
    tolerate_trailing_vec2d: bool,
}

impl SectionPlan {
    fn new(format: BznFormat, version: u32) -> SectionPlan {
        let bz1 = format == BznFormat::Battlezone;
        let bz2 = format == BznFormat::Battlezone2;
        let n64 = format == BznFormat::BattlezoneN64;
        let bz1_legacy = bz1 && matches!(version, 1001 | 1011 | 1012);

        SectionPlan {
            version_token: !n64,
            save_type_field: bz2 && version != 1041 && version != 1047,
            bz1_sub_header: bz1 && version > 1022,
            bz2_sub_header: bz2,
            redundant_save_type: bz2,
            mission_save_field: n64 || (bz1 && version >= 1016),
            terrain: match format {
                BznFormat::Battlezone if version == 1001 => TerrainShape::Absent,
                BznFormat::Battlezone | BznFormat::BattlezoneN64 => {
                    TerrainShape::Named("TerrainName")
                }
                BznFormat::Battlezone2 if version < 1171 => TerrainShape::Named("TerrainName"),
                BznFormat::Battlezone2 if version == 1171 => TerrainShape::EitherName,
                BznFormat::Battlezone2 => TerrainShape::Named("g_TerrainName"),
            },
            start_time: bz1 && matches!(version, 1011 | 1012),
            save_retry: bz1,
            group_targets: bz2 && version > 1165,
            mission: match format {
                BznFormat::Battlezone => MissionShape::Bz1Name,
                BznFormat::BattlezoneN64 => MissionShape::N64Id,
                BznFormat::Battlezone2 if matches!(version, 1100 | 1041 | 1047 | 1070) => {
                    MissionShape::Bz2Name
                }
                BznFormat::Battlezone2 if version < 1145 => MissionShape::Bz2DllName,
                BznFormat::Battlezone2 => MissionShape::Bz2SizedDll,
            },
            s_object: match format {
                BznFormat::Battlezone if version < 1002 => Some(PtrShape::VoidTag),
                BznFormat::Battlezone => Some(PtrShape::PtrTag),
                BznFormat::BattlezoneN64 => Some(PtrShape::VoidTag),
                BznFormat::Battlezone2 => None,
            },
            undef_bool_probe: bz1 && version == 1044,
            unknown_size_block: bz1_legacy,
            user_process_block: bz1 && matches!(version, 1011 | 1012),
            aoi_ptr: match format {
                BznFormat::Battlezone => Some("undefptr"),
                BznFormat::Battlezone2 => Some("path"),
                BznFormat::BattlezoneN64 => None,
            },
            path_marker: bz1,
            path_name_check: bz2,
            path_old_ptr: match format {
                BznFormat::BattlezoneN64 => Some(PtrShape::PtrTag),
                BznFormat::Battlezone if version >= 2016 => Some(PtrShape::PtrTag),
                BznFormat::Battlezone => Some(PtrShape::VoidTag),
                BznFormat::Battlezone2 => None,
            },
            path_s_object_probe: bz2,
            n64_ids: n64,
            satellite: bz2 && version >= 1125,
            ai_tasks: bz1_legacy,
            pad_data: bz2 && version >= 1115,
            pad_data2: bz2 && version >= 1119,
            trailing_terrain: bz1 && version == 1001,
            tolerate_trailing_vec2d: bz1,
        }
    }
}

/// Everything the body of the file yields past the header
#[derive(Default)]
struct Body {
    entities: Vec<EntityDescriptor>,
    mission: MissionInfo,
    aois: Vec<AreaOfInterest>,
    ai_paths: Vec<AiPath>,
    satellite_owners: Option<[i32; 3]>,
    legacy_terrain: Option<String>,
}

/// Drives the fixed section catalogue over a [`TokenStream`], producing a
/// [`Document`]
///
/// A walker decodes exactly one stream and is consumed by
/// [`decode`](FormatWalker::decode). The registry is required; a
/// [`LabelResolver`] and an [`EventSink`] are optional collaborators.
///
/// ```
/// use bzn::{ClassRegistry, FormatWalker, TokenStream};
///
/// let data = b"BZN1T\n\
/// version [long] = 1022\n\
/// seq_count [long] = 0\n\
/// missionSave [bool] = 1\n\
/// TerrainName [char] = \"canyon\"\n\
/// size [long] = 0\n\
/// name [char] = \"misn01\"\n\
/// sObject [ptr] = 00000000\n\
/// [AiMission]\n\
/// [AOIs]\n\
/// size [long] = 0\n\
/// [AiPaths]\n\
/// count [long] = 0\n";
///
/// let mut stream = TokenStream::new(data).unwrap();
/// let registry = ClassRegistry::new(stream.format()).unwrap();
/// let doc = FormatWalker::new(&registry).decode(&mut stream).unwrap();
/// assert_eq!(doc.version, 1022);
/// assert!(doc.entities.is_empty());
/// assert_eq!(doc.mission.name.as_deref(), Some("misn01"));
/// ```
pub struct FormatWalker<'r> {
    registry: &'r ClassRegistry,
    resolver: Option<&'r LabelResolver>,
    sink: Option<&'r mut dyn EventSink>,
    ledger: MalformationLedger,
    label_cache: HashMap<String, String>,
    seq_count: i32,
}

impl<'r> FormatWalker<'r> {
    pub fn new(registry: &'r ClassRegistry) -> FormatWalker<'r> {
        FormatWalker {
            registry,
            resolver: None,
            sink: None,
            ledger: MalformationLedger::new(),
            label_cache: HashMap::new(),
            seq_count: 0,
        }
    }

    /// Installs hint-driven class label resolution
    pub fn with_resolver(mut self, resolver: &'r LabelResolver) -> FormatWalker<'r> {
        self.resolver = Some(resolver);
        self
    }

    /// Installs an observation sink; decoding is identical without one
    pub fn with_sink(mut self, sink: &'r mut dyn EventSink) -> FormatWalker<'r> {
        self.sink = Some(sink);
        self
    }

    fn section(&mut self, name: &str) {
        if let Some(sink) = self.sink.as_mut() {
            sink.section_entered(name);
        }
    }

    fn record(&mut self, kind: MalformationKind, field: &str, detail: &str) {
        self.ledger.add(kind, field, detail);
        if let Some(sink) = self.sink.as_mut() {
            sink.malformation_recorded(&MalformationRecord {
                kind,
                field: field.to_string(),
                detail: detail.to_string(),
            });
        }
    }

    fn expect<'a>(
        &mut self,
        stream: &mut TokenStream<'a>,
        name: Option<&str>,
        expected: FieldType,
    ) -> Result<Token<'a>, Error> {
        let tok = stream.read_expected(name, expected)?;
        if let Some(sink) = self.sink.as_mut() {
            sink.field_read(&tok);
        }
        Ok(tok)
    }

    fn read_count(
        &mut self,
        stream: &mut TokenStream,
        name: &'static str,
    ) -> Result<i32, Error> {
        let tok = self.expect(stream, Some(name), FieldType::Long)?;
        let value = tok.get_i32()?;
        if value < 0 {
            return Err(ErrorKind::NegativeCount {
                field: name.to_string(),
                value,
                offset: tok.offset(),
            }
            .into());
        }
        Ok(value)
    }

    fn read_s_object(&mut self, stream: &mut TokenStream, shape: PtrShape) -> Result<u32, Error> {
        match shape {
            PtrShape::PtrTag => stream.read_legacy_ptr("sObject"),
            PtrShape::VoidTag => stream.read_legacy_ptr_deprecated("sObject"),
        }
    }

    /// Runs the catalogue over the stream
    pub fn decode(mut self, stream: &mut TokenStream) -> Result<Document, Error> {
        let format = stream.format();
        let version = stream.version();
        let plan = SectionPlan::new(format, version);

        self.section("Header");

        if plan.version_token {
            // first field of the stream; the name is not validated
            let tok = stream.read_token()?;
            tok.get_u32()?;
        }

        let mut save_type = SaveType::Mission;
        if plan.save_type_field {
            let tok = self.expect(stream, Some("saveType"), FieldType::Unknown)?;
            let raw = tok.get_u32()?;
            save_type = SaveType::from_value(raw).ok_or_else(|| {
                Error::new(ErrorKind::InvalidSaveType {
                    value: raw,
                    offset: tok.offset(),
                })
            })?;
        }

        let mut binary_save = None;
        let mut msn_filename = None;
        if plan.bz1_sub_header {
            let tok = self.expect(stream, Some("binarySave"), FieldType::Bool)?;
            binary_save = Some(tok.get_bool()?);
            let tok = self.expect(stream, Some("msn_filename"), FieldType::Char)?;
            msn_filename = nonempty(tok.get_str()?.into_owned());
        }
        if plan.bz2_sub_header {
            let tok = self.expect(stream, Some("binarySave"), FieldType::Bool)?;
            binary_save = Some(tok.get_bool()?);
            msn_filename = stream.read_sized_string("msn_filename", 16)?;
        }

        let tok = self.expect(stream, Some("seq_count"), FieldType::Long)?;
        self.seq_count = tok.get_i32()?;

        let mut redundant_save_type = None;
        if plan.redundant_save_type {
            let tok = self.expect(stream, Some("saveType"), FieldType::Long)?;
            redundant_save_type = Some(tok.get_i32()?);
        }

        if plan.mission_save_field {
            let tok = self.expect(stream, Some("missionSave"), FieldType::Bool)?;
            save_type = if tok.get_bool()? {
                SaveType::Mission
            } else {
                SaveType::Save
            };
        }

        let terrain_name = match plan.terrain {
            TerrainShape::Absent => None,
            TerrainShape::Named(name) => {
                let tok = self.expect(stream, Some(name), FieldType::Char)?;
                nonempty(tok.get_str()?.into_owned())
            }
            TerrainShape::EitherName => {
                let tok = stream.read_token()?;
                if !tok.validate(Some("g_TerrainName"), FieldType::Char)
                    && !tok.validate(Some("TerrainName"), FieldType::Char)
                {
                    return Err(ErrorKind::UnexpectedField {
                        field: "g_TerrainName".to_string(),
                        expected: FieldType::Char,
                        offset: tok.offset(),
                    }
                    .into());
                }
                nonempty(tok.get_str()?.into_owned())
            }
        };

        let mut start_time = None;
        if plan.start_time {
            let tok = self.expect(stream, Some("start_time"), FieldType::Float)?;
            start_time = Some(tok.get_f32()?);
        }

        let body = if plan.save_retry && save_type == SaveType::Save {
            // optimistic save-shaped decode; a mission file with a wrong
            // missionSave flag fails partway in and is retried from here
            stream.push_bookmark();
            self.ledger.push();
            let ctx = EntityCtx {
                format,
                version,
                save_type,
            };
            match self.read_body(stream, &plan, &ctx) {
                Ok(body) => {
                    stream.discard_bookmark();
                    self.ledger.pop();
                    body
                }
                Err(_) => {
                    self.ledger.discard();
                    stream.pop_bookmark();
                    save_type = SaveType::Mission;
                    self.label_cache.clear();
                    let ctx = EntityCtx {
                        format,
                        version,
                        save_type,
                    };
                    let body = self.read_body(stream, &plan, &ctx)?;
                    self.record(MalformationKind::Incorrect, "missionSave", "true");
                    body
                }
            }
        } else {
            let ctx = EntityCtx {
                format,
                version,
                save_type,
            };
            self.read_body(stream, &plan, &ctx)?
        };

        let (cr, lf, crlf) = stream.line_endings();
        if !(cr == lf && cr == crlf) {
            let detail = if cr == 0 && lf > 0 {
                "LF"
            } else if lf == 0 && cr > 0 {
                "CR"
            } else {
                "?"
            };
            self.record(MalformationKind::LineEnding, "line_ending", detail);
        }

        Ok(Document {
            format,
            version,
            save_type,
            binary_save,
            msn_filename,
            seq_count: self.seq_count,
            redundant_save_type,
            terrain_name,
            start_time,
            entities: body.entities,
            mission: body.mission,
            aois: body.aois,
            ai_paths: body.ai_paths,
            satellite_owners: body.satellite_owners,
            legacy_terrain: body.legacy_terrain,
            malformations: self.ledger.into_records(),
        })
    }

    fn read_body(
        &mut self,
        stream: &mut TokenStream,
        plan: &SectionPlan,
        ctx: &EntityCtx,
    ) -> Result<Body, Error> {
        let mut body = Body::default();

        self.section("GameObjects");
        let count = self.read_count(stream, "size")?;
        body.entities.reserve(count as usize);
        for i in 0..count {
            let remaining = count - i;
            let entity = self.decode_entity(stream, ctx, remaining)?;
            body.entities.push(entity);
        }

        self.tail_parse(stream, plan, ctx, &mut body)?;
        Ok(body)
    }

    fn decode_entity(
        &mut self,
        stream: &mut TokenStream,
        ctx: &EntityCtx,
        remaining: i32,
    ) -> Result<EntityDescriptor, Error> {
        if !stream.in_binary() {
            stream.read_marker("GameObject")?;
        }

        let (identifier, seq_no, offset) = if ctx.format == BznFormat::BattlezoneN64 {
            let tok = stream.read_expected(None, FieldType::Short)?;
            let id = tok.get_u16()?;
            let identifier = self
                .resolver
                .and_then(|r| r.prj_label(id))
                .map(str::to_string)
                .unwrap_or_else(|| format!("bzn64prj_{:04X}", id));
            // the file stores no per-entity sequence number; reconstruct it
            // from the header count and the table position
            let seq_no = (self.seq_count - remaining) as u32;
            (identifier, seq_no, tok.offset())
        } else {
            let tok = stream.read_expected(Some("PrjID"), FieldType::Char)?;
            let identifier = tok.get_str()?.into_owned();
            let offset = tok.offset();
            let seq_no = stream.read_legacy_ptr("seqno")?;
            (identifier, seq_no, offset)
        };

        let mut candidates = self.candidates_for(&identifier, offset)?;
        if let Some(hit) = self.label_cache.get(&identifier) {
            if let Some(idx) = candidates.iter().position(|c| c == hit) {
                let hit = candidates.remove(idx);
                candidates.insert(0, hit);
            }
        }

        let last = candidates.len() - 1;
        for (i, label) in candidates.iter().enumerate() {
            let factory = match self.registry.factory(label) {
                Some(factory) => factory,
                None => {
                    return Err(ErrorKind::UnknownClassLabel {
                        label: label.clone(),
                        offset,
                    }
                    .into())
                }
            };

            if i == last {
                // final candidate gets no rollback; its error is the
                // entity's error
                let object = factory(stream, ctx)?;
                self.label_cache.insert(identifier.clone(), label.clone());
                return Ok(EntityDescriptor {
                    seq_no,
                    class_identifier: identifier,
                    object,
                });
            }

            stream.push_bookmark();
            self.ledger.push();
            match factory(stream, ctx) {
                Ok(object) => {
                    stream.discard_bookmark();
                    self.ledger.pop();
                    self.label_cache.insert(identifier.clone(), label.clone());
                    return Ok(EntityDescriptor {
                        seq_no,
                        class_identifier: identifier,
                        object,
                    });
                }
                Err(_) => {
                    self.ledger.discard();
                    stream.pop_bookmark();
                }
            }
        }

        unreachable!("candidate list is never empty")
    }

    /// The ordered class labels to try for one identifier
    fn candidates_for(&self, identifier: &str, offset: usize) -> Result<Vec<String>, Error> {
        if let Some(resolver) = self.resolver {
            if resolver.strict() {
                if let Some(set) = resolver.candidates(identifier) {
                    if !set.is_empty() {
                        return Ok(set.iter().cloned().collect());
                    }
                }
            }
        }
        if self.registry.contains(identifier) {
            return Ok(vec![identifier.to_string()]);
        }
        if let Some(set) = self.resolver.and_then(|r| r.candidates(identifier)) {
            if !set.is_empty() {
                return Ok(set.iter().cloned().collect());
            }
        }
        Err(ErrorKind::UnknownClassLabel {
            label: identifier.to_string(),
            offset,
        }
        .into())
    }

    fn tail_parse(
        &mut self,
        stream: &mut TokenStream,
        plan: &SectionPlan,
        _ctx: &EntityCtx,
        body: &mut Body,
    ) -> Result<(), Error> {
        self.section("Mission");

        if plan.group_targets {
            self.expect(stream, Some("groupTargets"), FieldType::Void)?;
        }

        match plan.mission {
            MissionShape::Bz1Name => {
                let tok = self.expect(stream, Some("name"), FieldType::Char)?;
                body.mission.name = nonempty(tok.get_str()?.into_owned());
            }
            MissionShape::N64Id => {
                let tok = stream.read_token()?;
                body.mission.name = Some(format!("BZn64Mission_{:04X}", tok.get_u16()?));
            }
            MissionShape::Bz2Name => {
                let tok = self.expect(stream, Some("name"), FieldType::Char)?;
                body.mission.name = nonempty(tok.get_str()?.into_owned());
            }
            MissionShape::Bz2DllName => {
                let tok = self.expect(stream, Some("dllName"), FieldType::Char)?;
                body.mission.dll_name = nonempty(tok.get_str()?.into_owned());
            }
            MissionShape::Bz2SizedDll => {
                if stream.in_binary() {
                    self.expect(stream, None, FieldType::Char)?;
                }
                let tok = self.expect(stream, Some("dllName"), FieldType::Char)?;
                body.mission.dll_name = nonempty(tok.get_str()?.into_owned());
            }
        }

        if let Some(shape) = plan.s_object {
            self.read_s_object(stream, shape)?;
        }

        if plan.undef_bool_probe {
            // some revision 1044 files carry an extra bool here
            stream.push_bookmark();
            match stream.read_token() {
                Ok(tok) if tok.validate(Some("undefbool"), FieldType::Bool) => {
                    stream.discard_bookmark();
                }
                _ => stream.pop_bookmark(),
            }
        }

        self.section("AiMission");
        if !stream.in_binary() {
            stream.read_marker("AiMission")?;
        }

        if plan.unknown_size_block {
            // purpose unknown; consumed so the catalogue stays aligned
            self.expect(stream, Some("size"), FieldType::Long)?.get_i32()?;
        }

        if plan.user_process_block {
            self.section("UserProcess");
            self.expect(stream, Some("name"), FieldType::Char)?;
            if let Some(shape) = plan.s_object {
                self.read_s_object(stream, shape)?;
            }
            if !stream.in_binary() {
                stream.read_marker("UserProcess")?;
            }
            stream.read_legacy_ptr("undefptr")?;
            self.expect(stream, Some("cycle"), FieldType::Unknown)?;
            self.expect(stream, Some("cycleMax"), FieldType::Unknown)?;
            self.expect(stream, Some("selectList"), FieldType::Unknown)?;
            stream.read_legacy_ptr("undefptr")?;
            stream.read_legacy_ptr("undefptr")?;
            self.expect(stream, Some("exited"), FieldType::Unknown)?;
        }

        self.section("AOIs");
        if !stream.in_binary() {
            stream.read_marker("AOIs")?;
        }
        let count = self.read_count(stream, "size")?;
        for _ in 0..count {
            if !stream.in_binary() {
                stream.read_marker("AOI")?;
            }
            let path_ptr = match plan.aoi_ptr {
                Some(name) => Some(stream.read_legacy_ptr(name)?),
                None => None,
            };
            let team = self.expect(stream, Some("team"), FieldType::Long)?.get_i32()?;
            let interesting = self
                .expect(stream, Some("interesting"), FieldType::Bool)?
                .get_bool()?;
            let inside = self.expect(stream, Some("inside"), FieldType::Bool)?.get_bool()?;
            let value = self.expect(stream, Some("value"), FieldType::Long)?.get_i32()?;
            let force = self.expect(stream, Some("force"), FieldType::Long)?.get_i32()?;
            body.aois.push(AreaOfInterest {
                path_ptr,
                team,
                interesting,
                inside,
                value,
                force,
            });
        }

        self.section("AiPaths");
        if !stream.in_binary() {
            stream.read_marker("AiPaths")?;
        }
        let count = self.read_count(stream, "count")?;
        for _ in 0..count {
            body.ai_paths.push(self.decode_path(stream, plan)?);
        }

        if plan.satellite {
            self.section("SatellitePanel");
            self.decode_satellite(stream, body)?;
        }

        if plan.ai_tasks {
            self.section("AiTasks");
            if !stream.in_binary() {
                stream.read_marker("AiTasks")?;
            }
            // entries are not understood; only the count is consumed
            self.read_count(stream, "count")?;
        }

        if plan.pad_data {
            self.expect(stream, Some("PadData"), FieldType::Void)?;
            if plan.pad_data2 {
                self.expect(stream, Some("PadData2"), FieldType::Void)?;
            }
        }

        if plan.trailing_terrain {
            if !stream.in_binary() {
                stream.read_marker("Terrain")?;
            }
            let tok = self.expect(stream, Some("Name"), FieldType::Unknown)?;
            body.legacy_terrain = nonempty(tok.get_str()?.into_owned());
        }

        if !stream.is_eof() && plan.tolerate_trailing_vec2d {
            // some legacy files end with a stray zero point
            let offset = stream.position();
            let tok = stream.read_token()?;
            if !tok.validate(None, FieldType::Vec2d) {
                return Err(ErrorKind::TrailingData { offset }.into());
            }
            let point = tok.get_vector2d(0)?;
            if point.x != 0.0 || point.z != 0.0 {
                return Err(ErrorKind::TrailingData { offset }.into());
            }
        }
        if !stream.is_eof() {
            return Err(ErrorKind::TrailingData {
                offset: stream.position(),
            }
            .into());
        }

        Ok(())
    }

    fn decode_path(
        &mut self,
        stream: &mut TokenStream,
        plan: &SectionPlan,
    ) -> Result<AiPath, Error> {
        if plan.path_marker && !stream.in_binary() {
            stream.read_marker("AiPath")?;
        }
        if plan.path_name_check {
            let name = stream.read_sized_string("name", 40)?;
            if name.as_deref() != Some("AiPath") {
                return Err(ErrorKind::InvalidValue {
                    field: "name".to_string(),
                    expected: "AiPath",
                    offset: stream.position(),
                }
                .into());
            }
        }

        match plan.path_old_ptr {
            Some(PtrShape::PtrTag) => {
                stream.read_legacy_ptr("old_ptr")?;
            }
            Some(PtrShape::VoidTag) => {
                stream.read_legacy_ptr_deprecated("old_ptr")?;
            }
            None => {}
        }
        if plan.path_s_object_probe {
            stream.push_bookmark();
            match stream.read_token() {
                Ok(tok) if tok.validate(Some("sObject"), FieldType::Ptr) => {
                    stream.discard_bookmark();
                }
                _ => stream.pop_bookmark(),
            }
        }

        let label = if plan.n64_ids {
            let tok = stream.read_token()?;
            Some(format!("bzn64path_{:04X}", tok.get_u16()?))
        } else {
            let size = self.expect(stream, Some("size"), FieldType::Long)?.get_i32()?;
            if size > 0 {
                let tok = self.expect(stream, Some("label"), FieldType::Char)?;
                let mut label = tok.get_str()?.into_owned();
                if label.len() > size as usize {
                    label.truncate(size as usize);
                }
                Some(label)
            } else {
                None
            }
        };

        let point_count = self.read_count(stream, "pointCount")?;
        let tok = self.expect(stream, Some("points"), FieldType::Vec2d)?;
        let mut points = Vec::with_capacity(point_count as usize);
        for j in 0..point_count {
            points.push(tok.get_vector2d(j as usize)?);
        }
        self.expect(stream, Some("pathType"), FieldType::Void)?;

        Ok(AiPath { label, points })
    }

    fn decode_satellite(
        &mut self,
        stream: &mut TokenStream,
        body: &mut Body,
    ) -> Result<(), Error> {
        stream.push_bookmark();
        let tok = match stream.read_token() {
            Ok(tok) => tok,
            Err(err) => {
                stream.discard_bookmark();
                return Err(err);
            }
        };
        if tok.validate(Some("hasEntered"), FieldType::Bool) {
            stream.discard_bookmark();
            tok.get_bool()?;
            let mut owners = [0i32; 3];
            for slot in owners.iter_mut() {
                *slot = self
                    .expect(stream, Some("ownerObj"), FieldType::Long)?
                    .get_i32()?;
            }
            body.satellite_owners = Some(owners);
            Ok(())
        } else if tok.validate(Some("PadData"), FieldType::Void) {
            // satellite block absent; the pad belongs to the next section
            stream.pop_bookmark();
            Ok(())
        } else {
            stream.discard_bookmark();
            Err(ErrorKind::UnexpectedField {
                field: "hasEntered".to_string(),
                expected: FieldType::Bool,
                offset: tok.offset(),
            }
            .into())
        }
    }
}

fn nonempty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
