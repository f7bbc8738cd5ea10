use crate::{
    format::{BznFormat, SaveType},
    token::{FieldType, Vector2D},
    Error, TokenStream,
};

/// Context handed to entity factories
///
/// Per-class layouts depend on how the file is classified: save layouts
/// append runtime state after the mission-definition fields.
#[derive(Debug, Clone, Copy)]
pub struct EntityCtx {
    pub format: BznFormat,
    pub version: u32,
    pub save_type: SaveType,
}

impl EntityCtx {
    /// True when entities carry runtime state fields
    pub fn save_shaped(&self) -> bool {
        matches!(
            self.save_type,
            SaveType::Save | SaveType::Join | SaveType::Lockstep
        )
    }
}

/// One decoded entity table entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntityDescriptor {
    /// Sequence number, stored in the file or reconstructed for N64
    pub seq_no: u32,

    /// The class identifier exactly as it appeared in the file
    pub class_identifier: String,

    /// The decoded entity
    pub object: GameObject,
}

/// The decoded per-class state of an entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GameObject {
    Craft(Craft),
    Building(Building),
    Person(Person),
    Powerup(Powerup),
    Scrap(Scrap),
}

impl GameObject {
    /// The canonical class label the entity decoded as
    pub fn class_label(&self) -> &'static str {
        match self {
            GameObject::Craft(c) => c.label,
            GameObject::Building(b) => b.label,
            GameObject::Person(p) => p.label,
            GameObject::Powerup(p) => p.label,
            GameObject::Scrap(s) => s.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Craft {
    pub label: &'static str,
    pub pos: Vector2D,
    pub team: i32,
    pub name: Option<String>,
    pub health: Option<i32>,
    pub ammo: Option<i32>,
    /// Turret aim, present only on turret classes
    pub aim: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Building {
    pub label: &'static str,
    pub pos: Vector2D,
    pub team: i32,
    pub door: i32,
    pub health: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Person {
    pub label: &'static str,
    pub pos: Vector2D,
    pub team: i32,
    pub stance: i32,
    pub health: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Powerup {
    pub label: &'static str,
    pub pos: Vector2D,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Scrap {
    pub label: &'static str,
    pub pos: Vector2D,
    pub value: i32,
}

fn read_pos(stream: &mut TokenStream) -> Result<Vector2D, Error> {
    let tok = stream.read_expected(Some("pos"), FieldType::Vec2d)?;
    tok.get_vector2d(0)
}

fn read_i32(stream: &mut TokenStream, name: &str) -> Result<i32, Error> {
    let tok = stream.read_expected(Some(name), FieldType::Long)?;
    tok.get_i32()
}

fn craft_base(
    stream: &mut TokenStream,
    ctx: &EntityCtx,
    label: &'static str,
) -> Result<Craft, Error> {
    let pos = read_pos(stream)?;
    let team = read_i32(stream, "team")?;
    let name = stream
        .read_expected(Some("name"), FieldType::Char)?
        .get_str()?
        .into_owned();
    let name = if name.is_empty() { None } else { Some(name) };
    let (health, ammo) = if ctx.save_shaped() {
        (
            Some(read_i32(stream, "health")?),
            Some(read_i32(stream, "ammo")?),
        )
    } else {
        (None, None)
    };
    Ok(Craft {
        label,
        pos,
        team,
        name,
        health,
        ammo,
        aim: None,
    })
}

macro_rules! craft_fn {
    ($fn_name:ident, $label:literal) => {
        pub(crate) fn $fn_name(
            stream: &mut TokenStream,
            ctx: &EntityCtx,
        ) -> Result<GameObject, Error> {
            craft_base(stream, ctx, $label).map(GameObject::Craft)
        }
    };
}

craft_fn!(decode_wingman, "wingman");
craft_fn!(decode_apc, "apc");
craft_fn!(decode_scavenger, "scavenger");
craft_fn!(decode_avtank, "avtank");

pub(crate) fn decode_turrettank(
    stream: &mut TokenStream,
    ctx: &EntityCtx,
) -> Result<GameObject, Error> {
    let mut craft = craft_base(stream, ctx, "turrettank")?;
    let tok = stream.read_expected(Some("aim"), FieldType::Float)?;
    craft.aim = Some(tok.get_f32()?);
    Ok(GameObject::Craft(craft))
}

pub(crate) fn decode_building(
    stream: &mut TokenStream,
    ctx: &EntityCtx,
) -> Result<GameObject, Error> {
    let pos = read_pos(stream)?;
    let team = read_i32(stream, "team")?;
    let door = read_i32(stream, "door")?;
    let health = if ctx.save_shaped() {
        Some(read_i32(stream, "health")?)
    } else {
        None
    };
    Ok(GameObject::Building(Building {
        label: "building",
        pos,
        team,
        door,
        health,
    }))
}

pub(crate) fn decode_person(
    stream: &mut TokenStream,
    ctx: &EntityCtx,
) -> Result<GameObject, Error> {
    let pos = read_pos(stream)?;
    let team = read_i32(stream, "team")?;
    let stance = read_i32(stream, "stance")?;
    let health = if ctx.save_shaped() {
        Some(read_i32(stream, "health")?)
    } else {
        None
    };
    Ok(GameObject::Person(Person {
        label: "person",
        pos,
        team,
        stance,
        health,
    }))
}

pub(crate) fn decode_powerup(
    stream: &mut TokenStream,
    _ctx: &EntityCtx,
) -> Result<GameObject, Error> {
    let pos = read_pos(stream)?;
    let value = read_i32(stream, "value")?;
    Ok(GameObject::Powerup(Powerup {
        label: "powerup",
        pos,
        value,
    }))
}

pub(crate) fn decode_scrap(
    stream: &mut TokenStream,
    _ctx: &EntityCtx,
) -> Result<GameObject, Error> {
    let pos = read_pos(stream)?;
    let value = read_i32(stream, "value")?;
    Ok(GameObject::Scrap(Scrap {
        label: "scrap",
        pos,
        value,
    }))
}
