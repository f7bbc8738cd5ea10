/*!

A low level decoder for [Battlezone](https://en.wikipedia.org/wiki/Battlezone_(1998_video_game))
`.bzn` mission and save files, covering the 1998 release, Battlezone II, and
the Nintendo 64 port from a single structural walk.

## Features

- ✔ Versatile: handles the text and binary sub-modes of all three variants
- ✔ Resilient: tolerated damage is recorded instead of aborting the decode
- ✔ Self-correcting: a wrong `missionSave` flag is detected, rolled back, and
  re-decoded with the corrected classification
- ✔ Hintable: ambiguous class identifiers resolve through caller supplied
  alias tables

## Quick Start

```rust
use bzn::{ClassRegistry, FormatWalker, GameObject, SaveType, TokenStream};

let data = b"BZN1T\n\
version [long] = 1022\n\
seq_count [long] = 1\n\
missionSave [bool] = 1\n\
TerrainName [char] = \"canyon\"\n\
size [long] = 1\n\
[GameObject]\n\
PrjID [char] = \"wingman\"\n\
seqno [ptr] = 00000001\n\
pos [vec2d] = 10.0 -4.5\n\
team [long] = 1\n\
name [char] = \"alpha\"\n\
name [char] = \"misn01\"\n\
sObject [ptr] = 00000000\n\
[AiMission]\n\
[AOIs]\n\
size [long] = 0\n\
[AiPaths]\n\
count [long] = 0\n";

let mut stream = TokenStream::new(data)?;
let registry = ClassRegistry::new(stream.format())?;
let doc = FormatWalker::new(&registry).decode(&mut stream)?;

assert_eq!(doc.save_type, SaveType::Mission);
assert_eq!(doc.terrain_name.as_deref(), Some("canyon"));
assert_eq!(doc.entities.len(), 1);
match &doc.entities[0].object {
    GameObject::Craft(craft) => assert_eq!(craft.name.as_deref(), Some("alpha")),
    other => panic!("unexpected class: {:?}", other),
}
# Ok::<(), bzn::Error>(())
```

## Architecture

Decoding is split into layers. [`TokenStream`] classifies the file from its
leading bytes and yields [`Token`]s regardless of the physical encoding.
[`FormatWalker`] drives the fixed section catalogue for the detected format
and version, dispatching entity payloads through a [`ClassRegistry`] of
per-class factories, optionally disambiguated by a [`LabelResolver`] built
from [`Hints`]. The result is a [`Document`] carrying the decoded state plus
a [`MalformationRecord`] list of every tolerated anomaly.

Real files lie. The walker leans on two transactional primitives when it has
to guess: stream bookmarks (cursor snapshots with rollback) and ledger scopes
(malformation records that vanish with an abandoned branch). Both are also
available to callers building their own speculative reads.

*/

mod document;
mod entity;
mod errors;
mod events;
mod format;
mod hints;
mod malform;
mod registry;
mod stream;
mod token;
mod util;
mod walker;

pub use crate::document::{AiPath, AreaOfInterest, Document, MissionInfo};
pub use crate::entity::{
    Building, Craft, EntityCtx, EntityDescriptor, GameObject, Person, Powerup, Scrap,
};
pub use crate::errors::{Error, ErrorKind};
pub use crate::events::{EventSink, SectionTrace};
pub use crate::format::{BznFormat, Framing, SaveType};
pub use crate::hints::{Hints, LabelResolver};
pub use crate::malform::{MalformationKind, MalformationLedger, MalformationRecord};
pub use crate::registry::{ClassRegistry, EntityFactory};
pub use crate::stream::TokenStream;
pub use crate::token::{FieldType, Token, Vector2D};
pub use crate::walker::FormatWalker;
