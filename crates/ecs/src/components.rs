use dreivy_common::MeshHandle;
use serde::{Deserialize, Serialize};

/// References CPU geometry by handle. An entity renders only when it also
/// carries a `Transform` and the handle is valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mesh {
    pub handle: MeshHandle,
}

impl Mesh {
    pub fn new(handle: MeshHandle) -> Self {
        Self { handle }
    }
}

/// Human-readable name component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
