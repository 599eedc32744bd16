//! Shared texture record.
//!
//! Decoding and upload are the asset provider's and backend's business; the
//! core only tracks identity and dimensions. Textures are shared between
//! materials via `Arc<Texture>`.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Texture {
    pub uuid: Uuid,
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: None,
            width,
            height,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
