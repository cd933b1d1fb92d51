// i3bar/swaybar protocol objects

use serde::Serialize;

/// Protocol header printed once before the frame array.
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub version: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self { version: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One block of a frame. Only `full_text` is mandatory on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub urgent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
}

impl Block {
    pub fn new(name: &str, full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}
