use controls::OrbitConfig;
use layers::{LabelColor, LabelConfig, LabelKind};
use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// Immutable viewer configuration, passed by reference at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub orbit: OrbitConfig,
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewerManifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub config: ViewerConfig,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub labels: Vec<LabelEntry>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeEntryKind {
    Group,
    Mesh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeEntry {
    pub id: String,
    pub kind: NodeEntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotation_y_deg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f64; 3]>,
    /// Local bounding box size of a mesh, centered on its origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelEntry {
    pub target: String,
    pub text: String,
    #[serde(default)]
    pub color: LabelColor,
    #[serde(default)]
    pub kind: LabelKind,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

impl ViewerManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            name: Some(name.into()),
            config: ViewerConfig::default(),
            nodes: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn group(mut self, id: &str, parent: Option<&str>, position: [f64; 3]) -> Self {
        self.nodes.push(NodeEntry {
            id: id.to_string(),
            kind: NodeEntryKind::Group,
            parent: parent.map(str::to_string),
            position,
            rotation_y_deg: 0.0,
            scale: None,
            size: None,
        });
        self
    }

    pub fn mesh(mut self, id: &str, parent: Option<&str>, position: [f64; 3], size: [f64; 3]) -> Self {
        self.nodes.push(NodeEntry {
            id: id.to_string(),
            kind: NodeEntryKind::Mesh,
            parent: parent.map(str::to_string),
            position,
            rotation_y_deg: 0.0,
            scale: None,
            size: Some(size),
        });
        self
    }

    pub fn label(mut self, target: &str, text: &str, color: LabelColor) -> Self {
        self.labels.push(LabelEntry {
            target: target.to_string(),
            text: text.to_string(),
            color,
            kind: LabelKind::Standard,
        });
        self
    }
}
