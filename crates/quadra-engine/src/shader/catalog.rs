use std::collections::HashMap;
use std::fmt;

use crate::error::InitError;

/// Type marker identifying a vertex-stage source record.
pub const VERTEX_MARKER: &str = "x-shader/x-vertex";

/// Type marker identifying a fragment-stage source record.
pub const FRAGMENT_MARKER: &str = "x-shader/x-fragment";

/// Processing stage of the graphics pipeline a shader belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Returns the type marker string for this stage.
    pub fn marker(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_MARKER,
            ShaderStage::Fragment => FRAGMENT_MARKER,
        }
    }

    fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            VERTEX_MARKER => Some(ShaderStage::Vertex),
            FRAGMENT_MARKER => Some(ShaderStage::Fragment),
            _ => None,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// One child node of a source record.
///
/// Only `Text` nodes contribute to the shader source; `Other` nodes are
/// skipped during concatenation, not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceNode {
    Text(String),
    Other,
}

/// A shader source record: a type marker plus ordered child nodes.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    type_marker: String,
    nodes: Vec<SourceNode>,
}

impl ShaderSource {
    /// Creates a record with a single text node.
    pub fn new(type_marker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            type_marker: type_marker.into(),
            nodes: vec![SourceNode::Text(text.into())],
        }
    }

    /// Creates an empty record; populate it with [`push_text`](Self::push_text).
    pub fn with_marker(type_marker: impl Into<String>) -> Self {
        Self {
            type_marker: type_marker.into(),
            nodes: Vec::new(),
        }
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.nodes.push(SourceNode::Text(text.into()));
    }

    pub fn push_other(&mut self) {
        self.nodes.push(SourceNode::Other);
    }

    pub fn type_marker(&self) -> &str {
        &self.type_marker
    }

    /// Concatenates all text nodes, in order. Non-text nodes are ignored.
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            if let SourceNode::Text(text) = node {
                out.push_str(text);
            }
        }
        out
    }

    /// Determines the stage from the type marker.
    ///
    /// `id` is only used for the error payload.
    pub fn stage(&self, id: &str) -> Result<ShaderStage, InitError> {
        ShaderStage::from_marker(&self.type_marker).ok_or_else(|| InitError::UnknownShaderType {
            id: id.to_string(),
            marker: self.type_marker.clone(),
        })
    }
}

/// Registry of shader source records keyed by identifier.
///
/// The hosting side registers sources here before the controller is created,
/// the way a page embeds tagged script elements.
#[derive(Debug, Default)]
pub struct ShaderCatalog {
    entries: HashMap<String, ShaderSource>,
}

impl ShaderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record under `id`, replacing any previous one.
    pub fn insert(&mut self, id: impl Into<String>, source: ShaderSource) {
        self.entries.insert(id.into(), source);
    }

    pub fn get(&self, id: &str) -> Option<&ShaderSource> {
        self.entries.get(id)
    }

    /// Like [`get`](Self::get) but failing with [`InitError::ShaderSourceNotFound`].
    pub fn lookup(&self, id: &str) -> Result<&ShaderSource, InitError> {
        self.get(id).ok_or_else(|| InitError::ShaderSourceNotFound {
            id: id.to_string(),
        })
    }
}
