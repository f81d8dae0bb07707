// License: MIT
// Copyright © 2024 The wrrf-facility-graph Authors

//! This module contains the configuration options for reading and writing
//! facility documents.

/// The ID given to the root network when none is configured.
pub const DEFAULT_ROOT_ID: &str = "ParentNetwork";

/// Configuration options for [`parse`][crate::parse].
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// ID of the root composite node that wraps the document's top-level
    /// nodes and connections.
    pub root_id: String,

    /// Whether tags that omit `contents` may take them from their owner.  A
    /// connection always has a single contents type; a node only qualifies
    /// when its input and output contents are the same single type.
    pub infer_tag_contents: bool,

    /// Whether a tag whose contents can't be determined is an error.  When
    /// this is `false`, such tags are left as `ContentsType::Unspecified`.
    /// Tags of contentless types (e.g. `RunTime`) are never affected.
    pub strict_tag_contents: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            root_id: DEFAULT_ROOT_ID.to_string(),
            infer_tag_contents: true,
            strict_tag_contents: false,
        }
    }
}

/// Configuration options for [`serialize`][crate::serialize].
#[derive(Clone, Default, Debug)]
pub struct SerializerConfig {
    /// Whether to produce indented output.
    pub pretty: bool,
}
