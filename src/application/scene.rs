//! Scene files: a named graph specification plus a start node.
//!
//! Scenes are TOML documents with either a `[levels]` table (level sizes and
//! children patterns) or a `[graph]` table (explicit nodes and adjacency).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::domain::{AdjacencySpec, Graph, GraphBuilder, Layout, LevelSpec, NodeId, Position};

/// The growing-tree walkthrough: 25 nodes on 4 levels.
pub const GROWING_TREE: &str = r#"
name = "growing-tree"
start = 0

[levels]
sizes = [1, 5, 8, 11]
children = [[5], [2, 2, 1, 3, 0], [2, 1, 4, 1, 1, 2]]
ranges = [0.0, 1.5, 2.0, 2.5]
"#;

/// Four nodes with a cycle through the start node.
pub const SMALL_CYCLE: &str = r#"
name = "small-cycle"
start = 0

[graph]
nodes = [0, 1, 2, 3]

[graph.adjacency]
0 = [1, 2]
1 = [0, 3]
2 = [0]
3 = [1]
"#;

const BUILTINS: &[(&str, &str)] = &[("growing-tree", GROWING_TREE), ("small-cycle", SMALL_CYCLE)];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScene {
    name: Option<String>,
    #[serde(default)]
    start: NodeId,
    levels: Option<LevelSpec>,
    graph: Option<RawGraph>,
}

/// TOML keys are strings, node ids are parsed afterwards.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGraph {
    nodes: Vec<NodeId>,
    #[serde(default)]
    adjacency: BTreeMap<String, Vec<NodeId>>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    positions: BTreeMap<String, Position>,
}

/// How a scene describes its graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneSource {
    Levels(LevelSpec),
    Graph(AdjacencySpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub start: NodeId,
    pub source: SceneSource,
}

impl Scene {
    /// Parse scene TOML. `path` names the scene in errors and supplies the
    /// default name (file stem).
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        let invalid = |message: String| ApplicationError::InvalidScene {
            path: path.to_path_buf(),
            message,
        };

        let raw: RawScene = toml::from_str(content).map_err(|e| invalid(e.to_string().trim().to_string()))?;

        let source = match (raw.levels, raw.graph) {
            (Some(levels), None) => SceneSource::Levels(levels),
            (None, Some(graph)) => SceneSource::Graph(graph.into_spec().map_err(invalid)?),
            (Some(_), Some(_)) => {
                return Err(invalid("both [levels] and [graph] given".to_string()))
            }
            (None, None) => return Err(invalid("missing [levels] or [graph]".to_string())),
        };

        let name = raw.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(Self {
            name,
            start: raw.start,
            source,
        })
    }

    /// Read and parse a scene file.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> ApplicationResult<Self> {
        let content = std::fs::read_to_string(path).with_path_context("read scene", path)?;
        Self::parse(&content, path)
    }

    /// Built-in scene by name.
    pub fn builtin(name: &str) -> ApplicationResult<Option<Self>> {
        BUILTINS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(builtin, content)| Self::parse(content, Path::new(builtin)))
            .transpose()
    }

    /// Build the scene's graph.
    pub fn build(&self, layout: Layout) -> ApplicationResult<Graph> {
        let builder = GraphBuilder::with_layout(layout);
        let graph = match &self.source {
            SceneSource::Levels(spec) => builder.from_levels(spec)?,
            SceneSource::Graph(spec) => builder.from_adjacency(spec)?,
        };
        Ok(graph)
    }
}

impl RawGraph {
    fn into_spec(self) -> Result<AdjacencySpec, String> {
        Ok(AdjacencySpec {
            nodes: self.nodes,
            adjacency: parse_keys(self.adjacency)?,
            labels: parse_keys(self.labels)?,
            positions: parse_keys(self.positions)?,
        })
    }
}

fn parse_keys<V>(table: BTreeMap<String, V>) -> Result<BTreeMap<NodeId, V>, String> {
    table
        .into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<NodeId>()
                .map(|id| (id, value))
                .map_err(|_| format!("node key is not a non-negative integer: {:?}", key))
        })
        .collect()
}

/// Where a listed scene comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOrigin {
    Builtin,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntry {
    pub name: String,
    pub origin: SceneOrigin,
}

/// Resolves scene arguments against built-ins and a scene directory.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    scene_dir: PathBuf,
}

impl SceneCatalog {
    pub fn new(scene_dir: impl Into<PathBuf>) -> Self {
        Self {
            scene_dir: scene_dir.into(),
        }
    }

    pub fn scene_dir(&self) -> &Path {
        &self.scene_dir
    }

    /// Resolve `arg` as an existing file, then a built-in name, then
    /// `<scene_dir>/<arg>.toml`.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, arg: &str) -> ApplicationResult<Scene> {
        let as_path = Path::new(arg);
        if as_path.is_file() {
            debug!("resolve: file {}", as_path.display());
            return Scene::load(as_path);
        }
        if let Some(scene) = Scene::builtin(arg)? {
            debug!("resolve: builtin {}", arg);
            return Ok(scene);
        }
        let in_dir = self.scene_dir.join(format!("{}.toml", arg));
        if in_dir.is_file() {
            debug!("resolve: scene dir {}", in_dir.display());
            return Scene::load(&in_dir);
        }
        Err(ApplicationError::SceneNotFound(arg.to_string()))
    }

    /// Built-in scenes followed by `*.toml` files below the scene directory.
    pub fn list(&self) -> ApplicationResult<Vec<SceneEntry>> {
        let mut entries: Vec<SceneEntry> = BUILTINS
            .iter()
            .map(|(name, _)| SceneEntry {
                name: name.to_string(),
                origin: SceneOrigin::Builtin,
            })
            .collect();

        if !self.scene_dir.is_dir() {
            return Ok(entries);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.scene_dir).sort_by_file_name() {
            let entry = entry.with_path_context("scan scene dir", &self.scene_dir)?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                let name = path
                    .strip_prefix(&self.scene_dir)
                    .unwrap_or(path)
                    .with_extension("")
                    .to_string_lossy()
                    .into_owned();
                files.push(SceneEntry {
                    name,
                    origin: SceneOrigin::File(path.to_path_buf()),
                });
            }
        }
        entries.extend(files);
        Ok(entries)
    }
}
