//! Tests for scene files and the scene catalog

use std::path::PathBuf;

use tempfile::TempDir;

use bfsviz::application::scene::{SceneCatalog, SceneOrigin, SceneSource};
use bfsviz::application::services::WalkthroughService;
use bfsviz::application::ApplicationError;
use bfsviz::config::Settings;
use bfsviz::domain::{DomainError, Layout};

fn create_scene(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write scene file");
    path
}

#[test]
fn given_scene_path_when_resolving_then_loads_file_before_builtin() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_scene(
        &temp,
        "growing-tree",
        r#"
[levels]
sizes = [1, 1]
children = [[1]]
"#,
    );
    let catalog = SceneCatalog::new(temp.path().join("unused"));

    // Act
    let scene = catalog.resolve(path.to_str().unwrap()).unwrap();

    // Assert
    assert_eq!(scene.build(Layout::default()).unwrap().node_count(), 2);
}

#[test]
fn given_builtin_name_when_resolving_then_beats_scene_dir() {
    let temp = TempDir::new().unwrap();
    create_scene(&temp, "small-cycle.toml", "[graph]\nnodes = [0]\n");
    let catalog = SceneCatalog::new(temp.path());

    let scene = catalog.resolve("small-cycle").unwrap();

    assert!(matches!(scene.source, SceneSource::Graph(ref spec) if spec.nodes.len() == 4));
}

#[test]
fn given_nested_scene_dir_when_listing_then_names_are_relative() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("trees")).unwrap();
    create_scene(&temp, "trees/wide.toml", "[graph]\nnodes = [0]\n");
    let catalog = SceneCatalog::new(temp.path());

    let entries = catalog.list().unwrap();

    let wide = entries.iter().find(|e| e.name == "trees/wide").unwrap();
    assert_eq!(wide.origin, SceneOrigin::File(temp.path().join("trees/wide.toml")));
}

#[test]
fn given_scene_with_bad_pattern_when_walking_then_domain_error_before_events() {
    // Arrange
    let temp = TempDir::new().unwrap();
    create_scene(
        &temp,
        "broken.toml",
        r#"
[levels]
sizes = [1, 2]
children = [[1, 2]]
"#,
    );
    let service = WalkthroughService::new(Settings {
        scene_dir: temp.path().to_path_buf(),
        ..Default::default()
    });

    // Act
    let result = service.walk("broken", None);

    // Assert
    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::PatternMismatch { level: 0, .. }))
    ));
}

#[test]
fn given_unknown_field_when_loading_then_invalid_scene_names_file() {
    let temp = TempDir::new().unwrap();
    let path = create_scene(&temp, "typo.toml", "strat = 1\n[graph]\nnodes = [0]\n");
    let catalog = SceneCatalog::new(temp.path());

    let err = catalog.resolve(path.to_str().unwrap()).unwrap_err();

    assert!(matches!(err, ApplicationError::InvalidScene { .. }));
    assert!(err.to_string().contains("typo.toml"), "{}", err);
}

#[test]
fn given_graph_scene_with_dangling_edge_when_building_then_errors() {
    let temp = TempDir::new().unwrap();
    create_scene(
        &temp,
        "dangling.toml",
        r#"
[graph]
nodes = [0, 1]

[graph.adjacency]
0 = [1, 2]
"#,
    );
    let service = WalkthroughService::new(Settings {
        scene_dir: temp.path().to_path_buf(),
        ..Default::default()
    });

    let result = service.load("dangling");

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DanglingEdge { from: 0, to: 2 }))
    ));
}
