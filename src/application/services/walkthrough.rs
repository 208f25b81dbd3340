//! Walkthrough service
//!
//! Resolves a scene, builds its graph and runs the instrumented traversal.

use std::ops::ControlFlow;

use tracing::{debug, info, instrument};

use crate::application::scene::{Scene, SceneCatalog, SceneEntry};
use crate::application::storyboard::Storyboard;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{drive, run, BfsTree, Event, Graph, NodeId, Outcome, Traversal};

/// A scene with its built graph and a completed traversal.
#[derive(Debug, Clone)]
pub struct Walkthrough {
    pub scene: Scene,
    pub graph: Graph,
    pub traversal: Traversal,
}

impl Walkthrough {
    /// Paced frames for the whole event log.
    pub fn storyboard(&self, settings: &Settings) -> Storyboard<'_> {
        Storyboard::from_events(&self.graph, settings.pacing, &self.traversal.events)
    }

    /// Spanning tree of the traversal.
    pub fn tree(&self) -> BfsTree {
        BfsTree::from_events(&self.traversal.events)
    }
}

/// Service tying scenes, graph construction and traversal together.
pub struct WalkthroughService {
    settings: Settings,
    catalog: SceneCatalog,
}

impl WalkthroughService {
    pub fn new(settings: Settings) -> Self {
        let catalog = SceneCatalog::new(settings.scene_dir.clone());
        Self { settings, catalog }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve `scene` and build its graph.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, scene: &str) -> ApplicationResult<(Scene, Graph)> {
        let scene = self.catalog.resolve(scene)?;
        let graph = scene.build(self.settings.layout)?;
        debug!(
            "load: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok((scene, graph))
    }

    /// Run the traversal of `scene`, from `start` or the scene's start node.
    #[instrument(level = "debug", skip(self))]
    pub fn walk(&self, scene: &str, start: Option<NodeId>) -> ApplicationResult<Walkthrough> {
        let (scene, graph) = self.load(scene)?;
        let start = start.unwrap_or(scene.start);
        let traversal = run(&graph, start)?;
        info!(
            "walk: scene={} start={} events={}",
            scene.name,
            start,
            traversal.events.len()
        );
        Ok(Walkthrough {
            scene,
            graph,
            traversal,
        })
    }

    /// Push events of `scene` to `on_event` while it keeps returning `Continue`.
    #[instrument(level = "debug", skip(self, on_event))]
    pub fn stream<F>(
        &self,
        scene: &str,
        start: Option<NodeId>,
        mut on_event: F,
    ) -> ApplicationResult<Outcome>
    where
        F: FnMut(&Graph, &Event) -> ControlFlow<()>,
    {
        let (scene, graph) = self.load(scene)?;
        let start = start.unwrap_or(scene.start);
        let mut sink = |event: &Event| on_event(&graph, event);
        let outcome = drive(&graph, start, &mut sink)?;
        debug!("stream: {:?}", outcome);
        Ok(outcome)
    }

    /// Built-in and scene-directory scenes.
    pub fn scenes(&self) -> ApplicationResult<Vec<SceneEntry>> {
        self.catalog.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::DomainError;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> WalkthroughService {
        WalkthroughService::new(Settings {
            scene_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
    }

    #[test]
    fn given_builtin_when_walking_then_discovers_all_nodes() {
        let dir = TempDir::new().unwrap();

        let walkthrough = service(&dir).walk("growing-tree", None).unwrap();

        assert_eq!(walkthrough.traversal.discoveries().len(), 25);
        assert_eq!(walkthrough.tree().len(), 25);
        assert_eq!(walkthrough.tree().depth(), 4);
    }

    #[test]
    fn given_start_override_when_walking_then_uses_it() {
        let dir = TempDir::new().unwrap();

        let walkthrough = service(&dir).walk("small-cycle", Some(3)).unwrap();

        assert_eq!(walkthrough.traversal.activation_order(), vec![3, 1, 0, 2]);
    }

    #[test]
    fn given_unknown_start_when_walking_then_domain_error() {
        let dir = TempDir::new().unwrap();

        let result = service(&dir).walk("small-cycle", Some(99));

        assert!(matches!(
            result,
            Err(ApplicationError::Domain(DomainError::UnknownStartNode(99)))
        ));
    }

    #[test]
    fn given_breaking_consumer_when_streaming_then_abandoned() {
        let dir = TempDir::new().unwrap();
        let mut labels = Vec::new();

        let outcome = service(&dir)
            .stream("small-cycle", None, |graph, event| match event {
                Event::NodeActivated { node } => {
                    labels.push(graph.label(*node));
                    ControlFlow::Break(())
                }
                _ => ControlFlow::Continue(()),
            })
            .unwrap();

        assert_eq!(outcome, Outcome::Abandoned { emitted: 3 });
        assert_eq!(labels, vec!["A".to_string()]);
    }
}
