//! Command dispatch and implementations

use std::io::{self, Write};
use std::ops::ControlFlow;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::scene::SceneOrigin;
use crate::application::services::WalkthroughService;
use crate::application::storyboard::{pseudocode_line, FrameKind, PSEUDOCODE};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{Event, Graph, NodeId, Outcome};

/// Execute the parsed command.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        None if cli.info => Ok(()),
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
        Some(Commands::Events {
            scene,
            start,
            json,
            limit,
        }) => cmd_events(&service()?, scene, *start, *json, *limit),
        Some(Commands::Play { scene, start }) => cmd_play(&service()?, scene, *start),
        Some(Commands::Tree { scene, start }) => cmd_tree(&service()?, scene, *start),
        Some(Commands::Graph { scene }) => cmd_graph(&service()?, scene),
        Some(Commands::Scenes) => cmd_scenes(&service()?),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
    }
}

fn service() -> CliResult<WalkthroughService> {
    Ok(WalkthroughService::new(Settings::load()?))
}

/// One-line event text using node labels.
pub fn describe(graph: &Graph, event: &Event) -> String {
    match event {
        Event::NodeDiscovered { node, distance } => {
            format!("discovered {} (d={})", graph.label(*node), distance)
        }
        Event::NodeActivated { node } => format!("activated {}", graph.label(*node)),
        Event::EdgeAdded { from, to } => {
            format!("edge {} -> {}", graph.label(*from), graph.label(*to))
        }
        Event::QueueChanged { queue } => format!("queue [{}]", labels(graph, queue)),
        Event::TraversalComplete => "complete".to_string(),
    }
}

fn labels(graph: &Graph, ids: &[NodeId]) -> String {
    ids.iter().map(|&id| graph.label(id)).join(", ")
}

#[instrument(level = "debug", skip(service))]
fn cmd_events(
    service: &WalkthroughService,
    scene: &str,
    start: Option<NodeId>,
    json: bool,
    limit: Option<usize>,
) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = write_events(service, scene, start, json, limit, &mut out)?;
    out.flush()?;
    debug!("cmd_events: {:?}", outcome);
    Ok(())
}

/// Write the event log of `scene` to `out`, one line per event.
///
/// Lines are JSON objects with `json`, labelled text otherwise. With a
/// `limit` the traversal stops after that many events. Nothing is written
/// when the scene or start node is rejected.
pub fn write_events<W: Write>(
    service: &WalkthroughService,
    scene: &str,
    start: Option<NodeId>,
    json: bool,
    limit: Option<usize>,
    out: &mut W,
) -> CliResult<Outcome> {
    if limit == Some(0) {
        return Err(CliError::Usage("--limit must be at least 1".to_string()));
    }

    let mut written = 0;
    let mut failure: Option<io::Error> = None;

    let outcome = service.stream(scene, start, |graph, event| {
        let result = if json {
            serde_json::to_writer(&mut *out, event)
                .map_err(io::Error::from)
                .and_then(|_| writeln!(out))
        } else {
            writeln!(out, "{}", describe(graph, event))
        };
        if let Err(e) = result {
            failure = Some(e);
            return ControlFlow::Break(());
        }
        written += 1;
        match limit {
            Some(limit) if written >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(outcome),
    }
}

#[instrument(level = "debug", skip(service))]
fn cmd_play(service: &WalkthroughService, scene: &str, start: Option<NodeId>) -> CliResult<()> {
    let walkthrough = service.walk(scene, start)?;
    let storyboard = walkthrough.storyboard(service.settings());

    output::header(&format!("{} from {}", walkthrough.scene.name, walkthrough.graph.label(walkthrough.traversal.start)));
    for (line, (text, indent)) in PSEUDOCODE.iter().enumerate() {
        if !text.is_empty() {
            output::dim(&format!("{:>2}  {}{}", line, "    ".repeat(*indent), text));
        }
    }
    println!();

    for frame in storyboard.frames() {
        let time = format!("{:>6.2}s", frame.run_time);
        match &frame.kind {
            FrameKind::Cursor { line } => {
                println!("{}  {:>2}  {}", time.dimmed(), line, pseudocode_line(*line))
            }
            FrameKind::Queue => println!("{}      {}", time.dimmed(), frame.queue.cyan()),
            FrameKind::Edge { .. } => {
                println!("{}      {}", time.dimmed(), frame.caption.yellow())
            }
            FrameKind::Reveal { .. } => {
                println!("{}      {}", time.dimmed(), frame.caption.green().bold())
            }
            FrameKind::Finish => println!("{}      {}", time.dimmed(), frame.caption.bold()),
        }
    }

    output::action(
        "Total",
        &format!(
            "{} frames, {} nodes, {:.2}s",
            storyboard.frames().len(),
            storyboard.nodes_built(),
            storyboard.total_time()
        ),
    );
    Ok(())
}

#[instrument(level = "debug", skip(service))]
fn cmd_tree(service: &WalkthroughService, scene: &str, start: Option<NodeId>) -> CliResult<()> {
    let walkthrough = service.walk(scene, start)?;
    let graph = &walkthrough.graph;
    let tree = walkthrough.tree();

    let rendered = tree.to_termtree(|data| format!("{} (d={})", graph.label(data.node), data.distance));
    output::info(&rendered);

    let unreached = graph.node_count() - tree.len();
    output::action("Depth", &tree.depth());
    output::action("Leaves", &labels(graph, &tree.leaf_nodes()));
    if unreached > 0 {
        output::action("Unreached", &unreached);
    }
    Ok(())
}

#[instrument(level = "debug", skip(service))]
fn cmd_graph(service: &WalkthroughService, scene: &str) -> CliResult<()> {
    let (scene, graph) = service.load(scene)?;

    output::header(&format!(
        "{}: {} nodes, {} edges, start {}",
        scene.name,
        graph.node_count(),
        graph.edge_count(),
        scene.start
    ));
    for node in graph.nodes() {
        let position = node
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        output::info(&format!(
            "{:>3}  {:<4} {:<16} -> [{}]",
            node.id,
            node.display_label(),
            position,
            labels(&graph, graph.neighbors(node.id))
        ));
    }
    Ok(())
}

fn cmd_scenes(service: &WalkthroughService) -> CliResult<()> {
    for entry in service.scenes()? {
        match entry.origin {
            SceneOrigin::Builtin => output::info(&format!("{:<20} {}", entry.name, "builtin".dimmed())),
            SceneOrigin::File(path) => {
                output::info(&format!("{:<20} {}", entry.name, path.display()))
            }
        }
    }
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let settings = Settings::load()?;
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "exists" } else { "not found" };
                    output::action("Global", &format!("{} ({})", path.display(), state));
                }
                None => output::action("Global", &"unavailable"),
            }
            output::action("Scenes", &settings.scene_dir.display());
            output::detail(&"BFSVIZ_* environment variables override both");
        }
    }
    Ok(())
}

fn cmd_completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scene::Scene;
    use crate::domain::Layout;

    #[test]
    fn given_labelled_graph_when_describing_then_uses_letters() {
        let graph = Scene::builtin("small-cycle")
            .unwrap()
            .unwrap()
            .build(Layout::default())
            .unwrap();

        assert_eq!(
            describe(&graph, &Event::NodeDiscovered { node: 3, distance: 2 }),
            "discovered D (d=2)"
        );
        assert_eq!(describe(&graph, &Event::EdgeAdded { from: 0, to: 1 }), "edge A -> B");
        assert_eq!(
            describe(&graph, &Event::QueueChanged { queue: vec![1, 2] }),
            "queue [B, C]"
        );
    }
}
