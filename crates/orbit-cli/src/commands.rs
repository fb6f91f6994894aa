//! CLI command implementations.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use orbit_core::{MemoryStore, NodeKey, NodeKind, PartitionFilter, PartitionScope};
use orbit_explorer::{Explorer, ExplorerConfig, LoadStatus};
use orbit_graph::TICK_INTERVAL;
use orbit_loader::LoaderService;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Flags shared by every command.
pub struct Options {
    pub config: Option<PathBuf>,
    pub partition: Option<String>,
}

impl Options {
    fn explorer_config(&self) -> Result<ExplorerConfig> {
        let mut config = match &self.config {
            Some(path) => ExplorerConfig::from_json_file(path)?,
            None => ExplorerConfig::default(),
        };
        if let Some(partition) = &self.partition {
            config.partition = PartitionFilter::only(partition.as_str());
        }
        Ok(config)
    }
}

/// Parses "id", "primary:id" or "secondary:id".
pub fn parse_key(raw: &str) -> NodeKey {
    match raw.split_once(':') {
        Some(("secondary", id)) => NodeKey::secondary(id),
        Some(("primary", id)) => NodeKey::primary(id),
        _ => NodeKey::primary(raw),
    }
}

fn open(fixture: &Path, options: &Options) -> Result<Explorer> {
    let config = options.explorer_config()?;
    let store = MemoryStore::from_json_file(fixture)?;
    debug!(
        "Loaded fixture {} ({} nodes, {} edges)",
        fixture.display(),
        store.node_count(),
        store.edge_count()
    );
    let loader = LoaderService::new(config.loader.clone());
    loader.configure(Arc::new(store));
    Ok(Explorer::new(config, loader))
}

/// Waits for outstanding loads and turns a failed status into an error.
async fn settle(explorer: &mut Explorer) -> Result<()> {
    explorer.settle().await;
    match explorer.status() {
        LoadStatus::Failed { message, retry } => {
            Err(format!("{} failed: {}", retry, message).into())
        }
        _ => Ok(()),
    }
}

/// Show what a fixture contains.
pub fn stats(fixture: &Path, options: &Options) -> Result<()> {
    let store = MemoryStore::from_json_file(fixture)?;
    let content = store.to_fixture();
    let filter = options
        .partition
        .as_deref()
        .map(PartitionFilter::only)
        .unwrap_or_default();

    let mut kinds: BTreeMap<NodeKind, usize> = BTreeMap::new();
    let mut partitions: BTreeMap<String, usize> = BTreeMap::new();
    for node in content.nodes.iter().filter(|n| n.scope.is_visible_in(&filter)) {
        *kinds.entry(node.kind).or_default() += 1;
        let name = match &node.scope {
            PartitionScope::ScopedTo(id) => id.to_string(),
            PartitionScope::Unscoped => "(unscoped)".to_string(),
        };
        *partitions.entry(name).or_default() += 1;
    }
    let edges = content
        .edges
        .iter()
        .filter(|e| e.scope.is_visible_in(&filter))
        .count();

    println!("{}", "Fixture".cyan().bold());
    println!("  {:<12} {}", "file", fixture.display());
    println!("  {:<12} {}", "partition", filter);
    for (kind, count) in &kinds {
        println!("  {:<12} {}", kind.as_str(), count.to_string().cyan());
    }
    println!("  {:<12} {}", "edges", edges.to_string().cyan());

    if !partitions.is_empty() {
        println!("\n{}", "Partitions".cyan().bold());
        for (name, count) in &partitions {
            println!("  {:<16} {}", name, count);
        }
    }

    Ok(())
}

/// Load the global view or a node's neighborhood.
pub async fn load(
    fixture: &Path,
    options: &Options,
    center: Option<&str>,
    hops: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut explorer = open(fixture, options)?;
    match center {
        Some(raw) => explorer.load_neighborhood(parse_key(raw), hops),
        None => explorer.load_global(),
    }
    settle(&mut explorer).await?;

    if json {
        return print_json(&explorer);
    }

    let title = match center {
        Some(raw) => format!("Neighborhood of {}", parse_key(raw)),
        None => "Global view".to_string(),
    };
    print_graph(&explorer, &title);
    Ok(())
}

/// Load a neighborhood, then expand one of its nodes.
pub async fn expand(
    fixture: &Path,
    options: &Options,
    center: &str,
    anchor: &str,
    children_only: bool,
    json: bool,
) -> Result<()> {
    let mut explorer = open(fixture, options)?;
    explorer.load_neighborhood(parse_key(center), None);
    settle(&mut explorer).await?;

    let before_nodes = explorer.model().node_count();
    let before_edges = explorer.model().edge_count();

    let anchor = parse_key(anchor);
    let issued = if children_only {
        explorer.expand_containment_only(&anchor)
    } else {
        explorer.expand(&anchor)
    };
    if !issued {
        return Err(format!("{} is not in the neighborhood of {}", anchor, center).into());
    }
    settle(&mut explorer).await?;

    if json {
        return print_json(&explorer);
    }

    println!(
        "{} Expanded {}: +{} nodes, +{} edges",
        "✓".green(),
        anchor.to_string().cyan(),
        explorer.model().node_count() - before_nodes,
        explorer.model().edge_count() - before_edges
    );
    print_graph(&explorer, "Graph after expansion");
    Ok(())
}

/// Run the force layout until it settles and print positions.
pub async fn layout(
    fixture: &Path,
    options: &Options,
    center: Option<&str>,
    max_ticks: u32,
    output: Option<&Path>,
) -> Result<()> {
    let mut explorer = open(fixture, options)?;
    match center {
        Some(raw) => explorer.load_neighborhood(parse_key(raw), None),
        None => explorer.load_global(),
    }
    settle(&mut explorer).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));

    let dt = TICK_INTERVAL.as_secs_f32();
    let mut ticks = 0;
    let mut energy = 0.0;
    explorer.set_active(true);
    while ticks < max_ticks {
        let Some(report) = explorer.tick(dt) else {
            break;
        };
        ticks += 1;
        energy = report.kinetic_energy;
        if ticks % 20 == 0 {
            spinner.set_message(format!("Tick {} (energy {:.3})", ticks, energy));
        }
    }
    explorer.set_active(false);
    explorer.fit_all();
    spinner.finish_and_clear();

    println!(
        "{} Layout ran {} ticks, final energy {:.3}",
        "✓".green(),
        ticks.to_string().cyan(),
        energy
    );

    let positions: BTreeMap<String, [f32; 2]> = explorer
        .nodes()
        .filter_map(|node| {
            let p = explorer.position(&node.key)?;
            Some((node.key.to_string(), [p.x, p.y]))
        })
        .collect();
    let export = serde_json::json!({
        "ticks": ticks,
        "camera": {
            "scale": explorer.camera().scale(),
            "pan": explorer.camera().pan(),
        },
        "positions": positions,
    });
    let text = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            fs::write(path, text)?;
            println!("{} Wrote positions to {}", "✓".green(), path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

/// Show relevance around a selected node.
pub async fn lens(
    fixture: &Path,
    options: &Options,
    select: &str,
    depth: Option<u32>,
    json: bool,
) -> Result<()> {
    let mut config = options.explorer_config()?;
    if let Some(depth) = depth {
        config.lens.depth = depth;
    }
    let store = MemoryStore::from_json_file(fixture)?;
    let loader = LoaderService::new(config.loader.clone());
    loader.configure(Arc::new(store));
    let mut explorer = Explorer::new(config, loader);

    let selected = parse_key(select);
    explorer.load_neighborhood(selected.clone(), None);
    settle(&mut explorer).await?;
    explorer.select(&selected);

    let keys: Vec<NodeKey> = explorer.nodes().map(|n| n.key.clone()).collect();
    let lens = explorer.lens();
    let mut rows: Vec<(NodeKey, Option<u32>, f32)> = keys
        .into_iter()
        .map(|key| {
            let distance = lens.distance(&key);
            let opacity = lens.node_opacity(&key);
            (key, distance, opacity)
        })
        .collect();
    rows.sort_by(|a, b| {
        let da = a.1.unwrap_or(u32::MAX);
        let db = b.1.unwrap_or(u32::MAX);
        da.cmp(&db).then_with(|| a.0.cmp(&b.0))
    });

    if json {
        let export: Vec<_> = rows
            .iter()
            .map(|(key, distance, opacity)| {
                serde_json::json!({
                    "node": key.to_string(),
                    "distance": distance,
                    "opacity": opacity,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    println!("{} {}\n", "Lens around".cyan().bold(), selected);
    for (key, distance, opacity) in rows {
        let distance = match distance {
            Some(d) => d.to_string().green(),
            None => "-".dimmed(),
        };
        println!("  {:>3}  {:.2}  {}", distance, opacity, key);
    }
    Ok(())
}

fn print_graph(explorer: &Explorer, title: &str) {
    let model = explorer.model();
    println!(
        "{} {} ({} nodes, {} edges)\n",
        "✓".green(),
        title.cyan().bold(),
        model.node_count(),
        model.edge_count()
    );

    let mut nodes: Vec<_> = model.nodes().collect();
    nodes.sort_by(|a, b| a.key.cmp(&b.key));
    for node in nodes {
        println!(
            "  {} {} {}",
            node.key.kind.to_string().yellow(),
            node.key.id.cyan(),
            format!("({}, degree {})", node.label, model.degree(&node.key)).dimmed()
        );
    }

    let mut edges: Vec<_> = model.edges().collect();
    edges.sort_by(|a, b| (a.a(), a.b()).cmp(&(b.a(), b.b())));
    if !edges.is_empty() {
        println!();
        for edge in edges {
            println!(
                "  {} {} {}",
                edge.a(),
                format!("-[{}]-", edge.kind()).dimmed(),
                edge.b()
            );
        }
    }
}

fn print_json(explorer: &Explorer) -> Result<()> {
    let model = explorer.model();
    let nodes: Vec<_> = model.nodes().collect();
    let edges: Vec<_> = model.edges().collect();
    let export = serde_json::json!({
        "stats": {
            "nodeCount": model.node_count(),
            "edgeCount": model.edge_count(),
        },
        "nodes": nodes,
        "edges": edges,
    });
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("alice"), NodeKey::primary("alice"));
        assert_eq!(parse_key("primary:alice"), NodeKey::primary("alice"));
        assert_eq!(parse_key("secondary:colour"), NodeKey::secondary("colour"));
        assert_eq!(parse_key("team:blue"), NodeKey::primary("team:blue"));
    }

    #[tokio::test]
    async fn test_demo_fixture_loads() {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/family.json");
        let options = Options {
            config: None,
            partition: Some("home".to_string()),
        };
        let mut explorer = open(&fixture, &options).unwrap();
        explorer.load_neighborhood(parse_key("ada"), Some(1));
        settle(&mut explorer).await.unwrap();

        let model = explorer.model();
        assert!(model.contains(&NodeKey::primary("ben")));
        assert!(model.contains(&NodeKey::secondary("ada-email")));
        assert!(!model.contains(&NodeKey::primary("dev")));
    }

    #[test]
    fn test_partition_flag_overrides_config() {
        let options = Options {
            config: None,
            partition: Some("work".to_string()),
        };
        let config = options.explorer_config().unwrap();
        assert_eq!(config.partition, PartitionFilter::only("work"));
    }
}
