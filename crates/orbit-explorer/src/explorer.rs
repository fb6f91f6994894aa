//! The interactive controller.
//!
//! `Explorer` lives on the interactive thread and owns the live graph, the
//! camera, the simulation and the lens. Loads are handed to the
//! [`LoaderService`] on spawned tasks; their results come back over a channel
//! and are committed by [`Explorer::poll`] (or [`Explorer::settle`]) only if
//! they still apply:
//!
//! - a full load must carry the latest load generation
//! - an expansion must have been issued against the graph that is still live
//!
//! Anything else is dropped. Cancelled loads are dropped silently.

use crate::config::ExplorerConfig;
use crate::status::{LoadRequest, LoadStatus};
use orbit_core::{GraphEdge, GraphNode, NodeKey, PartitionFilter};
use orbit_graph::{
    CameraController, GraphDelta, GraphModel, GraphSnapshot, LensCache, LensContext,
    PhysicsSimulator, Pos2, StepReport, Viewport,
};
use orbit_loader::{ExpandMode, ExpandRequest, LoadError, LoaderService, NeighborhoodRequest};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A finished background load.
enum Completion {
    Full {
        generation: u64,
        request: LoadRequest,
        result: orbit_loader::Result<GraphSnapshot>,
    },
    Expansion {
        graph: u64,
        request: LoadRequest,
        result: orbit_loader::Result<GraphDelta>,
    },
}

pub struct Explorer {
    config: ExplorerConfig,
    loader: LoaderService,
    model: GraphModel,
    camera: CameraController,
    physics: PhysicsSimulator,
    lens: LensCache,
    viewport: Viewport,
    status: LoadStatus,

    /// Bumped by every full load and by `cancel_load`.
    load_generation: u64,
    load_cancel: CancellationToken,
    /// Bumped whenever the live graph is replaced or cleared.
    graph_generation: u64,
    graph_cancel: CancellationToken,
    /// Last full load issued, reissued when the partition changes.
    last_full: Option<LoadRequest>,

    pending: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Explorer {
    pub fn new(config: ExplorerConfig, loader: LoaderService) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut model = GraphModel::with_seed(config.seed);
        model.set_partition(config.partition.clone());
        Self {
            camera: CameraController::new(config.camera),
            physics: PhysicsSimulator::new(config.physics),
            lens: LensCache::new(),
            viewport: Viewport::default(),
            status: LoadStatus::Idle,
            load_generation: 0,
            load_cancel: CancellationToken::new(),
            graph_generation: 0,
            graph_cancel: CancellationToken::new(),
            last_full: None,
            pending: 0,
            model,
            loader,
            config,
            tx,
            rx,
        }
    }

    // ── Loading ─────────────────────────────────────────────────────────
    //
    // These spawn onto the ambient tokio runtime and return immediately.

    pub fn load_global(&mut self) {
        self.issue(LoadRequest::Global);
    }

    /// Loads the neighborhood of `center`, using the configured hop count
    /// when `hops` is `None`.
    pub fn load_neighborhood(&mut self, center: NodeKey, hops: Option<u32>) {
        let hops = hops.unwrap_or(self.config.default_hops);
        self.issue(LoadRequest::Neighborhood { center, hops });
    }

    /// Expands a node of the live graph. Returns false if it is not there.
    pub fn expand(&mut self, anchor: &NodeKey) -> bool {
        self.expand_with(anchor, ExpandMode::Full)
    }

    pub fn expand_containment_only(&mut self, anchor: &NodeKey) -> bool {
        self.expand_with(anchor, ExpandMode::ContainmentOnly)
    }

    fn expand_with(&mut self, anchor: &NodeKey, mode: ExpandMode) -> bool {
        if !self.model.contains(anchor) {
            return false;
        }
        self.issue(LoadRequest::Expand {
            anchor: anchor.clone(),
            mode,
        });
        true
    }

    /// Reissues the request that last failed.
    pub fn retry(&mut self) -> bool {
        let LoadStatus::Failed { retry, .. } = &self.status else {
            return false;
        };
        let request = retry.clone();
        if let LoadRequest::Expand { anchor, .. } = &request {
            if !self.model.contains(anchor) {
                return false;
            }
        }
        self.issue(request);
        true
    }

    /// Abandons the running full load. Its result, if any, is dropped.
    pub fn cancel_load(&mut self) {
        self.load_cancel.cancel();
        self.load_generation += 1;
        if matches!(&self.status, LoadStatus::Loading(r) if r.is_full()) {
            self.status = LoadStatus::Idle;
        }
    }

    /// Switches partition: clears the graph and reloads the last full view.
    pub fn set_partition(&mut self, partition: PartitionFilter) -> bool {
        if !self.model.set_partition(partition.clone()) {
            return false;
        }
        info!("Switched to partition {}", partition);
        self.config.partition = partition;
        self.replace_graph_generation();
        self.cancel_load();
        let request = self.last_full.clone().unwrap_or(LoadRequest::Global);
        self.issue(request);
        true
    }

    fn issue(&mut self, request: LoadRequest) {
        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let partition = self.config.partition.clone();
        let budget = self.config.budget;
        self.pending += 1;
        self.status = LoadStatus::Loading(request.clone());

        match request.clone() {
            LoadRequest::Global | LoadRequest::Neighborhood { .. } => {
                self.load_cancel.cancel();
                self.load_cancel = CancellationToken::new();
                self.load_generation += 1;
                self.last_full = Some(request.clone());

                let generation = self.load_generation;
                let cancel = self.load_cancel.clone();
                let include_containment = self.config.include_containment;
                debug!("Issuing {} as generation {}", request, generation);

                tokio::spawn(async move {
                    let result = match &request {
                        LoadRequest::Neighborhood { center, hops } => {
                            let req = NeighborhoodRequest::new(center.clone(), *hops)
                                .with_containment(include_containment)
                                .with_partition(partition)
                                .with_budget(budget);
                            loader.load_neighborhood(req, cancel).await
                        }
                        _ => loader.load_global(partition, budget, cancel).await,
                    };
                    let _ = tx.send(Completion::Full {
                        generation,
                        request,
                        result,
                    });
                });
            }
            LoadRequest::Expand { anchor, mode } => {
                let graph = self.graph_generation;
                let cancel = self.graph_cancel.child_token();
                let expand = ExpandRequest::new(anchor, mode)
                    .with_existing(self.model.key_set(), self.model.edge_set())
                    .with_partition(partition)
                    .with_budget(budget)
                    .with_graph(graph);
                debug!("Issuing {} against graph {}", request, graph);

                tokio::spawn(async move {
                    let result = loader.expand(expand, cancel).await;
                    let _ = tx.send(Completion::Expansion {
                        graph,
                        request,
                        result,
                    });
                });
            }
        }
    }

    fn replace_graph_generation(&mut self) {
        self.graph_cancel.cancel();
        self.graph_cancel = CancellationToken::new();
        self.graph_generation += 1;
    }

    /// Commits every finished load without waiting. Returns how many were
    /// committed.
    pub fn poll(&mut self) -> usize {
        let mut committed = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if self.commit(completion) {
                committed += 1;
            }
        }
        committed
    }

    /// Waits for every load issued so far and commits them.
    pub async fn settle(&mut self) -> usize {
        let mut committed = 0;
        while self.pending > 0 {
            match self.rx.recv().await {
                Some(completion) => {
                    if self.commit(completion) {
                        committed += 1;
                    }
                }
                None => break,
            }
        }
        committed
    }

    /// Number of loads issued but not yet received.
    pub fn pending(&self) -> usize {
        self.pending
    }

    fn commit(&mut self, completion: Completion) -> bool {
        self.pending = self.pending.saturating_sub(1);

        let committed = match completion {
            Completion::Full {
                generation,
                request,
                result,
            } => {
                if generation != self.load_generation {
                    debug!("Dropping stale {} (generation {})", request, generation);
                    false
                } else {
                    match result {
                        Ok(snapshot) => {
                            self.commit_snapshot(snapshot);
                            info!(
                                "Committed {}: {} nodes, {} edges",
                                request,
                                self.model.node_count(),
                                self.model.edge_count()
                            );
                            true
                        }
                        Err(e) => {
                            self.fail(request, e);
                            false
                        }
                    }
                }
            }
            Completion::Expansion {
                graph,
                request,
                result,
            } => {
                if graph != self.graph_generation {
                    debug!("Dropping {} issued against replaced graph", request);
                    false
                } else {
                    match result {
                        Ok(delta) => {
                            let outcome = self.model.merge(delta, &self.config.budget);
                            if !outcome.is_empty() {
                                self.physics.start();
                            }
                            debug!(
                                "Committed {}: +{} nodes, +{} edges",
                                request,
                                outcome.nodes_added.len(),
                                outcome.edges_added
                            );
                            true
                        }
                        Err(e) => {
                            self.fail(request, e);
                            false
                        }
                    }
                }
            }
        };

        if self.pending == 0 && self.status.is_loading() {
            self.status = LoadStatus::Idle;
        }
        committed
    }

    fn commit_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.replace_graph_generation();
        self.model.replace(snapshot);
        if self.config.auto_fit {
            self.fit_all();
        }
        self.physics.start();
    }

    fn fail(&mut self, request: LoadRequest, error: LoadError) {
        if error.is_cancelled() {
            debug!("{} was cancelled", request);
            return;
        }
        warn!("{} failed: {}", request, error);
        self.status = LoadStatus::Failed {
            message: error.to_string(),
            retry: request,
        };
    }

    // ── Camera ──────────────────────────────────────────────────────────

    pub fn center_on(&mut self, key: &NodeKey) -> bool {
        match self.model.position(key) {
            Some(position) => {
                self.camera.center_on(position);
                true
            }
            None => false,
        }
    }

    pub fn fit_all(&mut self) -> bool {
        let physics = self.physics.config();
        let circles: Vec<(Pos2, f32)> = self
            .model
            .nodes()
            .filter_map(|n| Some((self.model.position(&n.key)?, physics.radius(n.key.kind))))
            .collect();
        self.camera.fit_all(circles, self.viewport)
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Converts a screen position to world space.
    pub fn to_world(&self, screen: Pos2) -> Pos2 {
        self.camera.to_world(screen, self.viewport.center())
    }

    pub fn to_screen(&self, world: Pos2) -> Pos2 {
        self.camera.to_screen(world, self.viewport.center())
    }

    // ── Interaction ─────────────────────────────────────────────────────

    pub fn pin(&mut self, key: &NodeKey) -> bool {
        self.model.pin(key)
    }

    pub fn unpin(&mut self, key: &NodeKey) -> bool {
        let unpinned = self.model.unpin(key);
        if unpinned {
            self.physics.start();
        }
        unpinned
    }

    pub fn select(&mut self, key: &NodeKey) -> bool {
        let selected = self.model.select(key);
        if selected {
            self.physics.start();
        }
        selected
    }

    pub fn deselect(&mut self) -> Option<NodeKey> {
        let previous = self.model.deselect();
        if previous.is_some() {
            self.physics.start();
        }
        previous
    }

    pub fn begin_drag(&mut self, key: &NodeKey) -> bool {
        let started = self.model.begin_drag(key);
        if started {
            self.physics.start();
        }
        started
    }

    /// Moves the dragged node to a screen position.
    pub fn drag_to(&mut self, screen: Pos2) -> bool {
        let world = self.to_world(screen);
        self.model.drag_to(world)
    }

    pub fn end_drag(&mut self) -> Option<NodeKey> {
        self.model.end_drag(self.config.pin_on_drop)
    }

    pub fn refresh_label(&mut self, key: &NodeKey, label: impl Into<String>) -> bool {
        self.model.refresh_label(key, label)
    }

    /// Starts or stops the simulation.
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.physics.start();
        } else {
            self.physics.stop();
        }
    }

    /// Advances camera animation by `dt` seconds and the simulation by one
    /// step. The simulation stops itself once the layout has settled.
    pub fn tick(&mut self, dt: f32) -> Option<StepReport> {
        self.camera.advance(dt);
        let lens = self.lens.context(self.config.lens, &self.model);
        let report = self.physics.tick(&mut self.model, Some(lens))?;
        let threshold = self.physics.config().settle_energy;
        if report.is_settled(threshold) && self.model.dragging().is_none() {
            debug!("Layout settled after {} ticks", self.physics.ticks());
            self.physics.stop();
        }
        Some(report)
    }

    // ── Renderer queries ────────────────────────────────────────────────

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.model.nodes()
    }

    /// Edges to draw, per the configured edge display.
    pub fn draw_edges(&self) -> Vec<&GraphEdge> {
        self.model.draw_edges(self.config.edge_display)
    }

    /// Every edge, including ones not drawn.
    pub fn physics_edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.model.edges()
    }

    pub fn position(&self, key: &NodeKey) -> Option<Pos2> {
        self.model.position(key)
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn physics(&self) -> &PhysicsSimulator {
        &self.physics
    }

    pub fn lens(&mut self) -> &LensContext {
        self.lens.context(self.config.lens, &self.model)
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn loader(&self) -> &LoaderService {
        &self.loader
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn load_generation(&self) -> u64 {
        self.load_generation
    }
}
