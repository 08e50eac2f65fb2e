//! The force simulation and its iterator handle.

use std::collections::HashMap;
use std::f64::consts::PI;

use super::forces::{self, Lcg, ResolvedLink};
use super::measure::TextMeasure;
use super::{LayoutConfig, LayoutNode, LayoutSnapshot, NodePosition};
use crate::lineage::{GraphLink, GraphNode};

/// Radius of the first phyllotaxis ring.
const INITIAL_RADIUS: f64 = 10.0;

/// Physics state for one layout.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    nodes: Vec<LayoutNode>,
    radii: Vec<f64>,
    links: Vec<ResolvedLink>,
    index: HashMap<String, usize>,
    config: LayoutConfig,
    alpha: f64,
    alpha_target: f64,
    rng: Lcg,
}

impl ForceLayout {
    /// Seed a simulation from a lineage graph.
    ///
    /// Links naming an absent node are dropped. Self-loops exert no force and
    /// are dropped as well.
    pub fn new(
        nodes: &[GraphNode],
        links: &[GraphLink],
        config: &LayoutConfig,
        measure: &dyn TextMeasure,
    ) -> Self {
        let initial_angle = PI * (3.0 - 5f64.sqrt());

        let mut index = HashMap::with_capacity(nodes.len());
        let mut bodies = Vec::with_capacity(nodes.len());
        let mut radii = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let width = config
                .min_node_width
                .max(measure.text_width(&node.name) + config.label_padding);
            let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
            let angle = i as f64 * initial_angle;

            index.insert(node.id.clone(), i);
            radii.push(width / 2.0 + config.collision_padding);
            bodies.push(LayoutNode {
                id: node.id.clone(),
                width,
                x: radius * angle.cos(),
                y: radius * angle.sin(),
                vx: 0.0,
                vy: 0.0,
                fx: None,
                fy: None,
            });
        }

        let mut pairs = Vec::with_capacity(links.len());
        for link in links {
            match (index.get(&link.source), index.get(&link.target)) {
                (Some(&s), Some(&t)) if s != t => pairs.push((s, t)),
                (Some(_), Some(_)) => {}
                _ => log::warn!(
                    "layout: skipping link {} -> {} with an absent endpoint",
                    link.source,
                    link.target
                ),
            }
        }

        Self {
            links: ResolvedLink::resolve(&pairs, bodies.len()),
            nodes: bodies,
            radii,
            index,
            alpha: config.alpha,
            alpha_target: 0.0,
            config: config.clone(),
            rng: Lcg::new(),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Number of links that take part in the simulation.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.node(id).is_some_and(LayoutNode::is_pinned)
    }

    /// Advance one step.
    pub fn tick(&mut self) {
        let c = &self.config;
        self.alpha += (self.alpha_target - self.alpha) * c.alpha_decay;
        let alpha = self.alpha;

        forces::apply_links(
            &mut self.nodes,
            &self.links,
            c.link_distance,
            alpha,
            &mut self.rng,
        );
        forces::apply_many_body(&mut self.nodes, c.charge_strength, alpha, &mut self.rng);
        forces::apply_center(&mut self.nodes, c.width / 2.0, c.height / 2.0);
        forces::apply_collide(&mut self.nodes, &self.radii, &mut self.rng);

        let keep = 1.0 - c.velocity_decay;
        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= keep;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= keep;
                    node.y += node.vy;
                }
            }
        }
    }

    /// Fix a node at `(x, y)` and reheat toward the drag target.
    pub fn pin(&mut self, id: &str, (x, y): (f64, f64)) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.fx = Some(x);
        node.fy = Some(y);
        node.x = x;
        node.y = y;
        self.alpha_target = self.config.drag_alpha_target;
        true
    }

    /// Release a pinned node. Once nothing is pinned the simulation cools.
    pub fn unpin(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.fx = None;
        node.fy = None;
        if !self.nodes.iter().any(LayoutNode::is_pinned) {
            self.alpha_target = 0.0;
        }
        true
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|n| NodePosition {
                id: n.id.clone(),
                x: n.x,
                y: n.y,
            })
            .collect()
    }
}

/// A live layout: yields one [`LayoutSnapshot`] per tick until the
/// simulation cools below `alpha_min` or `max_iterations` ticks have run
/// since the last restart.
#[derive(Debug, Clone)]
pub struct LayoutHandle {
    layout: ForceLayout,
    tick: usize,
    since_restart: usize,
    settled: bool,
}

impl LayoutHandle {
    pub fn new(layout: ForceLayout) -> Self {
        Self {
            layout,
            tick: 0,
            since_restart: 0,
            settled: false,
        }
    }

    pub fn layout(&self) -> &ForceLayout {
        &self.layout
    }

    /// Ticks run since the handle was created.
    pub fn ticks(&self) -> usize {
        self.tick
    }

    pub fn is_running(&self) -> bool {
        !self.settled && self.since_restart < self.layout.config.max_iterations
    }

    /// Pin a node and restart. Returns `false` for an unknown id.
    pub fn pin(&mut self, id: &str, position: (f64, f64)) -> bool {
        let found = self.layout.pin(id, position);
        if found {
            self.restart();
        }
        found
    }

    /// Release a node and restart so it can settle. Returns `false` for an
    /// unknown id.
    pub fn unpin(&mut self, id: &str) -> bool {
        let found = self.layout.unpin(id);
        if found {
            self.restart();
        }
        found
    }

    /// Run to completion and return the final snapshot, if any tick ran.
    pub fn settle(&mut self) -> Option<LayoutSnapshot> {
        self.by_ref().last()
    }

    fn restart(&mut self) {
        self.settled = false;
        self.since_restart = 0;
    }
}

impl Iterator for LayoutHandle {
    type Item = LayoutSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.is_running() {
            return None;
        }

        self.layout.tick();
        self.tick += 1;
        self.since_restart += 1;
        if self.layout.alpha < self.layout.config.alpha_min {
            self.settled = true;
            log::debug!("layout settled after {} ticks", self.tick);
        }

        Some(LayoutSnapshot {
            tick: self.tick,
            alpha: self.layout.alpha,
            positions: self.layout.positions(),
        })
    }
}
