//! Force-directed layout for lineage graphs.
//!
//! An iterative simulation in the style of a velocity-Verlet force engine.
//! Each tick cools `alpha` toward its target, then applies four forces:
//!
//! ```text
//! link      springs toward link_distance, weaker on busy nodes
//! charge    pairwise repulsion scaled by alpha / d²
//! center    translate the mean position onto the canvas centre
//! collide   keep padded label boxes from overlapping
//! ```
//!
//! Velocities then decay and positions integrate; pinned nodes sit exactly
//! at their pin. Initial positions follow a phyllotaxis spiral and a fixed
//! LCG provides jiggle, so the same input always produces the same layout.
//!
//! A [`LayoutSession`] owns at most one running simulation. Starting a new
//! layout disposes the previous one.

mod forces;
mod measure;
mod simulation;

pub use measure::{ApproxTextMeasure, TextMeasure};
pub use simulation::{ForceLayout, LayoutHandle};

use serde::{Deserialize, Serialize};

use crate::lineage::{GraphLink, GraphNode};

// ============================================================================
// Configuration
// ============================================================================

/// Layout constants, loaded from the `[layout]` settings section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub link_distance: f64,
    pub charge_strength: f64,
    /// Added to half the label width to form the collision radius.
    pub collision_padding: f64,
    pub min_node_width: f64,
    /// Added to the measured label width.
    pub label_padding: f64,
    pub font_size: f64,
    pub alpha: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
    pub velocity_decay: f64,
    pub drag_alpha_target: f64,
    pub max_iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let alpha_min = 0.001;
        let max_iterations = 300;
        Self {
            width: 1100.0,
            height: 1200.0,
            link_distance: 150.0,
            charge_strength: -100.0,
            collision_padding: 20.0,
            min_node_width: 80.0,
            label_padding: 20.0,
            font_size: 12.0,
            alpha: 1.0,
            alpha_min,
            alpha_decay: 1.0 - alpha_min.powf(1.0 / max_iterations as f64),
            velocity_decay: 0.4,
            drag_alpha_target: 0.3,
            max_iterations,
        }
    }
}

impl LayoutConfig {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Drawing area the layout centres on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

// ============================================================================
// Simulation state
// ============================================================================

/// A node as the simulation sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    /// Rendered label box width.
    pub width: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl LayoutNode {
    pub fn is_pinned(&self) -> bool {
        self.fx.is_some() || self.fy.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Positions after one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub tick: usize,
    pub alpha: f64,
    pub positions: Vec<NodePosition>,
}

impl LayoutSnapshot {
    pub fn position(&self, id: &str) -> Option<&NodePosition> {
        self.positions.iter().find(|p| p.id == id)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Holds the single live layout.
pub struct LayoutSession {
    config: LayoutConfig,
    measure: Box<dyn TextMeasure>,
    current: Option<LayoutHandle>,
}

impl LayoutSession {
    pub fn new(config: LayoutConfig) -> Self {
        let measure = Box::new(ApproxTextMeasure::new(config.font_size));
        Self {
            config,
            measure,
            current: None,
        }
    }

    pub fn with_measure(mut self, measure: Box<dyn TextMeasure>) -> Self {
        self.measure = measure;
        self
    }

    /// Dispose any running layout and start a new one on `canvas`.
    pub fn start(
        &mut self,
        nodes: &[GraphNode],
        links: &[GraphLink],
        canvas: Canvas,
    ) -> &mut LayoutHandle {
        self.dispose();

        let config = LayoutConfig {
            width: canvas.width,
            height: canvas.height,
            ..self.config.clone()
        };
        log::debug!(
            "starting layout: {} nodes, {} links on {}x{}",
            nodes.len(),
            links.len(),
            canvas.width,
            canvas.height
        );
        let layout = ForceLayout::new(nodes, links, &config, self.measure.as_ref());
        self.current.insert(LayoutHandle::new(layout))
    }

    /// The live layout, if one has been started and not disposed.
    pub fn handle_mut(&mut self) -> Option<&mut LayoutHandle> {
        self.current.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Drop the live layout.
    pub fn dispose(&mut self) {
        if let Some(previous) = self.current.take() {
            log::debug!("disposing layout after {} ticks", previous.ticks());
        }
    }
}

impl Default for LayoutSession {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
