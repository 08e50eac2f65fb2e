//! Force kernels applied once per simulation tick.
//!
//! Each kernel adjusts node velocities (or, for centering, positions) in
//! place. Pairwise forces are exact O(n²); lineage graphs are small.

use super::LayoutNode;

/// Squared distance below which many-body force stops growing.
const DISTANCE_MIN2: f64 = 1.0;

/// A link resolved to node indices, with precomputed strength and bias.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedLink {
    pub source: usize,
    pub target: usize,
    pub strength: f64,
    pub bias: f64,
}

impl ResolvedLink {
    /// Weight links by endpoint connectivity: busy nodes get weaker springs,
    /// and the lighter endpoint moves more.
    pub fn resolve(pairs: &[(usize, usize)], node_count: usize) -> Vec<ResolvedLink> {
        let mut count = vec![0usize; node_count];
        for &(s, t) in pairs {
            count[s] += 1;
            count[t] += 1;
        }

        pairs
            .iter()
            .map(|&(source, target)| {
                let (cs, ct) = (count[source] as f64, count[target] as f64);
                ResolvedLink {
                    source,
                    target,
                    strength: 1.0 / cs.min(ct),
                    bias: cs / (cs + ct),
                }
            })
            .collect()
    }
}

/// Deterministic linear congruential generator for jiggle.
#[derive(Debug, Clone)]
pub(crate) struct Lcg(u64);

impl Lcg {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub fn new() -> Self {
        Lcg(1)
    }

    /// Next value in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        self.0 as f64 / Self::M as f64
    }

    /// A tiny non-zero offset used to separate coincident nodes.
    pub fn jiggle(&mut self) -> f64 {
        (self.next_f64() - 0.5) * 1e-6
    }
}

/// Spring force pulling linked nodes toward `distance` apart.
pub(crate) fn apply_links(
    nodes: &mut [LayoutNode],
    links: &[ResolvedLink],
    distance: f64,
    alpha: f64,
    rng: &mut Lcg,
) {
    for link in links {
        let (s, t) = (link.source, link.target);
        let mut x = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
        let mut y = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
        if x == 0.0 {
            x = rng.jiggle();
        }
        if y == 0.0 {
            y = rng.jiggle();
        }

        let l = (x * x + y * y).sqrt();
        let k = (l - distance) / l * alpha * link.strength;
        x *= k;
        y *= k;

        nodes[t].vx -= x * link.bias;
        nodes[t].vy -= y * link.bias;
        nodes[s].vx += x * (1.0 - link.bias);
        nodes[s].vy += y * (1.0 - link.bias);
    }
}

/// Pairwise charge. Negative strength repels.
pub(crate) fn apply_many_body(nodes: &mut [LayoutNode], strength: f64, alpha: f64, rng: &mut Lcg) {
    let n = nodes.len();
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let mut x = nodes[j].x - nodes[i].x;
            let mut y = nodes[j].y - nodes[i].y;
            let mut l = x * x + y * y;
            if x == 0.0 {
                x = rng.jiggle();
                l += x * x;
            }
            if y == 0.0 {
                y = rng.jiggle();
                l += y * y;
            }
            if l < DISTANCE_MIN2 {
                l = (DISTANCE_MIN2 * l).sqrt();
            }

            let w = strength * alpha / l;
            nodes[i].vx += x * w;
            nodes[i].vy += y * w;
        }
    }
}

/// Translate every node so the mean position lands on `(cx, cy)`.
pub(crate) fn apply_center(nodes: &mut [LayoutNode], cx: f64, cy: f64) {
    if nodes.is_empty() {
        return;
    }
    let n = nodes.len() as f64;
    let sx = nodes.iter().map(|node| node.x).sum::<f64>() / n - cx;
    let sy = nodes.iter().map(|node| node.y).sum::<f64>() / n - cy;
    for node in nodes.iter_mut() {
        node.x -= sx;
        node.y -= sy;
    }
}

/// Push apart nodes whose collision circles overlap.
///
/// Uses predicted positions (`x + vx`); the smaller node takes the larger
/// share of the correction.
pub(crate) fn apply_collide(nodes: &mut [LayoutNode], radii: &[f64], rng: &mut Lcg) {
    let n = nodes.len();
    for i in 0..n {
        let ri = radii[i];
        let ri2 = ri * ri;
        let xi = nodes[i].x + nodes[i].vx;
        let yi = nodes[i].y + nodes[i].vy;

        for j in (i + 1)..n {
            let rj = radii[j];
            let r = ri + rj;
            let mut x = xi - nodes[j].x - nodes[j].vx;
            let mut y = yi - nodes[j].y - nodes[j].vy;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }

            if x == 0.0 {
                x = rng.jiggle();
                l += x * x;
            }
            if y == 0.0 {
                y = rng.jiggle();
                l += y * y;
            }
            let d = l.sqrt();
            let k = (r - d) / d;
            x *= k;
            y *= k;

            let share = rj * rj / (ri2 + rj * rj);
            nodes[i].vx += x * share;
            nodes[i].vy += y * share;
            nodes[j].vx -= x * (1.0 - share);
            nodes[j].vy -= y * (1.0 - share);
        }
    }
}
