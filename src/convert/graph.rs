//! Per-dimension conversion graph
//!
//! An explicit adjacency-list structure built from the active edge
//! snapshot of one dimension. Each stored edge contributes a forward
//! arc carrying its affine transform and a reverse arc carrying the
//! algebraic inverse, so the graph is undirected for traversal.
//!
//! Path search is breadth-first: shortest hop count wins, and among
//! equal-length paths the first one discovered (edge creation order)
//! is returned. The SI base unit needs no special casing - when two
//! units only connect through it, BFS finds it as an intermediate hop.

use std::collections::{HashMap, VecDeque};

use crate::catalog::edge::ConversionEdge;
use crate::catalog::unit::UnitCode;
use crate::convert::transform::Affine;

/// One traversable arc to a neighboring unit
#[derive(Debug, Clone)]
struct Hop {
    to: usize,
    transform: Affine,
}

/// Adjacency-list graph over the units of a single dimension
#[derive(Debug)]
pub struct DimensionGraph {
    index: HashMap<UnitCode, usize>,
    adjacency: Vec<Vec<Hop>>,
}

impl DimensionGraph {
    /// Build the graph from an active-edge snapshot
    ///
    /// Nodes are discovered from edge endpoints; a unit with no edges
    /// is simply unreachable, which surfaces as "no path" downstream.
    pub fn build(edges: &[ConversionEdge]) -> Self {
        let mut graph = Self {
            index: HashMap::new(),
            adjacency: Vec::new(),
        };

        for edge in edges {
            let from = graph.intern(&edge.from_code);
            let to = graph.intern(&edge.to_code);
            let forward = edge.transform();
            graph.adjacency[from].push(Hop {
                to,
                transform: forward,
            });
            graph.adjacency[to].push(Hop {
                to: from,
                transform: forward.invert(),
            });
        }

        graph
    }

    fn intern(&mut self, code: &UnitCode) -> usize {
        if let Some(&idx) = self.index.get(code) {
            return idx;
        }
        let idx = self.adjacency.len();
        self.index.insert(code.clone(), idx);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Number of units known to this graph
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Find the shortest-hop path from `from` to `to` and compose its
    /// transforms into one net affine map. `None` when no path exists.
    pub fn compose_path(&self, from: &UnitCode, to: &UnitCode) -> Option<Affine> {
        let start = *self.index.get(from)?;
        let goal = *self.index.get(to)?;
        if start == goal {
            return Some(Affine::IDENTITY);
        }

        // BFS with predecessor tracking; prev[n] = (parent, arc transform)
        let mut prev: Vec<Option<(usize, Affine)>> = vec![None; self.adjacency.len()];
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for hop in &self.adjacency[node] {
                if visited[hop.to] {
                    continue;
                }
                visited[hop.to] = true;
                prev[hop.to] = Some((node, hop.transform));
                if hop.to == goal {
                    return Some(self.compose_back(&prev, start, goal));
                }
                queue.push_back(hop.to);
            }
        }

        None
    }

    /// Walk the predecessor chain from `goal` back to `start`, then
    /// fold the per-arc transforms in source-to-target order.
    fn compose_back(&self, prev: &[Option<(usize, Affine)>], start: usize, goal: usize) -> Affine {
        let mut arcs = Vec::new();
        let mut node = goal;
        while node != start {
            let (parent, transform) = prev[node].expect("BFS predecessor chain broken");
            arcs.push(transform);
            node = parent;
        }
        arcs.reverse();

        let mut net = Affine::IDENTITY;
        for arc in arcs {
            net = net.then(&arc);
        }
        net
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn code(s: &str) -> UnitCode {
        UnitCode::new(s).unwrap()
    }

    fn edge(from: &str, to: &str, factor: Decimal, offset: Decimal) -> ConversionEdge {
        ConversionEdge::new(code(from), code(to), factor, offset, "test".to_string())
    }

    const EPS: Decimal = dec!(0.000000001);

    #[test]
    fn test_direct_edge() {
        let edges = vec![edge("cm", "m", dec!(0.01), Decimal::ZERO)];
        let graph = DimensionGraph::build(&edges);
        let t = graph.compose_path(&code("cm"), &code("m")).unwrap();
        assert_eq!(t.apply(dec!(250)), dec!(2.50));
    }

    #[test]
    fn test_reverse_traversal_uses_inverse() {
        let edges = vec![edge("cm", "m", dec!(0.01), Decimal::ZERO)];
        let graph = DimensionGraph::build(&edges);
        let t = graph.compose_path(&code("m"), &code("cm")).unwrap();
        assert_eq!(t.apply(dec!(2.5)), dec!(250));
    }

    #[test]
    fn test_multi_hop_through_base() {
        // cm -> m and km -> m; cm -> km goes through the base unit m
        let edges = vec![
            edge("cm", "m", dec!(0.01), Decimal::ZERO),
            edge("km", "m", dec!(1000), Decimal::ZERO),
        ];
        let graph = DimensionGraph::build(&edges);
        let t = graph.compose_path(&code("cm"), &code("km")).unwrap();
        assert!((t.apply(dec!(250000)) - dec!(2.5)).abs() <= EPS);
    }

    #[test]
    fn test_affine_multi_hop() {
        // f -> c via inverse of c->f, then c -> k
        let edges = vec![
            edge("c", "f", dec!(1.8), dec!(32)),
            edge("c", "k", Decimal::ONE, dec!(273.15)),
        ];
        let graph = DimensionGraph::build(&edges);
        let f_to_k = graph.compose_path(&code("f"), &code("k")).unwrap();
        assert!((f_to_k.apply(dec!(32)) - dec!(273.15)).abs() <= EPS);
        assert!((f_to_k.apply(dec!(212)) - dec!(373.15)).abs() <= EPS);
    }

    #[test]
    fn test_no_path_in_disconnected_graph() {
        let edges = vec![
            edge("cm", "m", dec!(0.01), Decimal::ZERO),
            edge("in", "ft", dec!(0.0833333333), Decimal::ZERO),
        ];
        let graph = DimensionGraph::build(&edges);
        assert!(graph.compose_path(&code("cm"), &code("in")).is_none());
    }

    #[test]
    fn test_unknown_node_is_no_path() {
        let edges = vec![edge("cm", "m", dec!(0.01), Decimal::ZERO)];
        let graph = DimensionGraph::build(&edges);
        assert!(graph.compose_path(&code("cm"), &code("furlong")).is_none());
    }

    #[test]
    fn test_same_node_is_identity() {
        let edges = vec![edge("cm", "m", dec!(0.01), Decimal::ZERO)];
        let graph = DimensionGraph::build(&edges);
        let t = graph.compose_path(&code("cm"), &code("cm")).unwrap();
        assert_eq!(t, Affine::IDENTITY);
    }

    #[test]
    fn test_shortest_path_wins() {
        // Direct mm -> m plus a longer mm -> cm -> m chain with a
        // deliberately wrong factor; shortest hop count must win.
        let edges = vec![
            edge("mm", "cm", dec!(0.5), Decimal::ZERO), // wrong on purpose
            edge("cm", "m", dec!(0.01), Decimal::ZERO),
            edge("mm", "m", dec!(0.001), Decimal::ZERO),
        ];
        let graph = DimensionGraph::build(&edges);
        let t = graph.compose_path(&code("mm"), &code("m")).unwrap();
        assert_eq!(t.apply(dec!(1000)), dec!(1.000));
    }
}
