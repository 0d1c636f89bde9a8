//! Random-graph generation and degree statistics.

use anyhow::{Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use std::collections::BTreeMap;

/// Simple undirected graph stored as an adjacency list.
///
/// Prepared prototype networks contain no self-loops and no isolated
/// nodes; each stochastic run works on a fresh clone.
#[derive(Debug, Clone)]
pub struct Network {
    adj: Vec<Vec<usize>>,
}

impl Network {
    /// Generate an Erdos-Renyi graph G(n, kmean / n), then strip
    /// isolated nodes so every surviving degree is positive.
    pub fn erdos_renyi(n: usize, kmean: f64, rng: &mut ChaCha12Rng) -> Result<Self> {
        if n == 0 {
            bail!("network order must be positive");
        }
        let p = (kmean / n as f64).min(1.0);
        let edge_dist = Bernoulli::new(p)?;

        let mut adj = vec![Vec::new(); n];
        for i in 0..n {
            for j in (i + 1)..n {
                if edge_dist.sample(rng) {
                    adj[i].push(j);
                    adj[j].push(i);
                }
            }
        }

        let g = Self { adj }.without_isolates();
        if g.order() == 0 {
            bail!("prototype network has no surviving nodes");
        }
        Ok(g)
    }

    /// Build a graph from an explicit edge list over `n` nodes.
    ///
    /// Self-loops are rejected; isolated nodes are kept, since this
    /// constructor also serves percolated (damaged) graphs.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self> {
        let mut adj = vec![Vec::new(); n];
        for &(i, j) in edges {
            if i == j {
                bail!("self-loop on node {i}");
            }
            if i >= n || j >= n {
                bail!("edge ({i}, {j}) out of bounds for order {n}");
            }
            adj[i].push(j);
            adj[j].push(i);
        }
        Ok(Self { adj })
    }

    /// Drop all degree-zero nodes, relabeling the survivors.
    fn without_isolates(self) -> Self {
        let mut relabel = vec![usize::MAX; self.adj.len()];
        let mut next = 0;
        for (node, neighbors) in self.adj.iter().enumerate() {
            if !neighbors.is_empty() {
                relabel[node] = next;
                next += 1;
            }
        }

        let mut adj = vec![Vec::new(); next];
        for (node, neighbors) in self.adj.iter().enumerate() {
            if !neighbors.is_empty() {
                adj[relabel[node]] = neighbors.iter().map(|&m| relabel[m]).collect();
            }
        }
        Self { adj }
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.adj.len()
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.adj.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Degree of a node.
    pub fn degree(&self, node: usize) -> usize {
        self.adj[node].len()
    }

    /// Edge list with each edge reported once, `(i, j)` with `i < j`.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(self.size());
        for (i, neighbors) in self.adj.iter().enumerate() {
            for &j in neighbors {
                if i < j {
                    edges.push((i, j));
                }
            }
        }
        edges
    }

    /// Node counts per degree.
    pub fn degree_composition(&self) -> BTreeMap<usize, usize> {
        let mut nk = BTreeMap::new();
        for node in 0..self.order() {
            *nk.entry(self.degree(node)).or_insert(0) += 1;
        }
        nk
    }

    /// Fraction of nodes per degree, over the current node set.
    pub fn degree_distribution(&self) -> BTreeMap<usize, f64> {
        let inv_order = 1.0 / self.order() as f64;
        let mut pk = BTreeMap::new();
        for node in 0..self.order() {
            *pk.entry(self.degree(node)).or_insert(0.0) += inv_order;
        }
        pk
    }

    /// Size of the largest connected component (BFS over all nodes).
    pub fn largest_component(&self) -> usize {
        let mut visited = vec![false; self.order()];
        let mut largest = 0;
        let mut queue = Vec::new();

        for start in 0..self.order() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            queue.push(start);
            let mut size = 0;
            while let Some(node) = queue.pop() {
                size += 1;
                for &next in &self.adj[node] {
                    if !visited[next] {
                        visited[next] = true;
                        queue.push(next);
                    }
                }
            }
            largest = largest.max(size);
        }
        largest
    }
}

/// Mean of a degree distribution, `sum_k k * P(k)`.
pub fn mean_degree(pk: &BTreeMap<usize, f64>) -> f64 {
    pk.iter().map(|(&k, &p)| k as f64 * p).sum()
}
