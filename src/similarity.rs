use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::force::LinkForce;
use crate::graph::{Link, Node};

/// Pairwise similarity between two handles, as served by the similarity API.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Similarity {
    pub source_handle: String,
    pub target_handle: String,
    pub strength: f64,
}

pub fn parse_similarities(raw: &str) -> Result<Vec<Similarity>> {
    serde_json::from_str(raw).context("invalid similarities JSON")
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrengthStats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub std_dev: f64,
}

impl StrengthStats {
    pub fn from_similarities(records: &[Similarity]) -> Result<Self> {
        if records.is_empty() {
            return Err(anyhow!("no similarities to summarize"));
        }

        let count = records.len() as f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for record in records {
            min = min.min(record.strength);
            max = max.max(record.strength);
            sum += record.strength;
        }

        let average = sum / count;
        let variance = records
            .iter()
            .map(|record| (record.strength - average).powi(2))
            .sum::<f64>()
            / count;

        Ok(Self {
            min,
            max,
            average,
            std_dev: variance.sqrt(),
        })
    }
}

/// Handle graph: one node per distinct handle, one link per similarity.
#[derive(Clone, Debug)]
pub struct SimilarityGraph {
    pub nodes: Vec<Node<String>>,
    pub links: Vec<Link<String, f64>>,
}

impl SimilarityGraph {
    pub fn build(records: &[Similarity]) -> Self {
        let mut seen = HashSet::new();
        let handles = records
            .iter()
            .map(|record| &record.source_handle)
            .chain(records.iter().map(|record| &record.target_handle));

        let mut nodes = Vec::new();
        for handle in handles {
            if seen.insert(handle.as_str()) {
                nodes.push(Node::new(handle.clone()));
            }
        }

        let links = records
            .iter()
            .map(|record| {
                Link::new(
                    record.source_handle.clone(),
                    record.target_handle.clone(),
                    record.strength,
                )
            })
            .collect();

        Self { nodes, links }
    }

    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.nodes.shuffle(&mut rng);
        self.links.shuffle(&mut rng);
    }

    /// Link force keyed by handle. Links stronger than `cutoff` attract,
    /// weaker ones repel.
    pub fn link_force(
        &self,
        cutoff: f64,
        iterations: usize,
    ) -> LinkForce<String, f64, String> {
        let mut force = LinkForce::with_id(self.links.clone(), |node: &Node<String>, _, _| {
            node.data.clone()
        });
        force
            .set_distance(0.0)
            .set_strength_with(move |link, _, _| link.data - cutoff)
            .set_iterations(iterations);
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, target: &str, strength: f64) -> Similarity {
        Similarity {
            source_handle: source.to_string(),
            target_handle: target.to_string(),
            strength,
        }
    }

    #[test]
    fn nodes_follow_first_appearance_sources_then_targets() {
        let records = [
            record("b", "a", 0.1),
            record("c", "b", 0.2),
            record("b", "d", 0.3),
        ];
        let graph = SimilarityGraph::build(&records);
        let ids = graph
            .nodes
            .iter()
            .map(|node| node.data.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["b", "c", "a", "d"]);
        assert_eq!(graph.links.len(), 3);
    }

    #[test]
    fn stats_use_population_deviation() {
        let records = [record("a", "b", 2.0), record("a", "c", 4.0)];
        let stats = StrengthStats::from_similarities(&records).unwrap();
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.average, 3.0);
        assert_eq!(stats.std_dev, 1.0);
    }

    #[test]
    fn stats_reject_empty_input() {
        assert!(StrengthStats::from_similarities(&[]).is_err());
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let raw = r#"[{"source_handle":"a","target_handle":"b","strength":0.5,"_id":"x"}]"#;
        let parsed = parse_similarities(raw).unwrap();
        assert_eq!(parsed, [record("a", "b", 0.5)]);
        assert!(parse_similarities("{}").is_err());
    }
}
