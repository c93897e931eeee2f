use std::str::FromStr;

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

use super::{Accumulable, Graph, WeightedGraph};

/// Activity fields of one cell-category log line. Empty fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Activity {
    pub sms_in: Option<f64>,
    pub sms_out: Option<f64>,
    pub call_in: Option<f64>,
    pub call_out: Option<f64>,
    pub internet: Option<f64>,
}

/// Running sum of one traffic direction plus the number of contributing lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionalSum {
    pub total: f64,
    pub count: u64,
}

impl DirectionalSum {
    /// Only present, nonzero values count as an occurrence.
    #[inline]
    pub fn record(&mut self, value: Option<f64>) {
        if let Some(v) = value.filter(|v| *v != 0.0) {
            self.total += v;
            self.count += 1;
        }
    }

    /// Average per occurrence; zero when nothing was recorded.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.count > 0 { self.total / self.count as f64 } else { 0.0 }
    }

    #[inline]
    fn absorb(&mut self, other: Self) {
        self.total += other.total;
        self.count += other.count;
    }
}

/// Accumulated cell-category activity for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityTally {
    pub sms_in: DirectionalSum,
    pub sms_out: DirectionalSum,
    pub call_in: DirectionalSum,
    pub call_out: DirectionalSum,
    pub internet: f64,
}

/// Which traffic type becomes the edge weight of a tally graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Call,
    Sms,
    Internet,
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" | "calls" => Ok(Channel::Call),
            "sms" => Ok(Channel::Sms),
            "internet" => Ok(Channel::Internet),
            other => Err(anyhow!("Unknown channel: {other:?} (expected call, sms or internet)")),
        }
    }
}

impl ActivityTally {
    /// Fold one log line into the tally.
    pub fn record(&mut self, activity: &Activity) {
        self.sms_in.record(activity.sms_in);
        self.sms_out.record(activity.sms_out);
        self.call_in.record(activity.call_in);
        self.call_out.record(activity.call_out);
        self.internet += activity.internet.unwrap_or(0.0);
    }

    /// Undirected weight for `channel`: the per-direction means summed, or the
    /// raw internet total.
    pub fn weight(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Call => self.call_in.mean() + self.call_out.mean(),
            Channel::Sms => self.sms_in.mean() + self.sms_out.mean(),
            Channel::Internet => self.internet,
        }
    }
}

impl Accumulable for ActivityTally {
    fn absorb(&mut self, other: Self) {
        self.sms_in.absorb(other.sms_in);
        self.sms_out.absorb(other.sms_out);
        self.call_in.absorb(other.call_in);
        self.call_out.absorb(other.call_out);
        self.internet += other.internet;
    }
}

/// Graph whose edges carry raw cell-category activity.
pub type TallyGraph = Graph<ActivityTally>;

impl TallyGraph {
    /// Collapse each tally into a single weight for `channel`. Nodes and their
    /// attributes carry over; edges are kept even when their weight is zero.
    pub fn to_weighted(&self, channel: Channel) -> WeightedGraph {
        let mut graph = WeightedGraph::new();
        for (node, attrs) in self.nodes() {
            graph.add_node(node.clone()).clone_from(attrs);
        }
        for (key, tally) in self.edges_sorted() {
            let (a, b) = key.endpoints();
            graph.add_weight(a.clone(), b.clone(), tally.weight(channel));
        }
        graph
    }
}
