//! Graph build and cache configuration.

use crate::layout::LayoutConfig;
use crate::model::EdgeWeight;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weight assigned to each relationship kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeWeights {
    /// Episode mentions a book explicitly.
    pub explicit_mention: EdgeWeight,
    /// Episode and book co-occur without an explicit mention.
    pub inferred_mention: EdgeWeight,
    pub host: EdgeWeight,
    pub guest: EdgeWeight,
    pub contains_quote: EdgeWeight,
    pub quotes_from: EdgeWeight,
    pub said_by: EdgeWeight,
    pub discusses: EdgeWeight,
    pub explores: EdgeWeight,
    pub authored: EdgeWeight,
    /// Topic and concept linked through an episode that mentions the book.
    pub related: EdgeWeight,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            explicit_mention: EdgeWeight::Strong,
            inferred_mention: EdgeWeight::Medium,
            host: EdgeWeight::Strong,
            guest: EdgeWeight::Medium,
            contains_quote: EdgeWeight::Strong,
            quotes_from: EdgeWeight::Strong,
            said_by: EdgeWeight::Medium,
            discusses: EdgeWeight::Medium,
            explores: EdgeWeight::Medium,
            authored: EdgeWeight::Strong,
            related: EdgeWeight::Weak,
        }
    }
}

/// Configuration for building and serving the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// How long a built graph is served before it is rebuilt.
    pub ttl_secs: u64,
    /// Default hop limit for path finding.
    pub max_path_depth: usize,
    pub layout: LayoutConfig,
    pub weights: EdgeWeights,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_path_depth: 5,
            layout: LayoutConfig::default(),
            weights: EdgeWeights::default(),
        }
    }
}

impl GraphConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
