//! Selection runs: broad phase, parallel narrow phase, aggregation

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::{CacheError, CachedContent, ContentCache};
use crate::config::{ConfigError, EngineConfig, FilterConfig, SelectionConfig};
use crate::foundation::cancel::CancellationToken;
use crate::foundation::logging::WarnOnce;
use crate::pipeline::filter::NodeFilter;
use crate::pipeline::node::{evaluate_node, NodeContext};
use crate::spatial::{select_candidates, BoundsIndex};
use crate::world::{ContentProvider, NodeRemovalResult, PartitionRemovalResult, SelectionVolume};

/// Errors of selection runs and bounds builds
#[derive(Error, Debug)]
pub enum EngineError {
    /// Cache failure
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The run was cancelled; nothing it produced is returned
    #[error("run cancelled")]
    Cancelled,
}

/// Result type for selection runs and bounds builds
pub type EngineResult<T> = Result<T, EngineError>;

/// Input of one selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Volume to test against
    pub volume: SelectionVolume,
    /// Partitions to consider in addition to those found through cached bounds
    pub candidate_paths: Vec<String>,
    /// Node filters
    pub filter: FilterConfig,
}

impl SelectionRequest {
    /// Request with no extra candidates and no filters
    pub fn new(volume: SelectionVolume) -> Self {
        Self {
            volume,
            candidate_paths: Vec::new(),
            filter: FilterConfig::default(),
        }
    }
}

/// Output of one selection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Flagged nodes per partition, ordered by partition path
    pub results: Vec<PartitionRemovalResult>,
    /// Candidates left out for lack of cached bounds
    pub partitions_needing_bounds: Vec<String>,
    /// Number of partitions the narrow phase looked at
    pub partitions_evaluated: usize,
}

/// Runs selections against partitioned world content
pub struct SelectionEngine {
    content: Arc<dyn ContentProvider>,
    cache: Arc<ContentCache>,
    config: SelectionConfig,
    warnings: WarnOnce,
}

impl SelectionEngine {
    /// Engine over `content`, using `cache` for partition bounds
    pub fn new(content: Arc<dyn ContentProvider>, cache: Arc<ContentCache>, config: SelectionConfig) -> Self {
        Self {
            content,
            cache,
            config,
            warnings: WarnOnce::new(),
        }
    }

    /// Open the cache named by `config` and put it in front of `provider`
    pub fn open<P: ContentProvider + 'static>(provider: P, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let cache = Arc::new(ContentCache::open(config.cache)?);
        let content: Arc<dyn ContentProvider> = Arc::new(CachedContent::new(provider, Arc::clone(&cache)));
        Ok(Self::new(content, cache, config.selection))
    }

    /// Content layer the engine reads through
    pub fn content(&self) -> &Arc<dyn ContentProvider> {
        &self.content
    }

    /// Cache holding partition bounds
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Run settings
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Unknown node and shape types seen so far
    pub fn unsupported_types(&self) -> Vec<String> {
        self.warnings.reported()
    }

    /// Flag everything `volume` touches
    pub fn evaluate(
        &self,
        volume: &SelectionVolume,
        candidate_paths: &[String],
        filter: &FilterConfig,
    ) -> EngineResult<Vec<PartitionRemovalResult>> {
        let request = SelectionRequest {
            volume: volume.clone(),
            candidate_paths: candidate_paths.to_vec(),
            filter: filter.clone(),
        };
        Ok(self.run(&request, &CancellationToken::new())?.results)
    }

    /// Run a selection, checking `cancel` between partitions and nodes
    ///
    /// A cancelled run returns [`EngineError::Cancelled`] and no results.
    pub fn run(&self, request: &SelectionRequest, cancel: &CancellationToken) -> EngineResult<SelectionReport> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let started = Instant::now();

        if !self.cache.metadata()?.baseline_bounds_built {
            warn!("Baseline bounds have not been built; only candidate partitions can be found");
        }
        let index = BoundsIndex::load(&self.cache, self.config.include_added_content)?;
        let candidates = select_candidates(
            &index,
            self.content.as_ref(),
            &request.volume,
            &request.candidate_paths,
            &self.config,
        );
        info!(
            "Evaluating {} of {} partitions with bounds ({} candidates supplied)",
            candidates.partitions.len(),
            index.len(),
            request.candidate_paths.len()
        );

        let filter = NodeFilter::new(&request.filter)?;
        let context = NodeContext {
            content: self.content.as_ref(),
            selection: &request.volume,
            filter: &filter,
            warnings: &self.warnings,
            foliage_as_instanced: self.config.foliage_as_instanced,
        };

        let listening = self.cache.listen()?;
        let evaluated: Result<Vec<Option<PartitionRemovalResult>>, EngineError> = candidates
            .partitions
            .par_iter()
            .map(|path| evaluate_partition(&context, path, cancel))
            .collect();
        listening.finish()?;

        let mut results: Vec<PartitionRemovalResult> = evaluated?.into_iter().flatten().collect();
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        results.sort_by(|a, b| a.path.cmp(&b.path));

        info!(
            "Selection flagged {} nodes in {} partitions in {:.2?}",
            results.iter().map(|result| result.nodes.len()).sum::<usize>(),
            results.len(),
            started.elapsed()
        );
        Ok(SelectionReport {
            results,
            partitions_needing_bounds: candidates.needs_bounds,
            partitions_evaluated: candidates.partitions.len(),
        })
    }
}

fn evaluate_partition(
    context: &NodeContext<'_>,
    path: &str,
    cancel: &CancellationToken,
) -> EngineResult<Option<PartitionRemovalResult>> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    let Some(partition) = context.content.partition(path) else {
        warn!("Partition {path} could not be loaded, skipping it");
        return Ok(None);
    };

    let nodes: Result<Vec<Option<NodeRemovalResult>>, EngineError> = (0..partition.node_data.len())
        .into_par_iter()
        .map(|index| {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            Ok(evaluate_node(context, &partition, index))
        })
        .collect();
    let nodes: Vec<NodeRemovalResult> = nodes?.into_iter().flatten().collect();

    debug!("{path}: {} of {} nodes flagged", nodes.len(), partition.node_data.len());
    Ok(PartitionRemovalResult::from_nodes(path, partition.node_data.len(), nodes))
}
