//! Engine facade: top-level API for the orthograph system.
//!
//! The `Engine` owns every store, the task queue and the worker pool, and
//! provides the public interface for ingesting documents, querying counts
//! and dumps, and resetting all state.

use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EngineError, OrthoResult};
use crate::graph::{OrthoIndex, TokenGraph};
use crate::query::{self, DimsOrder};
use crate::queue::{TaskKind, TaskQueue};
use crate::segment;
use crate::store::DedupStore;
use crate::vocab::Vocabulary;
use crate::worker;

/// Configuration for the orthograph engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads draining the task queue.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Outstanding tasks at which ingestion is refused.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Longest sentence fragment recorded as a chain.
    #[serde(default = "default_max_chain_len")]
    pub max_chain_len: usize,
    /// How `dims` queries are compared with orthotope dims.
    #[serde(default)]
    pub dims_order: DimsOrder,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, 8)
}

fn default_max_pending() -> usize {
    1_000_000
}

fn default_max_chain_len() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_pending: default_max_pending(),
            max_chain_len: default_max_chain_len(),
            dims_order: DimsOrder::default(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "workers".into(),
                message: "at least one worker is required".into(),
            });
        }
        if self.max_pending == 0 {
            return Err(ConfigError::Invalid {
                key: "max_pending".into(),
                message: "must be positive".into(),
            });
        }
        if self.max_chain_len < 3 {
            return Err(ConfigError::Invalid {
                key: "max_chain_len".into(),
                message: format!("must be at least 3, got {}", self.max_chain_len),
            });
        }
        Ok(())
    }
}

/// State shared between the facade and the workers.
pub(crate) struct Core {
    pub(crate) vocab: Vocabulary,
    pub(crate) store: DedupStore,
    pub(crate) graph: TokenGraph,
    pub(crate) orthos: OrthoIndex,
    pub(crate) queue: TaskQueue,
    /// Held shared by ingestion and task processing, exclusively by reset.
    pub(crate) barrier: RwLock<()>,
    pub(crate) max_chain_len: usize,
}

impl Core {
    fn new(config: &EngineConfig) -> Self {
        Self {
            vocab: Vocabulary::new(),
            store: DedupStore::new(),
            graph: TokenGraph::new(),
            orthos: OrthoIndex::new(),
            queue: TaskQueue::new(config.max_pending),
            barrier: RwLock::new(()),
            max_chain_len: config.max_chain_len,
        }
    }

    /// Shared hold on the reset barrier. Readers under it see either the
    /// state before a reset or the empty state after it.
    pub(crate) fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.barrier.read().expect("reset barrier poisoned")
    }
}

/// What `add` did with a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    /// The submitted title, echoed back.
    pub title: String,
    /// Whether the body was new content.
    pub new_phrase: bool,
    /// Sentences not seen before.
    pub new_sentences: usize,
}

/// The orthograph engine.
pub struct Engine {
    config: EngineConfig,
    core: Arc<Core>,
    workers: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Create an engine and start its worker pool.
    pub fn new(config: EngineConfig) -> OrthoResult<Self> {
        config.validate()?;

        let core = Arc::new(Core::new(&config));

        let mut workers = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let shared = Arc::clone(&core);
            let spawned = std::thread::Builder::new()
                .name(format!("ortho-worker-{index}"))
                .spawn(move || worker::run(shared));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    core.queue.shutdown();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(EngineError::WorkerSpawn { index, source }.into());
                }
            }
        }

        tracing::info!(
            workers = config.workers,
            max_pending = config.max_pending,
            max_chain_len = config.max_chain_len,
            "orthograph engine initialized"
        );

        Ok(Self {
            config,
            core,
            workers,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Accept a document: segment it, intern its content, and queue the new
    /// sentences for processing. Returns without waiting for discovery.
    pub fn add(&self, title: &str, body: &str) -> OrthoResult<Admission> {
        let _barrier = self.core.shared();
        if let Err(err) = self.core.queue.check_capacity() {
            tracing::warn!(title, error = %err, "document refused");
            return Err(err.into());
        }

        let sentences = segment::sentences(body);
        let phrase = self
            .core
            .store
            .intern_phrase(title, &segment::canonical_text(&sentences));
        if !phrase.is_new {
            tracing::debug!(title, phrase = %phrase.id, "duplicate document ignored");
            return Ok(Admission {
                title: title.to_string(),
                new_phrase: false,
                new_sentences: 0,
            });
        }

        let roots: Vec<TaskKind> = sentences
            .iter()
            .filter_map(|words| {
                let tokens = self.core.vocab.intern_all(words);
                let sentence = self.core.store.intern_sentence(&tokens);
                sentence.is_new.then_some(TaskKind::Sentence(sentence.id))
            })
            .collect();
        let new_sentences = roots.len();
        self.core.queue.push_roots(roots)?;

        tracing::info!(
            title,
            sentences = sentences.len(),
            new_sentences,
            "document accepted"
        );
        Ok(Admission {
            title: title.to_string(),
            new_phrase: true,
            new_sentences,
        })
    }

    /// Clear every store and drop all outstanding work.
    pub fn reset(&self) {
        let _barrier = self.core.barrier.write().expect("reset barrier poisoned");
        let epoch = self.core.queue.reset();
        self.core.orthos.clear();
        self.core.graph.clear();
        self.core.store.clear();
        self.core.vocab.clear();
        tracing::info!(epoch, "engine reset");
    }

    /// Block until all queued work has been processed.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.core.queue.wait_idle(timeout)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn sentence_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.store.sentence_count()
    }

    pub fn pair_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.store.pair_count()
    }

    pub fn phrase_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.store.phrase_count()
    }

    pub fn chain_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.store.chain_count()
    }

    pub fn token_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.vocab.len()
    }

    /// Tasks waiting or being processed.
    pub fn pending_task_count(&self) -> usize {
        self.core.queue.outstanding()
    }

    /// Highest generation among outstanding tasks, 0 once settled.
    pub fn max_in_flight_generation(&self) -> u32 {
        self.core.queue.depth()
    }

    /// Total number of orthotopes.
    pub fn ortho_count(&self) -> usize {
        let _barrier = self.core.shared();
        self.core.orthos.len()
    }

    /// Orthotopes whose dims match `dims`.
    pub fn ortho_count_dims(&self, dims: &[usize]) -> usize {
        let _barrier = self.core.shared();
        self.core.orthos.count_matching(dims, self.config.dims_order)
    }

    /// Like [`ortho_count_dims`](Self::ortho_count_dims), parsing a
    /// comma-separated query first.
    pub fn ortho_count_query(&self, dims: &str) -> OrthoResult<usize> {
        Ok(self.ortho_count_dims(&query::parse_dims(dims)?))
    }

    /// Text dump of every orthotope whose dims match `dims`.
    pub fn splat_dims(&self, dims: &[usize]) -> String {
        let _barrier = self.core.shared();
        let matching = self.core.orthos.matching(dims, self.config.dims_order);
        query::render_all(matching.iter().map(|o| o.as_ref()), |t| {
            self.core.vocab.label(t)
        })
    }

    pub fn splat(&self, dims: &str) -> OrthoResult<String> {
        Ok(self.splat_dims(&query::parse_dims(dims)?))
    }

    /// Titles of accepted documents in acceptance order.
    pub fn titles(&self) -> Vec<String> {
        let _barrier = self.core.shared();
        self.core.store.titles()
    }

    /// Snapshot of engine statistics.
    ///
    /// Store counts are read under one hold of the reset barrier, so they
    /// never mix state from both sides of a reset.
    pub fn info(&self) -> EngineInfo {
        let _barrier = self.core.shared();
        let core = &self.core;
        EngineInfo {
            workers: self.workers.len(),
            tokens: core.vocab.len(),
            sentences: core.store.sentence_count(),
            pairs: core.store.pair_count(),
            chains: core.store.chain_count(),
            phrases: core.store.phrase_count(),
            orthos: core.orthos.len(),
            pending: core.queue.outstanding(),
            depth: core.queue.depth(),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.core.queue.shutdown();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("worker thread panicked");
            }
        }
    }
}

/// Engine statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub workers: usize,
    pub tokens: usize,
    pub sentences: usize,
    pub pairs: usize,
    pub chains: usize,
    pub phrases: usize,
    pub orthos: usize,
    pub pending: usize,
    pub depth: u32,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "orthograph engine info")?;
        writeln!(f, "  workers:    {}", self.workers)?;
        writeln!(f, "  tokens:     {}", self.tokens)?;
        writeln!(f, "  sentences:  {}", self.sentences)?;
        writeln!(f, "  pairs:      {}", self.pairs)?;
        writeln!(f, "  chains:     {}", self.chains)?;
        writeln!(f, "  phrases:    {}", self.phrases)?;
        writeln!(f, "  orthos:     {}", self.orthos)?;
        writeln!(f, "  pending:    {}", self.pending)?;
        writeln!(f, "  depth:      {}", self.depth)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("graph", &self.core.graph)
            .field("orthos", &self.core.orthos)
            .finish()
    }
}
