//! Worker loop: drain the task queue, update the stores, run the matcher.
//!
//! Each task is processed under a shared hold on the reset barrier, so a
//! reset never observes half-processed work and never leaves stale results
//! behind.

use std::sync::Arc;

use crate::engine::Core;
use crate::matcher::{self, Stores, Trigger};
use crate::ortho::Ortho;
use crate::queue::{Task, TaskKind};

/// Run until the queue shuts down.
pub(crate) fn run(core: Arc<Core>) {
    while let Some(task) = core.queue.next() {
        {
            let _barrier = core.shared();
            if task.epoch == core.queue.epoch() {
                let followups = process(&core, &task);
                core.queue.push_followups(&task, followups);
            } else {
                tracing::debug!(epoch = task.epoch, "dropping task from a previous epoch");
            }
        }
        core.queue.finish(&task);
    }
    tracing::debug!("worker stopped");
}

/// Apply one task and return the follow-up work it produced.
pub(crate) fn process(core: &Core, task: &Task) -> Vec<TaskKind> {
    match task.kind {
        TaskKind::Sentence(id) => match core.store.sentence(id) {
            Some(tokens) => expand_sentence(core, &tokens),
            None => {
                tracing::warn!(sentence = %id, "sentence vanished before processing");
                vec![]
            }
        },
        TaskKind::Pair { from, to } => {
            let found = matcher::discover(&stores(core), Trigger::Edge { from, to });
            keep(core, task, found)
        }
        TaskKind::Chain(id) => match core.store.chain(id) {
            Some(tokens) => {
                let found = matcher::discover(&stores(core), Trigger::Chain(&tokens[..]));
                keep(core, task, found)
            }
            None => vec![],
        },
        TaskKind::Ortho(id) => match core.orthos.get(id) {
            Some(ortho) => {
                let found = matcher::discover(&stores(core), Trigger::Ortho(&ortho));
                keep(core, task, found)
            }
            None => vec![],
        },
    }
}

fn stores(core: &Core) -> Stores<'_> {
    Stores {
        graph: &core.graph,
        store: &core.store,
        orthos: &core.orthos,
    }
}

/// Intern every adjacent pair direction and every chain of a sentence.
fn expand_sentence(core: &Core, tokens: &[crate::id::TokenId]) -> Vec<TaskKind> {
    let mut followups = Vec::new();

    for window in tokens.windows(2) {
        let (from, to) = (window[0], window[1]);
        let Some(pair) = core.store.intern_pair(from, to) else {
            continue;
        };
        if pair.direction_is_new {
            core.graph.add_edge(from, to, pair.id);
            followups.push(TaskKind::Pair { from, to });
        }
    }

    for start in 0..tokens.len() {
        let longest = tokens.len().min(start + core.max_chain_len);
        for end in (start + 3)..=longest {
            let chain = core.store.intern_chain(&tokens[start..end]);
            if chain.is_new {
                followups.push(TaskKind::Chain(chain.id));
            }
        }
    }
    followups
}

/// Insert discovered orthotopes; each new one becomes a follow-up.
fn keep(core: &Core, task: &Task, found: Vec<Ortho>) -> Vec<TaskKind> {
    found
        .into_iter()
        .filter_map(|ortho| {
            let dims = ortho.dims();
            let interned = core.orthos.insert(ortho);
            interned.is_new.then(|| {
                tracing::debug!(
                    ortho = %interned.id,
                    ?dims,
                    generation = task.generation,
                    "orthotope discovered"
                );
                TaskKind::Ortho(interned.id)
            })
        })
        .collect()
}
