//! Depth-first exploration of the choice tree with conflict-directed
//! backjumping

use crate::conflict::{Conflict, ConflictExplanation, ConflictSet, SearchStats, Var};
use crate::state::SearchState;
use crate::tree::{invariant, Candidate, ChoiceNode, Halt, Node, TreeBuilder};
use sprout_errors::ResolverError;
use sprout_events::{EventEmitter, EventSender, ResolverEvent};
use tracing::{debug, trace};

/// A choice node on the work stack with the conflicts of its failed options
struct Frame {
    state: SearchState,
    var: Var,
    reason: ConflictSet,
    options: std::vec::IntoIter<Candidate>,
    no_options: bool,
    set: ConflictSet,
    trace: Vec<ConflictExplanation>,
}

impl Frame {
    fn new(state: SearchState, choice: ChoiceNode) -> Self {
        Self {
            no_options: choice.options.is_empty(),
            state,
            var: choice.var,
            reason: choice.reason,
            options: choice.options.into_iter(),
            set: ConflictSet::new(),
            trace: Vec::new(),
        }
    }

    fn absorb(&mut self, conflict: Conflict, max_trace: usize) {
        self.set.union_with(&conflict.set);
        let room = max_trace.saturating_sub(self.trace.len());
        self.trace.extend(conflict.trace.into_iter().take(room));
    }

    /// `(∪C) \ {v} ∪ R(v)`, or `{v} ∪ R(v)` for a node without options
    fn into_conflict(mut self) -> Conflict {
        self.set.remove(&self.var);
        if self.no_options {
            self.set.insert(self.var.clone());
        }
        self.set.union_with(&self.reason);
        trace!(var = %self.var, conflict = %self.set, "options exhausted");
        Conflict {
            set: self.set,
            trace: self.trace,
        }
    }
}

pub(crate) struct Explorer<'t, 'a> {
    tree: &'t TreeBuilder<'a>,
    max_backjumps: Option<u64>,
    max_trace: usize,
    stats: SearchStats,
    event_sender: Option<&'t EventSender>,
}

impl EventEmitter for Explorer<'_, '_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender
    }
}

impl<'t, 'a> Explorer<'t, 'a> {
    pub(crate) fn new(
        tree: &'t TreeBuilder<'a>,
        max_backjumps: Option<u64>,
        max_trace: usize,
        event_sender: Option<&'t EventSender>,
    ) -> Self {
        Self {
            tree,
            max_backjumps,
            max_trace,
            stats: SearchStats::default(),
            event_sender,
        }
    }

    pub(crate) fn stats(&self) -> SearchStats {
        self.stats
    }

    /// First complete assignment below `root`, in preference order
    ///
    /// Open decisions live on a heap-allocated stack, so the search depth
    /// is bounded by memory rather than by the thread's stack.
    pub(crate) fn run(&mut self, root: SearchState) -> Result<SearchState, Halt> {
        let mut stack: Vec<Frame> = Vec::new();
        let mut next = root;

        loop {
            self.stats.nodes += 1;
            let mut failed = match self.tree.expand(&next)? {
                Node::Done => return Ok(next),
                Node::Fail(conflict) => Some(conflict),
                Node::Choice(choice) => {
                    trace!(var = %choice.var, options = choice.options.len(), "choice");
                    stack.push(Frame::new(next, choice));
                    None
                }
            };

            // Unwind failures and pick the next option to descend into
            next = loop {
                let Some(frame) = stack.last_mut() else {
                    return Err(failed.map_or_else(
                        || Halt::Abort(invariant("search ended without a conflict")),
                        Halt::Conflict,
                    ));
                };

                if let Some(conflict) = failed.take() {
                    if !conflict.set.contains(&frame.var) {
                        // Other options of this decision cannot fix a conflict that does not involve it
                        let skipped = frame.var.to_string();
                        stack.pop();
                        self.backjump(&skipped, &conflict)?;
                        failed = Some(conflict);
                        continue;
                    }
                    frame.absorb(conflict, self.max_trace);
                }

                let Some(candidate) = frame.options.next() else {
                    failed = stack.pop().map(Frame::into_conflict);
                    continue;
                };
                if let Some(conflict) = candidate.rejection {
                    failed = Some(conflict);
                    continue;
                }
                match self.tree.apply(&frame.state, &frame.var, &candidate.value) {
                    Ok(child) => break child,
                    Err(Halt::Conflict(conflict)) => failed = Some(conflict),
                    Err(abort @ Halt::Abort(_)) => return Err(abort),
                }
            };
        }
    }

    fn backjump(&mut self, skipped: &str, conflict: &Conflict) -> Result<(), Halt> {
        self.stats.backjumps += 1;
        debug!(skipped, conflict = %conflict.set, "backjump");
        self.emit_resolver(ResolverEvent::Backjumped {
            skipped: skipped.to_string(),
            conflict: conflict.set.iter().map(ToString::to_string).collect(),
        });

        match self.max_backjumps {
            Some(limit) if self.stats.backjumps > limit => {
                debug!(limit, "backjump limit reached");
                Err(Halt::Abort(
                    ResolverError::BackjumpLimitReached { limit }.into(),
                ))
            }
            _ => Ok(()),
        }
    }
}
