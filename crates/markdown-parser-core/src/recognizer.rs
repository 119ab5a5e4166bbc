//! # Recognizer contract
//!
//! A recognizer is a small state machine tried at the current cursor
//! position. `make_node` either declines (`None`, caret untouched),
//! opens a structural node (`Node`, pushed onto the open stack), or
//! returns a list of already-complete nodes appended without pushing.
//! `close` is asked, once per scan step, whether the node at the top
//! of the stack should be considered finished.

use crate::diagnostics::Diagnostics;
use crate::node::{NodeId, Tree};
use crate::scanner::Scanner;

/// Injectable "code sink" capability for `?py`/`?py_eval` processing
/// instructions and `<% %>` eval blocks. The core never executes
/// anything itself; a host that embeds a real interpreter plugs one of
/// these in. [`crate::dispatcher::run`] falls back to an
/// always-fails implementation when none is supplied.
pub trait CodeSink {
    /// Attempt to compile/evaluate `source` in `mode` (`"exec"` or
    /// `"eval"`). `Ok(())` means the attempt is considered to have
    /// succeeded; `Err(message)` becomes the `python_pi_error` node's
    /// `CData` body.
    fn compile(&self, uri: &str, source: &str, mode: &str) -> Result<(), String>;
}

/// What `make_node` produced.
pub enum MakeResult {
    /// Not applicable here; caret must be unchanged.
    None,
    /// Opens a structural node; becomes the new open-stack top.
    Node(NodeId),
    /// Like `Node`, but also seeds the open frame's scratch state —
    /// per-open-node transient fields live on the dispatcher's stack,
    /// never on the node itself.
    NodeWithScratch(NodeId, crate::dispatcher::Scratch),
    /// Already-complete nodes, appended as children without pushing.
    List(Vec<NodeId>),
}

impl MakeResult {
    pub fn is_none(&self) -> bool {
        matches!(self, MakeResult::None)
    }
}

/// Everything a recognizer needs, threaded through by the dispatcher.
pub struct ParseCx<'a> {
    pub scanner: &'a mut Scanner,
    pub tree: &'a mut Tree,
    pub diagnostics: &'a mut Diagnostics,
    pub code_sink: &'a dyn CodeSink,
}

/// A pluggable node recognizer.
pub trait Recognizer {
    /// Stable name used by the context-trigger table and diagnostics
    /// module tag.
    fn name(&self) -> &'static str;

    fn make_node(&self, cx: &mut ParseCx<'_>) -> MakeResult;

    /// Called only for single-node returns from `make_node`. `None`
    /// means "not closable here, keep scanning inside"; `Some(pos)`
    /// means the node is closed as of `pos` (the recognizer may have
    /// advanced the scanner past the terminator before returning).
    /// `scratch` is this node's own open-frame state, seeded (if at
    /// all) by `make_node`'s `NodeWithScratch`.
    fn close(
        &self,
        _node: NodeId,
        _cx: &mut ParseCx<'_>,
        _scratch: &mut crate::dispatcher::Scratch,
    ) -> Option<crate::position::Position> {
        None
    }
}
