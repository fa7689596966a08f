//! Bind-simplification pass
//!
//! Synchronization threads of kind `bind`/`try` exist purely to model a
//! wakeup: they are created, block on a read, fire, and resolve. Drawing
//! their creation and the wake as two separate facts clutters the picture
//! without adding causal information.
//!
//! This pass rewrites the finished forest: a bind/try thread whose first
//! recorded interaction is a `Read` (with no annotation before it) has its
//! creation hidden, its start moved to the wake time, and is reparented
//! under the thread it was woken by. It is a tree rewrite over a fully
//! reduced [`Vat`], not a fold step.

use crate::decode::ThreadKind;
use crate::domain::ThreadIndex;
use crate::vat::{InteractionKind, Thread, Vat};

/// Apply the rewrite to the whole forest, depth-first (children before the
/// parent's own list is evaluated).
pub fn simplify_binds(vat: &mut Vat) {
    rewrite_children(vat, Vat::TOP);
}

fn rewrite_children(vat: &mut Vat, parent: ThreadIndex) {
    let children = vat.thread(parent).children().to_vec();
    for &child in &children {
        rewrite_children(vat, child);
    }
    for child in children {
        rewrite_one(vat, parent, child);
    }
}

fn rewrite_one(vat: &mut Vat, parent: ThreadIndex, child: ThreadIndex) {
    let thread = vat.thread(child);
    if !matches!(thread.kind(), ThreadKind::Bind | ThreadKind::Try) {
        return;
    }
    let Some((wake_time, woken_by)) = first_wake(thread) else {
        return;
    };

    {
        let thread = vat.thread_mut(child);
        thread.show_creation = false;
        thread.start_time = wake_time;
    }

    if woken_by == parent {
        return;
    }
    // Never move a thread implied to be identity-continued by its own
    // creator.
    if vat.thread(child).becomes() == Some(parent) {
        return;
    }
    // Reparenting under a descendant would turn the forest into a cycle.
    if is_descendant(vat, child, woken_by) {
        return;
    }

    vat.thread_mut(parent).children.retain(|&c| c != child);
    vat.thread_mut(woken_by).children.push(child);
}

/// The wake fact: the thread's first interaction, provided it is a `Read`
/// and no label was recorded between the thread's start and that read.
/// (The reducer's fallback id label sits at the start time and does not
/// count as a recorded annotation.)
fn first_wake(thread: &Thread) -> Option<(f64, ThreadIndex)> {
    let first = thread.interactions().first()?;
    if first.kind != InteractionKind::Read {
        return None;
    }
    let annotated_before_wake = thread
        .labels()
        .iter()
        .any(|label| label.time > thread.start_time() && label.time < first.time);
    if annotated_before_wake {
        return None;
    }
    Some((first.time, first.other))
}

fn is_descendant(vat: &Vat, root: ThreadIndex, needle: ThreadIndex) -> bool {
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        for &child in vat.thread(current).children() {
            if child == needle {
                return true;
            }
            stack.push(child);
        }
    }
    false
}
