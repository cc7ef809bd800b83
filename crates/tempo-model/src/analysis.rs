//! Structural predicates over the system graph, checked before
//! compilation.

use crate::system::{EdgeId, System};

/// First edge labelled by a weakly synchronized event whose guard is not
/// the constant `true`.
///
/// Such an edge is rejected at model construction: the event may be dropped
/// from a synchronization, and a guard on it would then silently constrain
/// nothing.
pub fn find_guarded_weakly_synchronized_edge<S: System>(system: &S) -> Option<EdgeId> {
    system.edges().find(|&edge| {
        system.event_is_weakly_synchronized(system.edge_event(edge))
            && !system.guard(edge).is_trivially_true()
    })
}
