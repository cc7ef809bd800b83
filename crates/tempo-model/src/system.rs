//! Read-only view of a system graph.

use std::ops::Range;
use tempo_syntax::{Expr, Statement};

/// Location identifier, dense in `[0, locations_count)`.
pub type LocId = usize;

/// Edge identifier, dense in `[0, edges_count)`.
pub type EdgeId = usize;

/// Event identifier.
pub type EventId = usize;

/// Capabilities the model needs from a system graph.
///
/// The graph is built elsewhere (parser, product construction); the model
/// only reads attribute trees and event labels from it.
pub trait System {
    fn locations_count(&self) -> usize;

    fn edges_count(&self) -> usize;

    /// Invariant of a location; `true` when the location is unconstrained.
    fn invariant(&self, loc: LocId) -> &Expr;

    /// Guard of an edge; `true` when the edge is unguarded.
    fn guard(&self, edge: EdgeId) -> &Expr;

    /// Update statement of an edge; `nop` when the edge has none.
    fn statement(&self, edge: EdgeId) -> &Statement;

    /// Event labelling an edge.
    fn edge_event(&self, edge: EdgeId) -> EventId;

    /// Whether an event is optional in some synchronization vector.
    fn event_is_weakly_synchronized(&self, event: EventId) -> bool;

    fn locations(&self) -> Range<LocId> {
        0..self.locations_count()
    }

    fn edges(&self) -> Range<EdgeId> {
        0..self.edges_count()
    }
}
