//! Pipe discovery and warp pairing.

use std::collections::HashMap;

use stagehop_core::{
    Aabb, CellCoord, Layer, PipeId, PipeKind, PipeSnapshot, Terrain, WarpGate, TILE_SIZE,
};

use crate::{grid::TileGrid, stage::Stage};

/// Marker under a warp pipe's top-left cell that allows entering it.
const ENTRY_MARKER: char = 'I';
/// Marker under a warp pipe's second top cell that allows leaving through it.
const EXIT_MARKER: char = 'O';
/// Vertical tolerance between the player's feet and a pipe top.
const PIPE_TOP_TOLERANCE: f32 = 2.0;

/// A connected block of pipe cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pipe {
    id: PipeId,
    bounds: Aabb,
    kind: PipeKind,
    layer: Layer,
    gate: Option<WarpGate>,
}

impl Pipe {
    /// Handle of the pipe.
    #[must_use]
    pub const fn id(&self) -> PipeId {
        self.id
    }

    /// Area covered by the pipe.
    #[must_use]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Pipe classification of the top-left cell.
    #[must_use]
    pub const fn kind(&self) -> PipeKind {
        self.kind
    }

    /// Layer owning the pipe's top row.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Warp metadata, present on warp pipes only.
    #[must_use]
    pub const fn gate(&self) -> Option<WarpGate> {
        self.gate
    }

    /// Captures an immutable view of the pipe.
    #[must_use]
    pub const fn snapshot(&self) -> PipeSnapshot {
        PipeSnapshot {
            id: self.id,
            bounds: self.bounds,
            kind: self.kind,
            warp: self.gate,
            layer: self.layer,
        }
    }
}

/// Every pipe of a stage in discovery order, with warp pairs linked by handle.
#[derive(Clone, Debug, Default)]
pub struct WarpGraph {
    pipes: Vec<Pipe>,
}

impl WarpGraph {
    /// Scans the grid for pipes and pairs warp pipes that share an anchor tag.
    ///
    /// A pipe starts at a pipe cell whose left and upper neighbours are not pipe
    /// cells and extends down and right while the terrain stays pipe.
    #[must_use]
    pub fn discover(stage: &Stage, grid: &TileGrid) -> Self {
        let is_pipe = |column: u32, row: u32| {
            grid.terrain_at(CellCoord::new(column, row)) == Terrain::Pipe
        };

        let mut pipes = Vec::new();
        for row in 0..grid.rows() {
            for column in 0..grid.columns() {
                if !is_pipe(column, row) {
                    continue;
                }
                let left_is_pipe = column > 0 && is_pipe(column - 1, row);
                let up_is_pipe = row > 0 && is_pipe(column, row - 1);
                if left_is_pipe || up_is_pipe {
                    continue;
                }

                let height = (row..grid.rows())
                    .take_while(|&candidate| is_pipe(column, candidate))
                    .count();
                let width = (column..grid.columns())
                    .take_while(|&candidate| is_pipe(candidate, row))
                    .count();
                let origin = CellCoord::new(column, row);
                let kind = grid.class_at(origin).pipe;
                let gate = (kind == PipeKind::Warp).then(|| WarpGate {
                    anchor: stage.raw_char(row, column + 1),
                    can_enter: stage.raw_char(row + 1, column) == Some(ENTRY_MARKER),
                    can_exit: stage.raw_char(row + 1, column + 1) == Some(EXIT_MARKER),
                    pair: None,
                });

                let id = PipeId::new(u32::try_from(pipes.len()).unwrap_or(u32::MAX));
                pipes.push(Pipe {
                    id,
                    bounds: Aabb::new(
                        origin.left(),
                        origin.top(),
                        width as f32 * TILE_SIZE,
                        height as f32 * TILE_SIZE,
                    ),
                    kind,
                    layer: grid.layer_of_row(row),
                    gate,
                });
            }
        }

        let mut graph = Self { pipes };
        graph.pair_by_anchor();
        graph
    }

    fn pair_by_anchor(&mut self) {
        let mut open: HashMap<char, PipeId> = HashMap::new();
        for index in 0..self.pipes.len() {
            let pipe = self.pipes[index];
            let Some(anchor) = pipe.gate.and_then(|gate| gate.anchor) else {
                continue;
            };
            match open.remove(&anchor) {
                Some(other) => {
                    self.link(pipe.id, other);
                    self.link(other, pipe.id);
                }
                None => {
                    let _ = open.insert(anchor, pipe.id);
                }
            }
        }

        for (anchor, pipe) in open {
            tracing::debug!(%anchor, pipe = pipe.get(), "warp pipe left unpaired");
        }
    }

    fn link(&mut self, from: PipeId, to: PipeId) {
        if let Some(gate) = self
            .pipes
            .get_mut(from.index())
            .and_then(|pipe| pipe.gate.as_mut())
        {
            gate.pair = Some(to);
        }
    }

    /// Pipes in discovery order.
    #[must_use]
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    /// Looks up a pipe by handle.
    #[must_use]
    pub fn pipe(&self, id: PipeId) -> Option<&Pipe> {
        self.pipes.get(id.index())
    }

    /// Warp pipe in `layer` whose top is level with `foot_y` and spans `center_x`.
    #[must_use]
    pub fn entry_under(&self, foot_y: f32, center_x: f32, layer: Layer) -> Option<&Pipe> {
        self.pipes.iter().find(|pipe| {
            pipe.gate.is_some()
                && pipe.layer == layer
                && (foot_y - pipe.bounds.y).abs() <= PIPE_TOP_TOLERANCE
                && center_x >= pipe.bounds.x
                && center_x < pipe.bounds.right()
        })
    }

    /// Exit reached by entering `entry`, if it allows entry and its pair allows exit.
    #[must_use]
    pub fn destination(&self, entry: PipeId) -> Option<&Pipe> {
        let gate = self.pipe(entry)?.gate?;
        if !gate.can_enter {
            return None;
        }
        let exit = self.pipe(gate.pair?)?;
        exit.gate
            .is_some_and(|exit_gate| exit_gate.can_exit)
            .then_some(exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(source: &str) -> WarpGraph {
        let stage = Stage::parse(source);
        WarpGraph::discover(&stage, &stage.grid())
    }

    #[test]
    fn pipes_are_measured_from_their_top_left_cell() {
        let graph = graph("0PP0\n0PP0\n0PP0\n1111\n");
        assert_eq!(graph.pipes().len(), 1);
        let pipe = graph.pipes()[0];
        assert_eq!(pipe.kind(), PipeKind::Normal);
        assert_eq!(pipe.bounds(), Aabb::new(32.0, 0.0, 64.0, 96.0));
        assert_eq!(pipe.gate(), None);
    }

    #[test]
    fn warp_metadata_comes_from_neighbouring_characters() {
        let graph = graph("W!00W!\nIW00WO\n");
        let entry = graph.pipes()[0].gate().expect("entry gate");
        assert_eq!(entry.anchor, Some('!'));
        assert!(entry.can_enter);
        assert!(!entry.can_exit);
        let exit = graph.pipes()[1].gate().expect("exit gate");
        assert!(!exit.can_enter);
        assert!(exit.can_exit);
    }

    #[test]
    fn pipes_sharing_an_anchor_pair_mutually() {
        let graph = graph("WA0WA0WA\n");
        let gates: Vec<_> = graph
            .pipes()
            .iter()
            .map(|pipe| pipe.gate().expect("warp pipe"))
            .collect();
        assert_eq!(gates[0].pair, Some(PipeId::new(1)));
        assert_eq!(gates[1].pair, Some(PipeId::new(0)));
        assert_eq!(gates[2].pair, None, "third occurrence reopens the tag");
    }

    #[test]
    fn destination_requires_entry_and_exit_permissions() {
        let graph = graph("W!00W!\nIW00WO\n");
        let exit = graph.destination(PipeId::new(0)).expect("paired exit");
        assert_eq!(exit.id(), PipeId::new(1));
        assert!(graph.destination(PipeId::new(1)).is_none());
    }

    #[test]
    fn entry_lookup_checks_span_and_height() {
        let graph = graph("00\nW!\nIO\n");
        assert!(graph.entry_under(32.0, 10.0, Layer::Overworld).is_some());
        assert!(graph.entry_under(34.0, 63.9, Layer::Overworld).is_some());
        assert!(graph.entry_under(35.0, 10.0, Layer::Overworld).is_none());
        assert!(graph.entry_under(32.0, 64.0, Layer::Overworld).is_none());
        assert!(graph.entry_under(32.0, 10.0, Layer::Underground).is_none());
    }
}
