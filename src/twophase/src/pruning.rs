use crate::{
    coord::{CoordCube, MoveTables, Phase2Coord, parity_after},
    cubie::{N_FLIP, N_SLICE, N_SLICE_SORTED, N_TWIST, N_UR_TO_DF, N_URF_TO_DLF},
    moves::{Move, N_MOVE, N_PHASE2_MOVE},
    start, success, working,
};
use log::{debug, info};
use std::{fmt::Display, time::Instant};

/// The value of an entry that the breadth first search has not reached yet.
/// Entries further away than this are left at this value, which is still a
/// valid lower bound.
pub const UNFILLED: u8 = 0x0F;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum TableId {
    /// UD slice position and edge flip, searched with all 18 moves.
    SliceFlip,
    /// UD slice position and corner twist, searched with all 18 moves.
    SliceTwist,
    /// Phase 2 corner permutation, slice edge order and parity.
    CornerParity,
    /// Phase 2 edge permutation, slice edge order and parity.
    EdgeParity,
}

impl TableId {
    pub const ALL: [Self; 4] = [
        TableId::SliceFlip,
        TableId::SliceTwist,
        TableId::CornerParity,
        TableId::EdgeParity,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TableId::SliceFlip => "slice_flip",
            TableId::SliceTwist => "slice_twist",
            TableId::CornerParity => "corner_parity",
            TableId::EdgeParity => "edge_parity",
        }
    }

    /// The number of coordinate pairs the table covers.
    #[must_use]
    pub const fn entries(self) -> usize {
        match self {
            TableId::SliceFlip => N_SLICE as usize * N_FLIP as usize,
            TableId::SliceTwist => N_SLICE as usize * N_TWIST as usize,
            TableId::CornerParity => N_SLICE_SORTED as usize * N_URF_TO_DLF as usize * 2,
            TableId::EdgeParity => N_SLICE_SORTED as usize * N_UR_TO_DF as usize * 2,
        }
    }

    /// The length of the packed representation in bytes.
    #[must_use]
    pub const fn byte_len(self) -> usize {
        self.entries().div_ceil(2)
    }

    /// The number of moves the table is searched with.
    #[must_use]
    pub const fn move_count(self) -> usize {
        match self {
            TableId::SliceFlip | TableId::SliceTwist => N_MOVE,
            TableId::CornerParity | TableId::EdgeParity => N_PHASE2_MOVE,
        }
    }

    /// The entry reached from `index` by the `n`th move of the table.
    #[allow(clippy::cast_possible_truncation)]
    fn neighbor(self, index: usize, n: usize, tables: &MoveTables) -> usize {
        let slice_count = usize::from(N_SLICE);
        let sorted = usize::from(N_SLICE_SORTED);
        match self {
            TableId::SliceFlip | TableId::SliceTwist => {
                let move_ = Move::from_index(n);
                let (orientation, slice) = ((index / slice_count) as u16, index % slice_count);
                // Any ordering of the slice edges will do
                let slice = tables.fr_to_br((slice * sorted) as u16, move_) / N_SLICE_SORTED;
                let orientation = if self == TableId::SliceFlip {
                    tables.flip(orientation, move_)
                } else {
                    tables.twist(orientation, move_)
                };
                phase1_index(orientation, slice)
            }
            TableId::CornerParity | TableId::EdgeParity => {
                let move_ = Move::PHASE2[n];
                let parity = (index % 2) as u8;
                let fr_to_br = (index / 2 % sorted) as u16;
                let permutation = (index / 2 / sorted) as u16;
                let permutation = if self == TableId::CornerParity {
                    tables.urf_to_dlf(permutation, move_)
                } else {
                    tables.ur_to_df(permutation, n)
                };
                phase2_index(
                    permutation,
                    tables.fr_to_br(fr_to_br, move_),
                    parity_after(parity, move_),
                )
            }
        }
    }
}

impl Display for TableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

const fn phase1_index(orientation: u16, slice: u16) -> usize {
    N_SLICE as usize * orientation as usize + slice as usize
}

const fn phase2_index(permutation: u16, fr_to_br: u16, parity: u8) -> usize {
    (N_SLICE_SORTED as usize * permutation as usize + fr_to_br as usize) * 2 + parity as usize
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct PruningTable {
    id: TableId,
    data: Vec<u8>,
}

impl PruningTable {
    /// Fills the table by breadth first search from the solved entry. Each
    /// level scans the whole table in index order, so the result does not
    /// depend on anything but the move tables.
    #[must_use]
    pub fn build(id: TableId, tables: &MoveTables) -> Self {
        info!(start!("Building the {} pruning table"), id);
        let start = Instant::now();

        let mut table = Self {
            id,
            data: vec![0xFF; id.byte_len()],
        };
        let entries = id.entries();
        table.set(0, 0);
        let mut done = 1;
        let mut depth = 0;
        while done < entries && depth + 1 < UNFILLED {
            let mut reached = 0;
            for index in 0..entries {
                if table.get(index) != depth {
                    continue;
                }
                for n in 0..id.move_count() {
                    let next = id.neighbor(index, n, tables);
                    if table.get(next) == UNFILLED {
                        table.set(next, depth + 1);
                        reached += 1;
                    }
                }
            }
            depth += 1;
            done += reached;
            debug!(
                working!("Depth {} of {} reached {} new entries, {}/{} total"),
                depth, id, reached, done, entries
            );
            if reached == 0 {
                break;
            }
        }

        info!(
            success!("Built the {} pruning table in {:.3}s"),
            id,
            start.elapsed().as_secs_f64()
        );
        table
    }

    /// Wraps packed bytes, e.g. read from disk. Returns `None` if the length
    /// does not match the table.
    #[must_use]
    pub fn from_bytes(id: TableId, data: Vec<u8>) -> Option<Self> {
        (data.len() == id.byte_len()).then_some(Self { id, data })
    }

    #[must_use]
    pub fn id(&self) -> TableId {
        self.id
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u8 {
        let byte = self.data[index / 2];
        if index % 2 == 0 {
            byte & 0x0F
        } else {
            byte >> 4
        }
    }

    fn set(&mut self, index: usize, value: u8) {
        let byte = &mut self.data[index / 2];
        if index % 2 == 0 {
            *byte = (*byte & 0xF0) | value;
        } else {
            *byte = (*byte & 0x0F) | (value << 4);
        }
    }
}

/// The four tables the search consults.
#[derive(Debug)]
pub struct PruningTables {
    pub slice_flip: PruningTable,
    pub slice_twist: PruningTable,
    pub corner_parity: PruningTable,
    pub edge_parity: PruningTable,
}

impl PruningTables {
    /// A lower bound on the moves needed to reach the phase 2 subgroup.
    #[must_use]
    pub fn phase1_lower_bound(&self, coord: &CoordCube) -> u8 {
        let slice = coord.slice();
        self.slice_flip
            .get(phase1_index(coord.flip, slice))
            .max(self.slice_twist.get(phase1_index(coord.twist, slice)))
    }

    /// A lower bound on the phase 2 moves needed to solve the cube.
    #[must_use]
    pub fn phase2_lower_bound(&self, coord: &Phase2Coord) -> u8 {
        self.corner_parity
            .get(phase2_index(coord.urf_to_dlf, coord.fr_to_br, coord.parity))
            .max(
                self.edge_parity
                    .get(phase2_index(coord.ur_to_df, coord.fr_to_br, coord.parity)),
            )
    }
}
