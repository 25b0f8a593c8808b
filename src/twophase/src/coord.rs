use crate::{
    cubie::{
        CubieCube, N_FLIP, N_FR_TO_BR, N_MERGE, N_SLICE_SORTED, N_TWIST, N_UB_TO_DF, N_UR_TO_DF,
        N_UR_TO_UL, N_URF_TO_DLF,
    },
    moves::{Face, Move, N_MOVE, N_PHASE2_MOVE},
    start, success,
};
use log::info;
use std::time::Instant;

/// Marks a pair of edge coordinates that cannot occur together.
const MERGE_CONFLICT: u16 = u16::MAX;

pub struct MoveTables {
    twist: Vec<[u16; N_MOVE]>,
    flip: Vec<[u16; N_MOVE]>,
    fr_to_br: Vec<[u16; N_MOVE]>,
    urf_to_dlf: Vec<[u16; N_MOVE]>,
    ur_to_ul: Vec<[u16; N_MOVE]>,
    ub_to_df: Vec<[u16; N_MOVE]>,
    /// Indexed by position in [`Move::PHASE2`]. `ur_to_df` is only tracked
    /// inside the phase 2 subgroup.
    ur_to_df: Vec<[u16; N_PHASE2_MOVE]>,
    merge_ur_to_df: Vec<u16>,
}

/// Tabulates `get(set(coord) * m)` for every coordinate and every move.
fn build_table(
    size: u16,
    set: impl Fn(&mut CubieCube, u16),
    get: impl Fn(&CubieCube) -> u16,
) -> Vec<[u16; N_MOVE]> {
    (0..size)
        .map(|coord| {
            let mut cube = CubieCube::SOLVED;
            set(&mut cube, coord);
            let mut row = [0; N_MOVE];
            for face in Face::ALL {
                let basic = CubieCube::basic_move(face);
                let mut turned = cube;
                for power in 0..3 {
                    turned = turned.multiply(basic);
                    row[3 * face as usize + power] = get(&turned);
                }
            }
            row
        })
        .collect()
}

impl MoveTables {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new() -> Self {
        info!(start!("Building move tables"));
        let start = Instant::now();

        let twist = build_table(N_TWIST, CubieCube::set_twist, CubieCube::twist);
        let flip = build_table(N_FLIP, CubieCube::set_flip, CubieCube::flip);
        let fr_to_br = build_table(N_FR_TO_BR, CubieCube::set_fr_to_br, CubieCube::fr_to_br);
        let urf_to_dlf = build_table(
            N_URF_TO_DLF,
            CubieCube::set_urf_to_dlf,
            CubieCube::urf_to_dlf,
        );
        let ur_to_ul = build_table(N_UR_TO_UL, CubieCube::set_ur_to_ul, CubieCube::ur_to_ul);
        let ub_to_df = build_table(N_UB_TO_DF, CubieCube::set_ub_to_df, CubieCube::ub_to_df);

        let ur_to_df = (0..u32::from(N_UR_TO_DF))
            .map(|coord| {
                let mut cube = CubieCube::SOLVED;
                cube.set_ur_to_df(coord);
                Move::PHASE2.map(|move_| cube.apply_move(move_).ur_to_df() as u16)
            })
            .collect();

        let mut merge_ur_to_df = vec![MERGE_CONFLICT; usize::from(N_MERGE) * usize::from(N_MERGE)];
        for ur_to_ul in 0..N_MERGE {
            for ub_to_df in 0..N_MERGE {
                if let Some(merged) = CubieCube::merge_ur_to_df(ur_to_ul, ub_to_df) {
                    merge_ur_to_df[usize::from(ur_to_ul) * usize::from(N_MERGE)
                        + usize::from(ub_to_df)] = merged as u16;
                }
            }
        }

        info!(
            success!("Move tables built in {:.3}s"),
            start.elapsed().as_secs_f64()
        );
        Self {
            twist,
            flip,
            fr_to_br,
            urf_to_dlf,
            ur_to_ul,
            ub_to_df,
            ur_to_df,
            merge_ur_to_df,
        }
    }

    /// Looks up the combined `ur_to_df` coordinate. Both arguments must come
    /// from a cube inside the phase 2 subgroup.
    #[must_use]
    pub fn merge_ur_to_df(&self, ur_to_ul: u16, ub_to_df: u16) -> Option<u16> {
        if ur_to_ul >= N_MERGE || ub_to_df >= N_MERGE {
            return None;
        }
        match self.merge_ur_to_df[usize::from(ur_to_ul) * usize::from(N_MERGE) + usize::from(ub_to_df)]
        {
            MERGE_CONFLICT => None,
            merged => Some(merged),
        }
    }

    #[must_use]
    pub fn twist(&self, coord: u16, move_: Move) -> u16 {
        self.twist[usize::from(coord)][move_.index()]
    }

    #[must_use]
    pub fn flip(&self, coord: u16, move_: Move) -> u16 {
        self.flip[usize::from(coord)][move_.index()]
    }

    #[must_use]
    pub fn fr_to_br(&self, coord: u16, move_: Move) -> u16 {
        self.fr_to_br[usize::from(coord)][move_.index()]
    }

    #[must_use]
    pub fn urf_to_dlf(&self, coord: u16, move_: Move) -> u16 {
        self.urf_to_dlf[usize::from(coord)][move_.index()]
    }

    /// Applies the phase 2 move with index `phase2_index` into
    /// [`Move::PHASE2`].
    #[must_use]
    pub fn ur_to_df(&self, coord: u16, phase2_index: usize) -> u16 {
        self.ur_to_df[usize::from(coord)][phase2_index]
    }
}

impl Default for MoveTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Quarter turns are odd permutations of the corners; half turns are even.
#[must_use]
pub const fn parity_after(parity: u8, move_: Move) -> u8 {
    parity ^ (move_.power as u8 & 1)
}

/// All coordinates that can be followed through every one of the 18 moves.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct CoordCube {
    pub twist: u16,
    pub flip: u16,
    pub parity: u8,
    pub fr_to_br: u16,
    pub urf_to_dlf: u16,
    pub ur_to_ul: u16,
    pub ub_to_df: u16,
}

impl CoordCube {
    #[must_use]
    pub fn from_cubie(cube: &CubieCube) -> Self {
        Self {
            twist: cube.twist(),
            flip: cube.flip(),
            parity: cube.corner_parity(),
            fr_to_br: cube.fr_to_br(),
            urf_to_dlf: cube.urf_to_dlf(),
            ur_to_ul: cube.ur_to_ul(),
            ub_to_df: cube.ub_to_df(),
        }
    }

    #[must_use]
    pub fn apply_move(&self, move_: Move, tables: &MoveTables) -> Self {
        let i = move_.index();
        Self {
            twist: tables.twist[usize::from(self.twist)][i],
            flip: tables.flip[usize::from(self.flip)][i],
            parity: parity_after(self.parity, move_),
            fr_to_br: tables.fr_to_br[usize::from(self.fr_to_br)][i],
            urf_to_dlf: tables.urf_to_dlf[usize::from(self.urf_to_dlf)][i],
            ur_to_ul: tables.ur_to_ul[usize::from(self.ur_to_ul)][i],
            ub_to_df: tables.ub_to_df[usize::from(self.ub_to_df)][i],
        }
    }

    /// The unordered position of the four UD slice edges.
    #[must_use]
    pub const fn slice(&self) -> u16 {
        self.fr_to_br / N_SLICE_SORTED
    }

    /// Whether the cube lies in the phase 2 subgroup.
    #[must_use]
    pub const fn in_phase2_subgroup(&self) -> bool {
        self.twist == 0 && self.flip == 0 && self.slice() == 0
    }

    /// The phase 2 coordinates of this cube, or `None` outside the subgroup.
    #[must_use]
    pub fn phase2(&self, tables: &MoveTables) -> Option<Phase2Coord> {
        if !self.in_phase2_subgroup() {
            return None;
        }
        Some(Phase2Coord {
            urf_to_dlf: self.urf_to_dlf,
            fr_to_br: self.fr_to_br,
            ur_to_df: tables.merge_ur_to_df(self.ur_to_ul, self.ub_to_df)?,
            parity: self.parity,
        })
    }
}

/// The coordinates tracked while solving inside the phase 2 subgroup.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct Phase2Coord {
    pub urf_to_dlf: u16,
    /// Below 24 inside the subgroup.
    pub fr_to_br: u16,
    pub ur_to_df: u16,
    pub parity: u8,
}

impl Phase2Coord {
    pub const SOLVED: Self = Self {
        urf_to_dlf: 0,
        fr_to_br: 0,
        ur_to_df: 0,
        parity: 0,
    };

    /// Projects a cube known to be in the phase 2 subgroup.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_cubie(cube: &CubieCube) -> Self {
        Self {
            urf_to_dlf: cube.urf_to_dlf(),
            fr_to_br: cube.fr_to_br(),
            ur_to_df: cube.ur_to_df() as u16,
            parity: cube.corner_parity(),
        }
    }

    /// Applies the phase 2 move with index `phase2_index` into
    /// [`Move::PHASE2`].
    #[must_use]
    pub fn apply_move(&self, phase2_index: usize, tables: &MoveTables) -> Self {
        let move_ = Move::PHASE2[phase2_index];
        Self {
            urf_to_dlf: tables.urf_to_dlf(self.urf_to_dlf, move_),
            fr_to_br: tables.fr_to_br(self.fr_to_br, move_),
            ur_to_df: tables.ur_to_df(self.ur_to_df, phase2_index),
            parity: parity_after(self.parity, move_),
        }
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == Self::SOLVED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static TABLES: LazyLock<MoveTables> = LazyLock::new(MoveTables::new);

    #[test_log::test]
    fn test_apply_move_agrees_with_projection() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..50 {
            let cube = CubieCube::random(&mut rng);
            let coord = CoordCube::from_cubie(&cube);
            for move_ in Move::ALL {
                assert_eq!(
                    coord.apply_move(move_, &TABLES),
                    CoordCube::from_cubie(&cube.apply_move(move_)),
                    "{move_}"
                );
            }
        }
    }

    #[test_log::test]
    fn test_phase2_apply_move_agrees_with_projection() {
        let mut rng = fastrand::Rng::with_seed(12);
        let mut cube = CubieCube::SOLVED;
        for _ in 0..100 {
            let i = rng.usize(..N_PHASE2_MOVE);
            let coord = Phase2Coord::from_cubie(&cube);
            cube = cube.apply_move(Move::PHASE2[i]);
            assert_eq!(coord.apply_move(i, &TABLES), Phase2Coord::from_cubie(&cube));
            assert_eq!(
                CoordCube::from_cubie(&cube).phase2(&TABLES),
                Some(Phase2Coord::from_cubie(&cube))
            );
        }
    }

    #[test_log::test]
    fn test_subgroup_membership() {
        let solved = CoordCube::from_cubie(&CubieCube::SOLVED);
        assert!(solved.in_phase2_subgroup());
        assert_eq!(solved.phase2(&TABLES), Some(Phase2Coord::SOLVED));
        assert!(Phase2Coord::from_cubie(&CubieCube::SOLVED).is_solved());

        let turned = solved.apply_move("R".parse().unwrap(), &TABLES);
        assert!(!turned.in_phase2_subgroup());
        assert_eq!(turned.phase2(&TABLES), None);
    }
}
