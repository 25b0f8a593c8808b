use crate::moves::{Face, Move, MoveSequence};
use std::ops::Range;
use thiserror::Error;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[repr(u8)]
pub enum Corner {
    URF,
    UFL,
    ULB,
    UBR,
    DFR,
    DLF,
    DBL,
    DRB,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
#[repr(u8)]
pub enum Edge {
    UR,
    UF,
    UL,
    UB,
    DR,
    DF,
    DL,
    DB,
    FR,
    FL,
    BL,
    BR,
}

impl Corner {
    pub const ALL: [Self; 8] = {
        use Corner::{DBL, DFR, DLF, DRB, UBR, UFL, ULB, URF};
        [URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB]
    };
}

impl Edge {
    pub const ALL: [Self; 12] = {
        use Edge::{BL, BR, DB, DF, DL, DR, FL, FR, UB, UF, UL, UR};
        [UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR]
    };
}

/// Reasons a cubie configuration cannot be reached by turning faces. The
/// numbering follows the classic solver error codes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubieError {
    #[error("Not all 12 edges exist exactly once")]
    EdgesNotUnique,
    #[error("One edge has to be flipped")]
    Flip,
    #[error("Not all 8 corners exist exactly once")]
    CornersNotUnique,
    #[error("One corner has to be twisted")]
    Twist,
    #[error("Two corners or two edges have to be exchanged")]
    Parity,
}

impl CubieError {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            CubieError::EdgesNotUnique => 2,
            CubieError::Flip => 3,
            CubieError::CornersNotUnique => 4,
            CubieError::Twist => 5,
            CubieError::Parity => 6,
        }
    }
}

/// Permutations use the "replaced by" convention: `cp[URF] == UBR` means the
/// corner that belongs in `UBR` sits in the `URF` slot.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct CubieCube {
    pub cp: [Corner; 8],
    pub co: [u8; 8],
    pub ep: [Edge; 12],
    pub eo: [u8; 12],
}

impl Default for CubieCube {
    fn default() -> Self {
        Self::SOLVED
    }
}

/// The six clockwise quarter turns, indexed by [`Face`].
const BASIC_MOVES: [CubieCube; 6] = {
    use Corner::{DBL, DFR, DLF, DRB, UBR, UFL, ULB, URF};
    use Edge::{BL, BR, DB, DF, DL, DR, FL, FR, UB, UF, UL, UR};
    [
        // U
        CubieCube {
            cp: [UBR, URF, UFL, ULB, DFR, DLF, DBL, DRB],
            co: [0; 8],
            ep: [UB, UR, UF, UL, DR, DF, DL, DB, FR, FL, BL, BR],
            eo: [0; 12],
        },
        // R
        CubieCube {
            cp: [DFR, UFL, ULB, URF, DRB, DLF, DBL, UBR],
            co: [2, 0, 0, 1, 1, 0, 0, 2],
            ep: [FR, UF, UL, UB, BR, DF, DL, DB, DR, FL, BL, UR],
            eo: [0; 12],
        },
        // F
        CubieCube {
            cp: [UFL, DLF, ULB, UBR, URF, DFR, DBL, DRB],
            co: [1, 2, 0, 0, 2, 1, 0, 0],
            ep: [UR, FL, UL, UB, DR, FR, DL, DB, UF, DF, BL, BR],
            eo: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
        },
        // D
        CubieCube {
            cp: [URF, UFL, ULB, UBR, DLF, DBL, DRB, DFR],
            co: [0; 8],
            ep: [UR, UF, UL, UB, DF, DL, DB, DR, FR, FL, BL, BR],
            eo: [0; 12],
        },
        // L
        CubieCube {
            cp: [URF, ULB, DBL, UBR, DFR, UFL, DLF, DRB],
            co: [0, 1, 2, 0, 0, 2, 1, 0],
            ep: [UR, UF, BL, UB, DR, DF, FL, DB, FR, UL, DL, BR],
            eo: [0; 12],
        },
        // B
        CubieCube {
            cp: [URF, UFL, UBR, DRB, DFR, DLF, ULB, DBL],
            co: [0, 0, 1, 2, 0, 0, 2, 1],
            ep: [UR, UF, UL, BR, DR, DF, DL, BL, FR, FL, UB, DB],
            eo: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
        },
    ]
};

impl CubieCube {
    pub const SOLVED: Self = Self {
        cp: Corner::ALL,
        co: [0; 8],
        ep: Edge::ALL,
        eo: [0; 12],
    };

    /// The cube obtained by turning `face` clockwise once from solved.
    #[must_use]
    pub const fn basic_move(face: Face) -> &'static Self {
        &BASIC_MOVES[face as usize]
    }

    /// Composes `self` followed by `other`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        let mut result = Self::SOLVED;
        for i in 0..8 {
            let from = other.cp[i] as usize;
            result.cp[i] = self.cp[from];
            result.co[i] = (self.co[from] + other.co[i]) % 3;
        }
        for i in 0..12 {
            let from = other.ep[i] as usize;
            result.ep[i] = self.ep[from];
            result.eo[i] = (self.eo[from] + other.eo[i]) % 2;
        }
        result
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut result = Self::SOLVED;
        for (i, &corner) in self.cp.iter().enumerate() {
            result.cp[corner as usize] = Corner::ALL[i];
        }
        for i in 0..8 {
            result.co[i] = (3 - self.co[result.cp[i] as usize]) % 3;
        }
        for (i, &edge) in self.ep.iter().enumerate() {
            result.ep[edge as usize] = Edge::ALL[i];
        }
        for i in 0..12 {
            result.eo[i] = self.eo[result.ep[i] as usize];
        }
        result
    }

    #[must_use]
    pub fn apply_move(&self, move_: Move) -> Self {
        let basic = Self::basic_move(move_.face);
        let mut result = *self;
        for _ in 0..move_.power.turns() {
            result = result.multiply(basic);
        }
        result
    }

    #[must_use]
    pub fn apply_sequence(&self, moves: &MoveSequence) -> Self {
        moves.iter().fold(*self, |cube, &move_| cube.apply_move(move_))
    }

    #[must_use]
    pub fn from_sequence(moves: &MoveSequence) -> Self {
        Self::SOLVED.apply_sequence(moves)
    }

    /// Checks that this cube can be reached from the solved state by turning
    /// faces.
    ///
    /// # Errors
    ///
    /// Returns the first violated reachability condition, checked in the same
    /// order as the classic solver error codes.
    pub fn verify(&self) -> Result<(), CubieError> {
        let mut edge_count = [0_u8; 12];
        for &edge in &self.ep {
            edge_count[edge as usize] += 1;
        }
        if edge_count.iter().any(|&count| count != 1) {
            return Err(CubieError::EdgesNotUnique);
        }
        if self.eo.iter().map(|&o| u32::from(o)).sum::<u32>() % 2 != 0 {
            return Err(CubieError::Flip);
        }

        let mut corner_count = [0_u8; 8];
        for &corner in &self.cp {
            corner_count[corner as usize] += 1;
        }
        if corner_count.iter().any(|&count| count != 1) {
            return Err(CubieError::CornersNotUnique);
        }
        if self.co.iter().map(|&o| u32::from(o)).sum::<u32>() % 3 != 0 {
            return Err(CubieError::Twist);
        }

        if self.corner_parity() != self.edge_parity() {
            return Err(CubieError::Parity);
        }
        Ok(())
    }

    #[must_use]
    pub fn corner_parity(&self) -> u8 {
        permutation_parity(&self.cp.map(|c| c as usize))
    }

    #[must_use]
    pub fn edge_parity(&self) -> u8 {
        permutation_parity(&self.ep.map(|e| e as usize))
    }

    /// A uniformly random reachable cube.
    #[must_use]
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let mut cube = Self::SOLVED;
        rng.shuffle(&mut cube.cp);
        rng.shuffle(&mut cube.ep);
        if cube.corner_parity() != cube.edge_parity() {
            cube.ep.swap(0, 1);
        }
        cube.set_twist(rng.u16(..N_TWIST));
        cube.set_flip(rng.u16(..N_FLIP));
        cube
    }
}

fn permutation_parity(perm: &[usize]) -> u8 {
    let mut inversions = 0_usize;
    for i in 0..perm.len() {
        for j in i + 1..perm.len() {
            if perm[i] > perm[j] {
                inversions += 1;
            }
        }
    }
    u8::from(inversions % 2 == 1)
}

pub const N_TWIST: u16 = 2187;
pub const N_FLIP: u16 = 2048;
pub const N_SLICE: u16 = 495;
pub const N_FR_TO_BR: u16 = 11880;
pub const N_URF_TO_DLF: u16 = 20160;
pub const N_UR_TO_UL: u16 = 1320;
pub const N_UB_TO_DF: u16 = 1320;
/// The size of `ur_to_df` restricted to the phase 2 subgroup, which is all
/// that is ever tabulated.
pub const N_UR_TO_DF: u16 = 20160;
/// Inside the phase 2 subgroup `ur_to_ul` and `ub_to_df` stay below this.
pub const N_MERGE: u16 = 336;
/// The four slice edges may be permuted arbitrarily inside their slice.
pub const N_SLICE_SORTED: u16 = 24;

const FACTORIAL: [usize; 13] = {
    let mut arr = [1; 13];
    let mut i = 1;
    while i < arr.len() {
        arr[i] = arr[i - 1] * i;
        i += 1;
    }
    arr
};

const fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let mut result = 1;
    let mut i = 0;
    while i < k {
        result = result * (n - i) / (i + 1);
        i += 1;
    }
    result
}

/// Which end of the slot list a subset coordinate counts from. Counting from
/// the back puts the UD slice edges at coordinate zero when they are home.
#[derive(Clone, Copy)]
enum Scan {
    Forward,
    Backward,
}

impl Scan {
    const fn slot(self, step: usize, len: usize) -> usize {
        match self {
            Scan::Forward => step,
            Scan::Backward => len - 1 - step,
        }
    }
}

/// Ranks where the `tracked` labels sit and in which order. The result is
/// `combination * k! + order` where `combination` indexes the set of occupied
/// slots in the combinatorial number system and `order` is the Lehmer code of
/// the tracked labels read in slot order.
fn subset_rank(perm: &[usize], tracked: &Range<usize>, scan: Scan) -> usize {
    let k = tracked.len();
    let mut combination = 0;
    let mut found = 0;
    for step in 0..perm.len() {
        if tracked.contains(&perm[scan.slot(step, perm.len())]) {
            found += 1;
            combination += binomial(step, found);
        }
    }

    let mut order = [0; 12];
    let mut len = 0;
    for &label in perm {
        if tracked.contains(&label) {
            order[len] = label - tracked.start;
            len += 1;
        }
    }
    let mut lehmer = 0;
    for i in 0..k {
        let smaller = order[i + 1..k].iter().filter(|&&x| x < order[i]).count();
        lehmer += smaller * FACTORIAL[k - 1 - i];
    }

    combination * FACTORIAL[k] + lehmer
}

/// Inverse of [`subset_rank`]. Slots not holding a tracked label are `None`.
fn subset_unrank<const N: usize>(
    coord: usize,
    tracked: &Range<usize>,
    scan: Scan,
) -> [Option<usize>; N] {
    let k = tracked.len();
    let mut combination = coord / FACTORIAL[k];
    let mut lehmer = coord % FACTORIAL[k];

    let mut pool = [0; 12];
    for (i, p) in pool.iter_mut().enumerate().take(k) {
        *p = i;
    }
    let mut order = [0; 12];
    for i in 0..k {
        let f = FACTORIAL[k - 1 - i];
        let digit = lehmer / f;
        lehmer %= f;
        order[i] = pool[digit];
        pool.copy_within(digit + 1..k - i, digit);
    }

    let mut slots = [0; 12];
    for found in (1..=k).rev() {
        let mut step = found - 1;
        while binomial(step + 1, found) <= combination {
            step += 1;
        }
        combination -= binomial(step, found);
        slots[found - 1] = scan.slot(step, N);
    }
    slots[..k].sort_unstable();

    let mut result = [None; N];
    for (i, &slot) in slots[..k].iter().enumerate() {
        result[slot] = Some(order[i] + tracked.start);
    }
    result
}

/// Completes a partial assignment with the missing labels in ascending order.
fn fill_permutation<const N: usize>(partial: &[Option<usize>; N]) -> [usize; N] {
    let mut used = [false; N];
    for label in partial.iter().flatten() {
        used[*label] = true;
    }
    let mut spare = (0..N).filter(|&label| !used[label]);
    let mut result = [0; N];
    for (slot, label) in partial.iter().enumerate() {
        // There are exactly as many spare labels as empty slots
        result[slot] = label.unwrap_or_else(|| spare.next().unwrap_or(0));
    }
    result
}

const UR_TO_UL: Range<usize> = 0..3;
const UB_TO_DF: Range<usize> = 3..6;
const UR_TO_DF: Range<usize> = 0..6;
const URF_TO_DLF: Range<usize> = 0..6;
const FR_TO_BR: Range<usize> = 8..12;

/// Coordinate projections and their inverses. A setter only guarantees that
/// reading the same coordinate back yields the value that was set; the pieces
/// it does not describe are placed arbitrarily.
#[allow(clippy::cast_possible_truncation)]
impl CubieCube {
    /// The orientation of the first seven corners in base 3.
    #[must_use]
    pub fn twist(&self) -> u16 {
        self.co[..7]
            .iter()
            .fold(0, |acc, &o| acc * 3 + u16::from(o))
    }

    pub fn set_twist(&mut self, mut twist: u16) {
        let mut sum = 0;
        for i in (0..7).rev() {
            self.co[i] = (twist % 3) as u8;
            sum += self.co[i];
            twist /= 3;
        }
        self.co[7] = (3 - sum % 3) % 3;
    }

    /// The orientation of the first eleven edges in base 2.
    #[must_use]
    pub fn flip(&self) -> u16 {
        self.eo[..11]
            .iter()
            .fold(0, |acc, &o| acc * 2 + u16::from(o))
    }

    pub fn set_flip(&mut self, mut flip: u16) {
        let mut sum = 0;
        for i in (0..11).rev() {
            self.eo[i] = (flip % 2) as u8;
            sum += self.eo[i];
            flip /= 2;
        }
        self.eo[11] = sum % 2;
    }

    /// Positions and order of the four UD slice edges. Divided by 24 this is
    /// the unordered slice coordinate of phase 1; inside the phase 2 subgroup
    /// it is below 24.
    #[must_use]
    pub fn fr_to_br(&self) -> u16 {
        subset_rank(&self.ep.map(|e| e as usize), &FR_TO_BR, Scan::Backward) as u16
    }

    pub fn set_fr_to_br(&mut self, coord: u16) {
        self.set_edges(&subset_unrank(usize::from(coord), &FR_TO_BR, Scan::Backward));
    }

    #[must_use]
    pub fn slice(&self) -> u16 {
        self.fr_to_br() / N_SLICE_SORTED
    }

    /// Positions and order of the corners `URF..=DLF`.
    #[must_use]
    pub fn urf_to_dlf(&self) -> u16 {
        subset_rank(&self.cp.map(|c| c as usize), &URF_TO_DLF, Scan::Forward) as u16
    }

    pub fn set_urf_to_dlf(&mut self, coord: u16) {
        let partial = subset_unrank::<8>(usize::from(coord), &URF_TO_DLF, Scan::Forward);
        self.cp = fill_permutation(&partial).map(|c| Corner::ALL[c]);
    }

    /// Positions and order of the edges `UR..=UL`.
    #[must_use]
    pub fn ur_to_ul(&self) -> u16 {
        subset_rank(&self.ep.map(|e| e as usize), &UR_TO_UL, Scan::Forward) as u16
    }

    pub fn set_ur_to_ul(&mut self, coord: u16) {
        self.set_edges(&subset_unrank(usize::from(coord), &UR_TO_UL, Scan::Forward));
    }

    /// Positions and order of the edges `UB..=DF`.
    #[must_use]
    pub fn ub_to_df(&self) -> u16 {
        subset_rank(&self.ep.map(|e| e as usize), &UB_TO_DF, Scan::Forward) as u16
    }

    pub fn set_ub_to_df(&mut self, coord: u16) {
        self.set_edges(&subset_unrank(usize::from(coord), &UB_TO_DF, Scan::Forward));
    }

    /// Positions and order of the six edges `UR..=DF`. Only meaningful as a
    /// table index inside the phase 2 subgroup, where it is below 20160.
    #[must_use]
    pub fn ur_to_df(&self) -> u32 {
        subset_rank(&self.ep.map(|e| e as usize), &UR_TO_DF, Scan::Forward) as u32
    }

    pub fn set_ur_to_df(&mut self, coord: u32) {
        self.set_edges(&subset_unrank(coord as usize, &UR_TO_DF, Scan::Forward));
    }

    fn set_edges(&mut self, partial: &[Option<usize>; 12]) {
        self.ep = fill_permutation(partial).map(|e| Edge::ALL[e]);
    }

    /// Combines the two three-edge coordinates into `ur_to_df`. Returns `None`
    /// when both claim the same slot.
    #[must_use]
    pub fn merge_ur_to_df(ur_to_ul: u16, ub_to_df: u16) -> Option<u32> {
        let a = subset_unrank::<12>(usize::from(ur_to_ul), &UR_TO_UL, Scan::Forward);
        let b = subset_unrank::<12>(usize::from(ub_to_df), &UB_TO_DF, Scan::Forward);
        let mut merged = [None; 12];
        for slot in 0..12 {
            merged[slot] = match (a[slot], b[slot]) {
                (Some(_), Some(_)) => return None,
                (x, y) => x.or(y),
            };
        }
        let perm = fill_permutation(&merged);
        Some(subset_rank(&perm, &UR_TO_DF, Scan::Forward) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Power;

    fn scrambled() -> CubieCube {
        CubieCube::from_sequence(&"R U F' D2 L B' U2 R2 F D' B L2".parse().unwrap())
    }

    #[test]
    fn test_solved_coordinates() {
        let cube = CubieCube::SOLVED;
        assert_eq!(cube.twist(), 0);
        assert_eq!(cube.flip(), 0);
        assert_eq!(cube.fr_to_br(), 0);
        assert_eq!(cube.slice(), 0);
        assert_eq!(cube.urf_to_dlf(), 0);
        assert_eq!(cube.ur_to_ul(), 0);
        assert_eq!(cube.ub_to_df(), 114);
        assert_eq!(cube.ur_to_df(), 0);
        assert_eq!(cube.corner_parity(), 0);
    }

    #[test]
    fn test_basic_moves_have_order_four() {
        for face in Face::ALL {
            let mut cube = CubieCube::SOLVED;
            for _ in 0..4 {
                cube = cube.multiply(CubieCube::basic_move(face));
            }
            assert_eq!(cube, CubieCube::SOLVED);
            assert!(CubieCube::basic_move(face).verify().is_ok());
        }
    }

    #[test]
    fn test_inverse() {
        let cube = scrambled();
        assert_eq!(cube.multiply(&cube.inverse()), CubieCube::SOLVED);
        assert_eq!(cube.inverse().multiply(&cube), CubieCube::SOLVED);
        let moves: MoveSequence = "R U F' D2 L B' U2 R2 F D' B L2".parse().unwrap();
        assert_eq!(CubieCube::from_sequence(&moves.inverse()), cube.inverse());
    }

    #[test]
    fn test_move_powers() {
        let cube = scrambled();
        for face in Face::ALL {
            let quarter = cube.apply_move(Move::new(face, Power::Quarter));
            let half = cube.apply_move(Move::new(face, Power::Half));
            let inverse = cube.apply_move(Move::new(face, Power::Inverse));
            assert_eq!(quarter.apply_move(Move::new(face, Power::Quarter)), half);
            assert_eq!(inverse.apply_move(Move::new(face, Power::Quarter)), cube);
        }
    }

    #[test]
    fn test_coordinate_setters() {
        let mut cube = CubieCube::SOLVED;
        for coord in [0, 1, 1000, N_TWIST - 1] {
            cube.set_twist(coord);
            assert_eq!(cube.twist(), coord);
        }
        for coord in [0, 1, 1000, N_FLIP - 1] {
            cube.set_flip(coord);
            assert_eq!(cube.flip(), coord);
        }
        for coord in [0, 23, 24, 5000, N_FR_TO_BR - 1] {
            cube.set_fr_to_br(coord);
            assert_eq!(cube.fr_to_br(), coord);
        }
        for coord in [0, 17, 9999, N_URF_TO_DLF - 1] {
            cube.set_urf_to_dlf(coord);
            assert_eq!(cube.urf_to_dlf(), coord);
        }
        for coord in [0, 114, 335, N_UR_TO_UL - 1] {
            cube.set_ur_to_ul(coord);
            assert_eq!(cube.ur_to_ul(), coord);
            cube.set_ub_to_df(coord);
            assert_eq!(cube.ub_to_df(), coord);
        }
        for coord in [0, 1, 12345, u32::from(N_UR_TO_DF) - 1] {
            cube.set_ur_to_df(coord);
            assert_eq!(cube.ur_to_df(), coord);
        }
    }

    #[test]
    fn test_merge() {
        let cube = CubieCube::from_sequence(&"U R2 D' F2 L2 U2 B2 D".parse().unwrap());
        assert_eq!(
            CubieCube::merge_ur_to_df(cube.ur_to_ul(), cube.ub_to_df()),
            Some(cube.ur_to_df())
        );
        assert_eq!(CubieCube::merge_ur_to_df(0, 0), None);
    }

    #[test]
    fn test_verify() {
        assert_eq!(scrambled().verify(), Ok(()));

        let mut cube = CubieCube::SOLVED;
        cube.eo[0] = 1;
        assert_eq!(cube.verify(), Err(CubieError::Flip));

        let mut cube = CubieCube::SOLVED;
        cube.co[0] = 1;
        assert_eq!(cube.verify(), Err(CubieError::Twist));

        let mut cube = CubieCube::SOLVED;
        cube.ep.swap(0, 1);
        assert_eq!(cube.verify(), Err(CubieError::Parity));

        let mut cube = CubieCube::SOLVED;
        cube.cp[0] = Corner::UFL;
        assert_eq!(cube.verify(), Err(CubieError::CornersNotUnique));

        let mut cube = CubieCube::SOLVED;
        cube.ep[0] = Edge::UF;
        assert_eq!(cube.verify(), Err(CubieError::EdgesNotUnique));
    }

    #[test]
    fn test_random_is_reachable() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..100 {
            assert_eq!(CubieCube::random(&mut rng).verify(), Ok(()));
        }
    }
}
