use std::{
    fmt::Display,
    ops::{Deref, DerefMut},
    str::FromStr,
};

use itertools::Itertools;
use thiserror::Error;

/// The six faces, in facelet string order.
///
/// - U: top face
/// - R: right face
/// - F: front face
/// - D: bottom face
/// - L: left face
/// - B: back face
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Face {
    U,
    R,
    F,
    D,
    L,
    B,
}

impl Face {
    pub const ALL: [Self; 6] = {
        use Face::{B, D, F, L, R, U};
        let v = [U, R, F, D, L, B];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    #[must_use]
    pub const fn axis(self) -> usize {
        self as usize
    }

    /// The face on the other side of the cube. Turns of opposite faces
    /// commute.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self as usize + 3) % 6]
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::R => 'R',
            Face::F => 'F',
            Face::D => 'D',
            Face::L => 'L',
            Face::B => 'B',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(Face::U),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'B' => Some(Face::B),
            _ => None,
        }
    }
}

impl Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// How far a face is turned. `Inverse` is a counter-clockwise quarter turn and
/// `Half` is a 180 degree turn.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum Power {
    Quarter = 1,
    Half = 2,
    Inverse = 3,
}

impl Power {
    pub const ALL: [Self; 3] = [Power::Quarter, Power::Half, Power::Inverse];

    /// The number of clockwise quarter turns this power stands for.
    #[must_use]
    pub const fn turns(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Power::Quarter => Power::Inverse,
            Power::Half => Power::Half,
            Power::Inverse => Power::Quarter,
        }
    }
}

impl Display for Power {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Power::Quarter => write!(f, ""),
            Power::Half => write!(f, "2"),
            Power::Inverse => write!(f, "'"),
        }
    }
}

/// A face equipped with a power.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct Move {
    pub face: Face,
    pub power: Power,
}

/// The number of distinct moves of the face turn metric.
pub const N_MOVE: usize = 18;

/// The number of moves that keep a cube inside the phase 2 subgroup.
pub const N_PHASE2_MOVE: usize = 10;

impl Move {
    pub const ALL: [Self; N_MOVE] = {
        let mut moves = [Move::new(Face::U, Power::Quarter); N_MOVE];
        let mut i = 0;
        while i < N_MOVE {
            moves[i] = Move::from_index(i);
            i += 1;
        }
        moves
    };

    /// U and D turn freely; every other face may only be turned twice.
    pub const PHASE2: [Self; N_PHASE2_MOVE] = [
        Move::new(Face::U, Power::Quarter),
        Move::new(Face::U, Power::Half),
        Move::new(Face::U, Power::Inverse),
        Move::new(Face::R, Power::Half),
        Move::new(Face::F, Power::Half),
        Move::new(Face::D, Power::Quarter),
        Move::new(Face::D, Power::Half),
        Move::new(Face::D, Power::Inverse),
        Move::new(Face::L, Power::Half),
        Move::new(Face::B, Power::Half),
    ];

    #[must_use]
    pub const fn new(face: Face, power: Power) -> Self {
        Self { face, power }
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        let power = match index % 3 {
            0 => Power::Quarter,
            1 => Power::Half,
            _ => Power::Inverse,
        };
        Self {
            face: Face::from_index(index / 3),
            power,
        }
    }

    /// `3 * face + power - 1`, which orders the moves `U U2 U' R R2 R' ...`.
    #[must_use]
    pub const fn index(self) -> usize {
        3 * self.face as usize + self.power as usize - 1
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        Self {
            face: self.face,
            power: self.power.inverse(),
        }
    }

    /// Whether this move preserves membership in the phase 2 subgroup.
    #[must_use]
    pub const fn is_phase2(self) -> bool {
        matches!(self.face, Face::U | Face::D) || matches!(self.power, Power::Half)
    }

    /// The position of this move inside [`Move::PHASE2`], if it is a phase 2
    /// move.
    #[must_use]
    pub fn phase2_index(self) -> Option<usize> {
        Self::PHASE2.iter().position(|&m| m == self)
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.face, self.power)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("Empty move token")]
    Empty,
    #[error("Unknown face `{0}`, expected one of U R F D L B")]
    UnknownFace(char),
    #[error("Unknown turn suffix `{0}`, expected nothing, `2`, `'` or `3`")]
    UnknownSuffix(String),
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let letter = chars.next().ok_or(ParseMoveError::Empty)?;
        let face = Face::from_letter(letter).ok_or(ParseMoveError::UnknownFace(letter))?;
        let power = match chars.as_str() {
            "" | "1" => Power::Quarter,
            "2" | "2'" => Power::Half,
            "'" | "3" => Power::Inverse,
            other => return Err(ParseMoveError::UnknownSuffix(other.to_owned())),
        };
        Ok(Move { face, power })
    }
}

/// A sequence of moves, used for scrambles and solutions.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MoveSequence(pub Vec<Move>);

impl MoveSequence {
    /// The sequence that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        MoveSequence(self.iter().rev().map(|m| m.inverse()).collect())
    }
}

impl FromStr for MoveSequence {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(MoveSequence)
    }
}

impl Display for MoveSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iter().join(" "))
    }
}

impl Deref for MoveSequence {
    type Target = Vec<Move>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MoveSequence {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Move>> for MoveSequence {
    fn from(moves: Vec<Move>) -> Self {
        MoveSequence(moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_index_round_trip() {
        for (i, m) in Move::ALL.iter().enumerate() {
            assert_eq!(m.index(), i);
            assert_eq!(Move::from_index(i), *m);
        }
    }

    #[test]
    fn test_phase2_moves() {
        let phase2 = Move::ALL.iter().filter(|m| m.is_phase2()).copied().collect_vec();
        assert_eq!(phase2, Move::PHASE2.to_vec());
        assert_eq!(Move::new(Face::R, Power::Half).phase2_index(), Some(3));
        assert_eq!(Move::new(Face::R, Power::Quarter).phase2_index(), None);
    }

    #[test]
    fn test_opposite() {
        assert_eq!(Face::U.opposite(), Face::D);
        assert_eq!(Face::L.opposite(), Face::R);
        assert_eq!(Face::B.opposite(), Face::F);
    }

    #[test]
    fn test_parse_and_display() {
        let seq: MoveSequence = "R U2 F' D3 L1 B".parse().unwrap();
        assert_eq!(seq.to_string(), "R U2 F' D' L B");
        assert_eq!(seq.inverse().to_string(), "B' L' D F U2 R'");
        assert_eq!(
            "X".parse::<Move>().unwrap_err(),
            ParseMoveError::UnknownFace('X')
        );
        assert_eq!(
            "R4".parse::<Move>().unwrap_err(),
            ParseMoveError::UnknownSuffix("4".to_owned())
        );
        assert!("".parse::<MoveSequence>().unwrap().is_empty());
    }
}
