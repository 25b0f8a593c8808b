use crate::{
    cubie::{Corner, CubieCube, CubieError, Edge},
    moves::Face,
};
use std::collections::HashMap;
use thiserror::Error;

pub const N_FACELET: usize = 54;

/// The facelet string of the solved cube. Faces come in the order U, R, F, D,
/// L, B, each read row by row from its top left facelet.
pub const SOLVED: &str = "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaceletError {
    #[error("Expected 54 facelets but got {0}")]
    WrongLength(usize),
    #[error("Invalid facelet `{symbol}` at position {index}, expected one of U R F D L B")]
    InvalidSymbol { index: usize, symbol: char },
    #[error("There is not exactly one facelet of each colour: `{face}` appears {count} times")]
    ColorCount { face: Face, count: usize },
    #[error("The center of face `{expected}` is `{found}`")]
    MisplacedCenter { expected: Face, found: Face },
    #[error("The centers do not name six different colours")]
    AmbiguousCenters,
    #[error("The corner in slot {0} does not match any corner")]
    CornerUnidentifiable(usize),
    #[error("The edge in slot {0} does not match any edge")]
    EdgeUnidentifiable(usize),
    #[error(transparent)]
    Unreachable(#[from] CubieError),
}

impl FaceletError {
    /// The classic solver error code for this failure.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            FaceletError::WrongLength(_)
            | FaceletError::InvalidSymbol { .. }
            | FaceletError::ColorCount { .. }
            | FaceletError::MisplacedCenter { .. }
            | FaceletError::AmbiguousCenters => 1,
            FaceletError::EdgeUnidentifiable(_) => CubieError::EdgesNotUnique.code(),
            FaceletError::CornerUnidentifiable(_) => CubieError::CornersNotUnique.code(),
            FaceletError::Unreachable(err) => err.code(),
        }
    }
}

/// The facelets of each corner slot, starting with the U or D facelet and
/// going clockwise.
const CORNER_FACELETS: [[usize; 3]; 8] = [
    [8, 9, 20],
    [6, 18, 38],
    [0, 36, 47],
    [2, 45, 11],
    [29, 26, 15],
    [27, 44, 24],
    [33, 53, 42],
    [35, 17, 51],
];

/// The facelets of each edge slot. The first one is the facelet that is
/// unflipped when the edge is correctly oriented.
const EDGE_FACELETS: [[usize; 2]; 12] = [
    [5, 10],
    [7, 19],
    [3, 37],
    [1, 46],
    [32, 16],
    [28, 25],
    [30, 43],
    [34, 52],
    [23, 12],
    [21, 41],
    [50, 39],
    [48, 14],
];

const CORNER_COLORS: [[Face; 3]; 8] = {
    use Face::{B, D, F, L, R, U};
    [
        [U, R, F],
        [U, F, L],
        [U, L, B],
        [U, B, R],
        [D, F, R],
        [D, L, F],
        [D, B, L],
        [D, R, B],
    ]
};

const EDGE_COLORS: [[Face; 2]; 12] = {
    use Face::{B, D, F, L, R, U};
    [
        [U, R],
        [U, F],
        [U, L],
        [U, B],
        [D, R],
        [D, F],
        [D, L],
        [D, B],
        [F, R],
        [F, L],
        [B, L],
        [B, R],
    ]
};

const fn center(face: Face) -> usize {
    9 * face as usize + 4
}

fn parse_facelets(facelets: &str) -> Result<[Face; N_FACELET], FaceletError> {
    let len = facelets.chars().count();
    if len != N_FACELET {
        return Err(FaceletError::WrongLength(len));
    }
    let mut parsed = [Face::U; N_FACELET];
    for (index, symbol) in facelets.chars().enumerate() {
        parsed[index] =
            Face::from_letter(symbol).ok_or(FaceletError::InvalidSymbol { index, symbol })?;
    }
    Ok(parsed)
}

/// Decodes a facelet string into the cube it describes.
///
/// # Errors
///
/// Fails if the string is not 54 facelets over `URFDLB`, does not contain
/// every colour nine times, has its centers in the wrong places, contains a
/// piece that does not exist, or describes a cube that cannot be reached by
/// turning faces.
pub fn decode(facelets: &str) -> Result<CubieCube, FaceletError> {
    let f = parse_facelets(facelets)?;

    let mut count = [0; 6];
    for face in f {
        count[face as usize] += 1;
    }
    if let Some(face) = Face::ALL.into_iter().find(|&face| count[face as usize] != 9) {
        return Err(FaceletError::ColorCount {
            face,
            count: count[face as usize],
        });
    }

    for expected in Face::ALL {
        let found = f[center(expected)];
        if found != expected {
            return Err(FaceletError::MisplacedCenter { expected, found });
        }
    }

    let mut cube = CubieCube::SOLVED;
    for (slot, facelets) in CORNER_FACELETS.iter().enumerate() {
        let ori = (0..3_u8)
            .find(|&ori| matches!(f[facelets[usize::from(ori)]], Face::U | Face::D))
            .ok_or(FaceletError::CornerUnidentifiable(slot))?;
        let clockwise = f[facelets[usize::from(ori + 1) % 3]];
        let anticlockwise = f[facelets[usize::from(ori + 2) % 3]];
        let corner = CORNER_COLORS
            .iter()
            .position(|colors| colors[1] == clockwise && colors[2] == anticlockwise)
            .ok_or(FaceletError::CornerUnidentifiable(slot))?;
        cube.cp[slot] = Corner::ALL[corner];
        cube.co[slot] = ori;
    }

    for (slot, facelets) in EDGE_FACELETS.iter().enumerate() {
        let (a, b) = (f[facelets[0]], f[facelets[1]]);
        let (edge, ori) = EDGE_COLORS
            .iter()
            .enumerate()
            .find_map(|(edge, colors)| match colors {
                [x, y] if *x == a && *y == b => Some((edge, 0)),
                [x, y] if *x == b && *y == a => Some((edge, 1)),
                _ => None,
            })
            .ok_or(FaceletError::EdgeUnidentifiable(slot))?;
        cube.ep[slot] = Edge::ALL[edge];
        cube.eo[slot] = ori;
    }

    cube.verify()?;
    Ok(cube)
}

/// Encodes a cube as a facelet string.
#[must_use]
pub fn encode(cube: &CubieCube) -> String {
    let mut f = [Face::U; N_FACELET];
    for face in Face::ALL {
        f[center(face)] = face;
    }
    for (slot, facelets) in CORNER_FACELETS.iter().enumerate() {
        let colors = CORNER_COLORS[cube.cp[slot] as usize];
        let ori = usize::from(cube.co[slot]);
        for (n, color) in colors.into_iter().enumerate() {
            f[facelets[(n + ori) % 3]] = color;
        }
    }
    for (slot, facelets) in EDGE_FACELETS.iter().enumerate() {
        let colors = EDGE_COLORS[cube.ep[slot] as usize];
        let ori = usize::from(cube.eo[slot]);
        for (n, color) in colors.into_iter().enumerate() {
            f[facelets[(n + ori) % 2]] = color;
        }
    }
    f.iter().map(|face| face.letter()).collect()
}

/// Relabels a facelet string written with arbitrary colour symbols, such as
/// `W`, `G` or `R`, into `URFDLB` notation. Each symbol is named after the
/// face whose center carries it.
///
/// # Errors
///
/// Fails if the string does not have 54 facelets, if two centers share a
/// symbol, or if a symbol does not appear on any center.
pub fn normalize_colors(facelets: &str) -> Result<String, FaceletError> {
    let symbols = facelets.chars().collect::<Vec<_>>();
    if symbols.len() != N_FACELET {
        return Err(FaceletError::WrongLength(symbols.len()));
    }
    let mut mapping = HashMap::new();
    for face in Face::ALL {
        if mapping.insert(symbols[center(face)], face).is_some() {
            return Err(FaceletError::AmbiguousCenters);
        }
    }
    symbols
        .iter()
        .enumerate()
        .map(|(index, &symbol)| {
            mapping
                .get(&symbol)
                .map(|face| face.letter())
                .ok_or(FaceletError::InvalidSymbol { index, symbol })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MoveSequence;

    #[test]
    fn test_solved() {
        assert_eq!(decode(SOLVED).unwrap(), CubieCube::SOLVED);
        assert_eq!(encode(&CubieCube::SOLVED), SOLVED);
    }

    #[test]
    fn test_known_states() {
        // Each entry is a move sequence applied to the solved cube and the
        // facelet string it produces.
        let cases = [
            ("U", "UUUUUUUUUBBBRRRRRRRRRFFFFFFDDDDDDDDDFFFLLLLLLLLLBBBBBB"),
            ("R", "UUFUUFUUFRRRRRRRRRFFDFFDFFDDDBDDBDDBLLLLLLLLLUBBUBBUBB"),
            ("F", "UUUUUULLLURRURRURRFFFFFFFFFRRRDDDDDDLLDLLDLLDBBBBBBBBB"),
            ("D", "UUUUUUUUURRRRRRFFFFFFFFFLLLDDDDDDDDDLLLLLLBBBBBBBBBRRR"),
            ("L", "BUUBUUBUURRRRRRRRRUFFUFFUFFFDDFDDFDDLLLLLLLLLBBDBBDBBD"),
            ("B", "RRRUUUUUURRDRRDRRDFFFFFFFFFDDDDDDLLLULLULLULLBBBBBBBBB"),
        ];
        for (moves, facelets) in cases {
            let cube = CubieCube::from_sequence(&moves.parse::<MoveSequence>().unwrap());
            assert_eq!(encode(&cube), facelets, "{moves}");
            assert_eq!(decode(facelets).unwrap(), cube, "{moves}");
        }
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..200 {
            let cube = CubieCube::random(&mut rng);
            assert_eq!(decode(&encode(&cube)).unwrap(), cube);
        }
    }

    #[test]
    fn test_errors() {
        assert_eq!(decode("UUU"), Err(FaceletError::WrongLength(3)));

        let mut bad = SOLVED.to_owned();
        bad.replace_range(0..1, "X");
        assert_eq!(
            decode(&bad),
            Err(FaceletError::InvalidSymbol {
                index: 0,
                symbol: 'X'
            })
        );

        let mut bad = SOLVED.to_owned();
        bad.replace_range(0..1, "R");
        let err = decode(&bad).unwrap_err();
        assert_eq!(
            err,
            FaceletError::ColorCount {
                face: Face::U,
                count: 8
            }
        );
        assert_eq!(err.code(), 1);

        // Swapping two stickers of one edge flips it.
        let mut bad = SOLVED.chars().collect::<Vec<_>>();
        bad.swap(5, 10);
        let bad = bad.into_iter().collect::<String>();
        assert_eq!(decode(&bad), Err(FaceletError::Unreachable(CubieError::Flip)));

        // Rotating the stickers of one corner twists it.
        let mut bad = SOLVED.chars().collect::<Vec<_>>();
        bad[8] = 'R';
        bad[9] = 'F';
        bad[20] = 'U';
        let bad = bad.into_iter().collect::<String>();
        assert_eq!(decode(&bad), Err(FaceletError::Unreachable(CubieError::Twist)));

        // Swapping two whole edges breaks parity.
        let mut cube = CubieCube::SOLVED;
        cube.ep.swap(0, 1);
        assert_eq!(
            decode(&encode(&cube)),
            Err(FaceletError::Unreachable(CubieError::Parity))
        );
    }

    #[test]
    fn test_normalize_colors() {
        let colored = SOLVED
            .chars()
            .map(|c| match c {
                'U' => 'W',
                'R' => 'R',
                'F' => 'G',
                'D' => 'Y',
                'L' => 'O',
                _ => 'B',
            })
            .collect::<String>();
        assert_eq!(normalize_colors(&colored).unwrap(), SOLVED);
        assert_eq!(
            normalize_colors(&"W".repeat(54)),
            Err(FaceletError::AmbiguousCenters)
        );
    }
}
