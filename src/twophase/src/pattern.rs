use crate::{
    cubie::CubieCube,
    facelet::{self, FaceletError},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid cube: {0}")]
    Facelets(#[source] FaceletError),
    #[error("Invalid pattern: {0}")]
    Pattern(#[source] FaceletError),
}

/// Rewrites `start` so that the solved cube of the result corresponds to
/// `pattern` in the original. The result is `pattern⁻¹ · start`.
///
/// # Errors
///
/// Fails if either string is not a valid reachable cube.
pub fn patternize_cube(start: &CubieCube, pattern: &str) -> Result<CubieCube, PatternError> {
    let pattern = facelet::decode(pattern).map_err(PatternError::Pattern)?;
    Ok(pattern.inverse().multiply(start))
}

/// The facelet string form of [`patternize_cube`].
///
/// # Errors
///
/// Fails if either string is not a valid reachable cube.
pub fn patternize(facelets: &str, pattern: &str) -> Result<String, PatternError> {
    let start = facelet::decode(facelets).map_err(PatternError::Facelets)?;
    Ok(facelet::encode(&patternize_cube(&start, pattern)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cubie::CubieError, moves::MoveSequence};

    #[test]
    fn test_solved_pattern_is_identity() {
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let facelets = facelet::encode(&CubieCube::random(&mut rng));
            assert_eq!(patternize(&facelets, facelet::SOLVED).unwrap(), facelets);
        }
    }

    #[test]
    fn test_pattern_equivalence() {
        let scramble: MoveSequence = "F R' U2 B D' L2 F2 U R".parse().unwrap();
        let checkerboard: MoveSequence = "R2 L2 U2 D2 F2 B2".parse().unwrap();
        let start = CubieCube::from_sequence(&scramble);
        let pattern = CubieCube::from_sequence(&checkerboard);

        let remapped = patternize(&facelet::encode(&start), &facelet::encode(&pattern)).unwrap();
        let remapped = facelet::decode(&remapped).unwrap();

        let mut solution = scramble.inverse();
        solution.extend(checkerboard.iter().copied());
        assert_eq!(remapped.apply_sequence(&solution), CubieCube::SOLVED);
        assert_eq!(start.apply_sequence(&solution), pattern);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            patternize(facelet::SOLVED, "UUU"),
            Err(PatternError::Pattern(FaceletError::WrongLength(3)))
        );
        assert_eq!(
            patternize("UUU", facelet::SOLVED),
            Err(PatternError::Facelets(FaceletError::WrongLength(3)))
        );

        let mut cube = CubieCube::SOLVED;
        cube.co[0] = 1;
        cube.co[1] = 1;
        assert_eq!(
            patternize(facelet::SOLVED, &facelet::encode(&cube)),
            Err(PatternError::Pattern(FaceletError::Unreachable(
                CubieError::Twist
            )))
        );
    }
}
