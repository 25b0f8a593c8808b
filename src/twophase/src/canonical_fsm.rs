//! A finite state machine over the six faces that only admits canonical move
//! sequences: the same face is never turned twice in a row, and of two
//! commuting faces only the lower one may come first when they are adjacent.

use crate::{
    cubie::CubieCube,
    moves::{Face, Move},
};
use std::collections::HashMap;

const NUM_FACES: usize = Face::ALL.len();

// Bit N is indexed by the face with axis N.
#[derive(Copy, Clone, Eq, Hash, PartialEq, Debug)]
struct FaceMask(u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanonicalFSMState(usize);

const ILLEGAL: CanonicalFSMState = CanonicalFSMState(usize::MAX);

#[derive(Debug)]
pub struct CanonicalFSM {
    next_state_lookup: Vec<[CanonicalFSMState; NUM_FACES]>,
}

fn faces_commute(a: Face, b: Face) -> bool {
    let (a, b) = (CubieCube::basic_move(a), CubieCube::basic_move(b));
    a.multiply(b) == b.multiply(a)
}

impl CanonicalFSM {
    #[must_use]
    pub fn new() -> Self {
        let mut commutes = [FaceMask((1 << NUM_FACES) - 1); NUM_FACES];
        for a in Face::ALL {
            for b in Face::ALL {
                if !faces_commute(a, b) {
                    commutes[a.axis()].0 &= !(1 << b.axis());
                    commutes[b.axis()].0 &= !(1 << a.axis());
                }
            }
        }

        let mut next_state_lookup = vec![];
        let mut mask_to_state = HashMap::from([(FaceMask(0), CanonicalFSMState(0))]);
        // Indexed by state, the faces turned so far that no later
        // non-commuting turn has cancelled.
        let mut state_to_mask = vec![FaceMask(0)];

        let mut queue_index = 0;
        while queue_index < state_to_mask.len() {
            let mut next_state = [ILLEGAL; NUM_FACES];
            let dequeued = state_to_mask[queue_index];
            queue_index += 1;

            for face in Face::ALL {
                let i = face.axis();
                // A greater face in the state that commutes with this one
                // must have come after it in canonical order.
                let skip = (dequeued.0 & commutes[i].0) >> (i + 1) != 0
                    || (dequeued.0 >> i) & 1 != 0;
                if skip {
                    continue;
                }

                let next_mask = FaceMask((dequeued.0 & commutes[i].0) | (1 << i));
                next_state[i] = *mask_to_state.entry(next_mask).or_insert_with(|| {
                    state_to_mask.push(next_mask);
                    CanonicalFSMState(state_to_mask.len() - 1)
                });
            }
            next_state_lookup.push(next_state);
        }

        Self { next_state_lookup }
    }

    /// The state after turning `move_`'s face, or `None` if the resulting
    /// sequence would not be canonical.
    #[must_use]
    pub fn next_state(
        &self,
        current_fsm_state: CanonicalFSMState,
        move_: Move,
    ) -> Option<CanonicalFSMState> {
        match self.next_state_lookup[current_fsm_state.0][move_.face.axis()] {
            ILLEGAL => None,
            state => Some(state),
        }
    }
}

impl Default for CanonicalFSM {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Power;

    fn quarter(face: Face) -> Move {
        Move::new(face, Power::Quarter)
    }

    #[test]
    fn test_canonical_fsm_initially_all_legal() {
        let canonical_fsm = CanonicalFSM::new();
        for move_ in Move::ALL {
            assert!(
                canonical_fsm
                    .next_state(CanonicalFSMState::default(), move_)
                    .is_some()
            );
        }
    }

    #[test]
    fn test_canonical_fsm_prevents_self() {
        let canonical_fsm = CanonicalFSM::new();
        for face in Face::ALL {
            let state = canonical_fsm
                .next_state(CanonicalFSMState::default(), quarter(face))
                .unwrap();
            for power in Power::ALL {
                assert!(
                    canonical_fsm
                        .next_state(state, Move::new(face, power))
                        .is_none()
                );
            }
        }
    }

    #[test]
    fn test_canonical_fsm_orders_opposite_faces() {
        let canonical_fsm = CanonicalFSM::new();
        for a in Face::ALL {
            for b in Face::ALL {
                if a == b {
                    continue;
                }
                let after = |first: Face, second: Face| {
                    let state = canonical_fsm
                        .next_state(CanonicalFSMState::default(), quarter(first))
                        .unwrap();
                    canonical_fsm.next_state(state, quarter(second)).is_some()
                };
                if b == a.opposite() {
                    // Exactly one order of two commuting faces is allowed
                    assert!(after(a, b) ^ after(b, a));
                    assert_eq!(after(a, b), a < b);
                } else {
                    assert!(after(a, b) && after(b, a));
                }
            }
        }
    }

    #[test]
    fn test_canonical_fsm_forbids_sandwich() {
        // U D U is U2 D
        let canonical_fsm = CanonicalFSM::new();
        let state = canonical_fsm
            .next_state(CanonicalFSMState::default(), quarter(Face::U))
            .unwrap();
        let state = canonical_fsm.next_state(state, quarter(Face::D)).unwrap();
        assert!(canonical_fsm.next_state(state, quarter(Face::U)).is_none());
        assert!(canonical_fsm.next_state(state, quarter(Face::R)).is_some());
    }
}
