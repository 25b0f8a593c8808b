use crate::{
    cache::Tables,
    canonical_fsm::CanonicalFSMState,
    coord::{CoordCube, Phase2Coord},
    cubie::CubieCube,
    moves::Move,
    search_stack::{FrameStack, FrameStackOverflow, SearchFrame},
    solution::Solution,
    start, success, working,
};
use log::{debug, info, trace};
use std::time::{Duration, Instant};

/// The wall clock is read once per this many visited nodes.
const DEADLINE_POLL_INTERVAL: u64 = 1024;

/// Near the end of phase 1 a cube already inside the subgroup must leave it
/// again, so endpoints never repeat a shorter endpoint followed by phase 2
/// moves.
const PHASE2_MOVE_CUTOFF: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchLimits {
    /// The longest solution that will be searched for.
    pub max_depth: u8,
    /// The longest phase 2 tail tried for one phase 1 endpoint.
    pub max_phase2_depth: u8,
    /// Return as soon as a completed depth yields a solution at most this
    /// long. Defaults to `max_depth`.
    pub target_length: Option<u8>,
    pub timeout: Duration,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 24,
            max_phase2_depth: 10,
            target_length: None,
            timeout: Duration::from_millis(1000),
        }
    }
}

impl SearchLimits {
    fn target_length(&self) -> usize {
        usize::from(self.target_length.unwrap_or(self.max_depth))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Phase1Search,
    Phase1Found,
    Phase2Search,
    Solved,
    Exhausted,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Solved(Solution),
    /// The deadline passed. Carries the best solution seen, which may not be
    /// the shortest one the search would have found.
    TimedOut(Option<Solution>),
    /// Every phase 1 depth up to the maximum was searched without finding a
    /// solution.
    Exhausted,
}

enum Interrupt {
    DeadlinePassed,
    Overflow(FrameStackOverflow),
}

impl From<FrameStackOverflow> for Interrupt {
    fn from(overflow: FrameStackOverflow) -> Self {
        Interrupt::Overflow(overflow)
    }
}

/// Per call state of the search.
struct TwoPhaseSearchMutable {
    phase1: FrameStack<CoordCube>,
    phase2: FrameStack<Phase2Coord>,
    best: Option<Solution>,
    state: SearchState,
    nodes_visited: u64,
    deadline: Option<Instant>,
}

impl TwoPhaseSearchMutable {
    fn set_state(&mut self, state: SearchState) {
        if self.state != state {
            trace!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn visit(&mut self) -> Result<(), Interrupt> {
        if self.nodes_visited % DEADLINE_POLL_INTERVAL == 0
            && self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(Interrupt::DeadlinePassed);
        }
        self.nodes_visited += 1;
        Ok(())
    }

    /// The longest total length still worth finding, or `None` if nothing
    /// can beat the best solution.
    fn limit(&self, max_depth: u8) -> Option<u8> {
        match &self.best {
            Some(best) => u8::try_from(best.len()).ok()?.checked_sub(1),
            None => Some(max_depth),
        }
    }
}

pub struct TwoPhaseSearch<'a> {
    tables: &'a Tables,
    limits: SearchLimits,
}

impl<'a> TwoPhaseSearch<'a> {
    #[must_use]
    pub fn new(tables: &'a Tables, limits: SearchLimits) -> Self {
        Self { tables, limits }
    }

    #[must_use]
    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Searches for a solution of `cube`, which must be a reachable state.
    ///
    /// # Errors
    ///
    /// Fails only if a search frame stack overflows, which means the limits
    /// are inconsistent with the stack capacities.
    pub fn solve(&self, cube: &CubieCube) -> Result<SearchOutcome, FrameStackOverflow> {
        info!(start!("Searching for a two-phase solution"));
        let start = Instant::now();

        let coord = CoordCube::from_cubie(cube);
        let root_lower_bound = self.tables.pruning.phase1_lower_bound(&coord);
        let mut mutable = TwoPhaseSearchMutable {
            phase1: FrameStack::new(
                SearchFrame {
                    move_: None,
                    fsm_state: CanonicalFSMState::default(),
                    coord,
                    lower_bound: root_lower_bound,
                },
                usize::from(self.limits.max_depth),
            ),
            phase2: FrameStack::new(
                SearchFrame {
                    move_: None,
                    fsm_state: CanonicalFSMState::default(),
                    coord: Phase2Coord::SOLVED,
                    lower_bound: 0,
                },
                usize::from(self.limits.max_phase2_depth),
            ),
            best: None,
            state: SearchState::Phase1Search,
            nodes_visited: 0,
            deadline: start.checked_add(self.limits.timeout),
        };

        for depth in root_lower_bound..=self.limits.max_depth {
            if let Some(best) = &mutable.best
                && usize::from(depth) >= best.len()
            {
                break;
            }

            debug!(working!("Searching phase 1 depth {}..."), depth);
            let depth_start = Instant::now();
            let nodes_before = mutable.nodes_visited;
            let result = self.search_phase1(&mut mutable, depth);
            debug!(
                working!("Traversed {} nodes in {:.3}s"),
                mutable.nodes_visited - nodes_before,
                depth_start.elapsed().as_secs_f64()
            );

            match result {
                Ok(()) => {}
                Err(Interrupt::Overflow(overflow)) => return Err(overflow),
                Err(Interrupt::DeadlinePassed) => {
                    return Ok(match mutable.best.take() {
                        Some(best) if best.len() <= self.limits.target_length() => {
                            mutable.set_state(SearchState::Solved);
                            info!(
                                success!("Found a {} move solution before the deadline"),
                                best.len()
                            );
                            SearchOutcome::Solved(best)
                        }
                        best => {
                            mutable.set_state(SearchState::TimedOut);
                            info!(
                                "Timed out after {:.3}s and {} nodes",
                                start.elapsed().as_secs_f64(),
                                mutable.nodes_visited
                            );
                            SearchOutcome::TimedOut(best)
                        }
                    });
                }
            }

            if mutable
                .best
                .as_ref()
                .is_some_and(|best| best.len() <= self.limits.target_length())
            {
                break;
            }
        }

        Ok(match mutable.best.take() {
            Some(best) => {
                mutable.set_state(SearchState::Solved);
                info!(
                    success!("Found a {} move solution in {:.3}s"),
                    best.len(),
                    start.elapsed().as_secs_f64()
                );
                SearchOutcome::Solved(best)
            }
            None => {
                mutable.set_state(SearchState::Exhausted);
                info!(
                    "No solution within {} moves after {} nodes",
                    self.limits.max_depth, mutable.nodes_visited
                );
                SearchOutcome::Exhausted
            }
        })
    }

    /// Visits every canonical phase 1 path of exactly `togo` more moves below
    /// the current frame whose lower bounds stay consistent with the depth.
    fn search_phase1(&self, mutable: &mut TwoPhaseSearchMutable, togo: u8) -> Result<(), Interrupt> {
        mutable.visit()?;
        let frame = *mutable.phase1.last();
        if togo == 0 {
            if frame.lower_bound == 0 {
                self.phase1_endpoint(mutable, &frame)?;
            }
            return Ok(());
        }

        for move_ in Move::ALL {
            if frame.lower_bound == 0 && togo < PHASE2_MOVE_CUTOFF && move_.is_phase2() {
                continue;
            }
            let Some(fsm_state) = self.tables.fsm.next_state(frame.fsm_state, move_) else {
                continue;
            };
            let coord = frame.coord.apply_move(move_, &self.tables.moves);
            let lower_bound = self.tables.pruning.phase1_lower_bound(&coord);
            if lower_bound >= togo {
                continue;
            }

            mutable.phase1.push(SearchFrame {
                move_: Some(move_),
                fsm_state,
                coord,
                lower_bound,
            })?;
            let result = self.search_phase1(mutable, togo - 1);
            mutable.phase1.pop();
            result?;
        }
        Ok(())
    }

    fn phase1_endpoint(
        &self,
        mutable: &mut TwoPhaseSearchMutable,
        frame: &SearchFrame<CoordCube>,
    ) -> Result<(), Interrupt> {
        mutable.set_state(SearchState::Phase1Found);
        let phase1_len = u8::try_from(mutable.phase1.depth()).unwrap_or(u8::MAX);
        let limit = mutable.limit(self.limits.max_depth);
        if let (Some(limit), Some(endpoint)) = (limit, frame.coord.phase2(&self.tables.moves))
            && let Some(total) =
                self.total_depth(mutable, phase1_len, endpoint, frame.fsm_state, limit)?
        {
            let solution = Solution::new(mutable.phase1.moves(), mutable.phase2.moves());
            debug!(
                working!("Found a {} move solution ({} + {})"),
                total,
                phase1_len,
                total - phase1_len
            );
            mutable.best = Some(solution);
        }
        mutable.set_state(SearchState::Phase1Search);
        Ok(())
    }

    /// Runs phase 2 from a phase 1 endpoint reached in `phase1_len` moves and
    /// returns the total length of the solution if one of at most `limit`
    /// moves exists. The phase 2 moves are left on the phase 2 stack.
    fn total_depth(
        &self,
        mutable: &mut TwoPhaseSearchMutable,
        phase1_len: u8,
        endpoint: Phase2Coord,
        fsm_state: CanonicalFSMState,
        limit: u8,
    ) -> Result<Option<u8>, Interrupt> {
        let budget = self
            .limits
            .max_phase2_depth
            .min(limit.saturating_sub(phase1_len));
        let lower_bound = self.tables.pruning.phase2_lower_bound(&endpoint);
        if lower_bound > budget {
            return Ok(None);
        }

        mutable.set_state(SearchState::Phase2Search);
        mutable.phase2.reset(SearchFrame {
            move_: None,
            fsm_state,
            coord: endpoint,
            lower_bound,
        });
        for depth in lower_bound..=budget {
            if self.search_phase2(mutable, depth)? {
                return Ok(Some(phase1_len + depth));
            }
        }
        Ok(None)
    }

    /// Returns whether a solution of exactly `togo` more moves exists below
    /// the current frame. On success the path stays on the stack.
    fn search_phase2(&self, mutable: &mut TwoPhaseSearchMutable, togo: u8) -> Result<bool, Interrupt> {
        mutable.visit()?;
        let frame = *mutable.phase2.last();
        if togo == 0 {
            // Only the solved state has a phase 2 distance of zero
            return Ok(frame.lower_bound == 0);
        }

        for (i, move_) in Move::PHASE2.into_iter().enumerate() {
            let Some(fsm_state) = self.tables.fsm.next_state(frame.fsm_state, move_) else {
                continue;
            };
            let coord = frame.coord.apply_move(i, &self.tables.moves);
            let lower_bound = self.tables.pruning.phase2_lower_bound(&coord);
            if lower_bound >= togo {
                continue;
            }

            mutable.phase2.push(SearchFrame {
                move_: Some(move_),
                fsm_state,
                coord,
                lower_bound,
            })?;
            if self.search_phase2(mutable, togo - 1)? {
                return Ok(true);
            }
            mutable.phase2.pop();
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::TableCache, moves::MoveSequence};
    use std::sync::LazyLock;

    static CACHE: LazyLock<TableCache> =
        LazyLock::new(|| TableCache::new(std::env::temp_dir().join("twophase-test-tables")));

    fn search(limits: SearchLimits, scramble: &str) -> SearchOutcome {
        let scramble: MoveSequence = scramble.parse().unwrap();
        let cube = CubieCube::from_sequence(&scramble);
        TwoPhaseSearch::new(CACHE.tables(), limits)
            .solve(&cube)
            .unwrap()
    }

    fn solution(outcome: SearchOutcome) -> Solution {
        match outcome {
            SearchOutcome::Solved(solution) => solution,
            other => panic!("Expected a solution, got {other:?}"),
        }
    }

    #[test_log::test]
    fn test_solved_cube() {
        let solution = solution(search(SearchLimits::default(), ""));
        assert!(solution.is_empty());
    }

    #[test_log::test]
    fn test_single_moves() {
        for move_ in Move::ALL {
            let solution = solution(search(SearchLimits::default(), &move_.to_string()));
            assert_eq!(solution.moves().0, vec![move_.inverse()]);
            assert_eq!(solution.phase1().is_empty(), move_.is_phase2());
        }
    }

    #[test_log::test]
    fn test_phase_split() {
        let scramble: MoveSequence = "R U F' D2 L B2 U' R2".parse().unwrap();
        let cube = CubieCube::from_sequence(&scramble);
        let limits = SearchLimits {
            target_length: Some(8),
            timeout: Duration::from_secs(60),
            ..SearchLimits::default()
        };
        let solution = solution(TwoPhaseSearch::new(CACHE.tables(), limits).solve(&cube).unwrap());

        assert!(solution.len() <= scramble.len());
        assert!(solution.phase2().iter().all(|m| m.is_phase2()));
        let after_phase1 = cube.apply_sequence(&MoveSequence(solution.phase1().to_vec()));
        assert!(CoordCube::from_cubie(&after_phase1).in_phase2_subgroup());
        assert_eq!(cube.apply_sequence(solution.moves()), CubieCube::SOLVED);
    }

    #[test_log::test]
    fn test_random_cubes() {
        let mut rng = fastrand::Rng::with_seed(24);
        let limits = SearchLimits {
            timeout: Duration::from_secs(60),
            ..SearchLimits::default()
        };
        for _ in 0..3 {
            let cube = CubieCube::random(&mut rng);
            let outcome = TwoPhaseSearch::new(CACHE.tables(), limits).solve(&cube).unwrap();
            let solution = match outcome {
                SearchOutcome::Solved(solution) | SearchOutcome::TimedOut(Some(solution)) => {
                    solution
                }
                other => panic!("No solution found: {other:?}"),
            };
            assert!(solution.len() <= 24);
            assert_eq!(cube.apply_sequence(solution.moves()), CubieCube::SOLVED);
        }
    }

    #[test_log::test]
    fn test_exhausted() {
        let limits = SearchLimits {
            max_depth: 1,
            ..SearchLimits::default()
        };
        assert_eq!(search(limits, "R U"), SearchOutcome::Exhausted);
    }

    #[test_log::test]
    fn test_zero_timeout() {
        let limits = SearchLimits {
            timeout: Duration::ZERO,
            ..SearchLimits::default()
        };
        assert_eq!(search(limits, "R U F"), SearchOutcome::TimedOut(None));
    }

    #[test_log::test]
    fn test_target_length_below_optimum() {
        // Unreachable targets still return the best solution of the sweep
        let limits = SearchLimits {
            target_length: Some(0),
            ..SearchLimits::default()
        };
        let solution = solution(search(limits, "F"));
        assert_eq!(solution.to_string(), "F'");
    }
}
