use crate::{canonical_fsm::CanonicalFSMState, moves::Move};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchFrame<C> {
    /// The move that led to this frame, `None` for the root.
    pub move_: Option<Move>,
    pub fsm_state: CanonicalFSMState,
    pub coord: C,
    pub lower_bound: u8,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Search frame stack overflow: capacity is {capacity} plies")]
pub struct FrameStackOverflow {
    pub capacity: usize,
}

#[derive(Debug)]
pub struct FrameStack<C> {
    frames: Vec<SearchFrame<C>>,
    capacity: usize,
}

impl<C: Copy> FrameStack<C> {
    /// A stack holding only `root` that can grow to `capacity` plies above it.
    pub fn new(root: SearchFrame<C>, capacity: usize) -> Self {
        let mut frames = Vec::with_capacity(capacity + 1);
        frames.push(root);
        Self { frames, capacity }
    }

    /// Forgets every ply and replaces the root.
    pub fn reset(&mut self, root: SearchFrame<C>) {
        self.frames.clear();
        self.frames.push(root);
    }

    /// Push the frame for the next ply.
    ///
    /// # Errors
    ///
    /// Fails without modifying the stack if it already holds `capacity`
    /// plies.
    pub fn push(&mut self, frame: SearchFrame<C>) -> Result<(), FrameStackOverflow> {
        if self.depth() >= self.capacity {
            return Err(FrameStackOverflow {
                capacity: self.capacity,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the last ply. The root is never popped.
    pub fn pop(&mut self) -> Option<SearchFrame<C>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn last(&self) -> &SearchFrame<C> {
        // The root is never removed
        &self.frames[self.frames.len() - 1]
    }

    pub fn root(&self) -> &SearchFrame<C> {
        &self.frames[0]
    }

    /// The number of plies above the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The moves from the root to the current ply.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.frames.iter().filter_map(|frame| frame.move_)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Face, Power};

    fn frame(move_: Option<Move>, coord: u32) -> SearchFrame<u32> {
        SearchFrame {
            move_,
            fsm_state: CanonicalFSMState::default(),
            coord,
            lower_bound: 0,
        }
    }

    #[test]
    fn test_push_pop() {
        let r = Move::new(Face::R, Power::Quarter);
        let u = Move::new(Face::U, Power::Half);
        let mut stack = FrameStack::new(frame(None, 0), 2);
        assert_eq!(stack.depth(), 0);
        stack.push(frame(Some(r), 1)).unwrap();
        stack.push(frame(Some(u), 2)).unwrap();
        assert_eq!(stack.moves().collect::<Vec<_>>(), vec![r, u]);
        assert_eq!(stack.last().coord, 2);

        assert_eq!(
            stack.push(frame(Some(r), 3)),
            Err(FrameStackOverflow { capacity: 2 })
        );
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop().map(|f| f.coord), Some(2));
        assert_eq!(stack.last().coord, 1);
        assert_eq!(stack.pop().map(|f| f.coord), Some(1));
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.last().coord, 0);
        assert_eq!(stack.root().coord, 0);
    }

    #[test]
    fn test_reset() {
        let mut stack = FrameStack::new(frame(None, 0), 4);
        stack
            .push(frame(Some(Move::new(Face::F, Power::Inverse)), 1))
            .unwrap();
        stack.reset(frame(None, 7));
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.last().coord, 7);
        assert_eq!(stack.capacity(), 4);
    }
}
