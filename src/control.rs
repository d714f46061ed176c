//! Background-side motion control helpers.

use crate::hal::OneShotTimer;
use crate::motion::BlockSource;

/// Wait until every queued block, including the one executing, is done.
///
/// `maintenance` runs on every poll (heaters, watchdog, communication).
pub fn synchronize<S: BlockSource>(source: &S, mut maintenance: impl FnMut()) {
    while source.blocks_queued() {
        maintenance();
    }
}

/// Let the step interrupt fire again after it was disabled.
pub fn wake_up<T: OneShotTimer>(timer: &mut T) {
    timer.enable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Block;
    use core::cell::Cell;

    /// Source whose queue empties as the maintenance callback runs.
    struct Countdown(Cell<u32>);

    impl BlockSource for Countdown {
        fn try_get_current_block(&mut self) -> Option<Block> {
            None
        }

        fn discard_current_block(&mut self) {}

        fn blocks_queued(&self) -> bool {
            self.0.get() > 0
        }
    }

    #[test]
    fn test_synchronize_polls_until_drained() {
        let source = Countdown(Cell::new(3));
        let mut polls = 0;
        synchronize(&source, || {
            polls += 1;
            source.0.set(source.0.get() - 1);
        });
        assert_eq!(polls, 3);

        // Already empty: returns without polling.
        synchronize(&source, || polls += 1);
        assert_eq!(polls, 3);
    }
}
