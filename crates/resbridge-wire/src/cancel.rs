use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, WireError};

/// Cooperative stop signal polled by every wait and transfer loop.
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;

    /// `Err(Cancelled)` once the signal is raised.
    fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(WireError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A signal that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Cancellation for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<T: Cancellation + ?Sized> Cancellation for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: Cancellation + ?Sized> Cancellation for Arc<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Adapts a host predicate such as an interrupt-pending check.
#[derive(Debug, Clone, Copy)]
pub struct CancelFn<F>(pub F);

impl<F: Fn() -> bool> Cancellation for CancelFn<F> {
    fn is_cancelled(&self) -> bool {
        (self.0)()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn atomic_flag_trips_checkpoint() {
        let flag = Arc::new(AtomicBool::new(false));
        assert!(flag.checkpoint().is_ok());
        flag.store(true, Ordering::SeqCst);
        assert!(matches!(flag.checkpoint(), Err(WireError::Cancelled)));
    }

    #[test]
    fn predicate_is_polled_each_time() {
        let polls = Cell::new(0);
        let cancel = CancelFn(|| {
            polls.set(polls.get() + 1);
            polls.get() > 2
        });
        assert!(!cancel.is_cancelled());
        assert!(!cancel.is_cancelled());
        assert!(cancel.is_cancelled());
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn never_cancel_is_inert() {
        assert!(NeverCancel.checkpoint().is_ok());
    }
}
