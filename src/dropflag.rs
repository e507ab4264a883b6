//! This module is for testing only

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type DropFlag<T> = Rc<RefCell<T>>;

pub fn counter() -> DropFlag<usize> {
    DropFlag::new(RefCell::new(0))
}

/// Element that counts its own drops into a shared flag.
#[derive(Debug)]
pub struct Counted {
    pub value: i32,
    pub dropflag: DropFlag<usize>,
}

impl Counted {
    pub fn new(value: i32, dropflag: &DropFlag<usize>) -> Counted {
        Counted { value, dropflag: dropflag.clone() }
    }
}

impl Clone for Counted {
    fn clone(&self) -> Self {
        Counted::new(self.value, &self.dropflag)
    }
}

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Drop for Counted {
    fn drop(&mut self) {
        *self.dropflag.borrow_mut() += 1;
    }
}

thread_local! {
    static BUDGET: Cell<usize> = Cell::new(usize::MAX);
    static LIVE: Cell<isize> = Cell::new(0);
}

/// Element whose `Clone` and `Default` panic once the thread's budget of
/// constructions is spent. Tracks live instances per thread.
#[derive(Debug, PartialEq, Eq)]
pub struct Fuse {
    pub value: i32,
}

impl Fuse {
    /// Allows `budget` more constructions on this thread and resets the live count.
    pub fn arm(budget: usize) {
        BUDGET.with(|b| b.set(budget));
        LIVE.with(|l| l.set(0));
    }

    /// Changes the remaining budget without touching the live count.
    pub fn limit(budget: usize) {
        BUDGET.with(|b| b.set(budget));
    }

    pub fn live() -> isize {
        LIVE.with(|l| l.get())
    }

    pub fn new(value: i32) -> Fuse {
        BUDGET.with(|b| {
            let left = b.get();
            if left == 0 {
                panic!("fuse blown while constructing {}", value);
            }
            b.set(left - 1);
        });
        LIVE.with(|l| l.set(l.get() + 1));
        Fuse { value }
    }
}

impl Default for Fuse {
    fn default() -> Self {
        Fuse::new(0)
    }
}

impl Clone for Fuse {
    fn clone(&self) -> Self {
        Fuse::new(self.value)
    }
}

impl Drop for Fuse {
    fn drop(&mut self) {
        LIVE.with(|l| l.set(l.get() - 1));
    }
}

#[test]
fn dropflag() {
    let flag = counter();
    let counted = Counted::new(3, &flag);
    let copy = counted.clone();
    assert_eq!(0, *flag.borrow());
    std::mem::drop(counted);
    assert_eq!(1, *flag.borrow());
    std::mem::drop(copy);
    assert_eq!(2, *flag.borrow());
}

#[test]
fn fuse_blows_after_budget() {
    Fuse::arm(2);
    let a = Fuse::new(1);
    let b = a.clone();
    assert_eq!(2, Fuse::live());
    let blown = std::panic::catch_unwind(|| Fuse::default());
    assert!(blown.is_err());
    drop((a, b));
    assert_eq!(0, Fuse::live());
    Fuse::limit(usize::MAX);
}
