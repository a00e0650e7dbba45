//! Bitmask event group
//!
//! A 32-bit set of event flags. Producers set bits, from task or interrupt context, and a single
//! consumer task waits for any bit of a mask to become set.
use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;

struct State {
    bits: u32,
    waiter: WakerRegistration,
}

/// Event flag group
pub struct EventGroup {
    state: Mutex<CriticalSectionRawMutex, RefCell<State>>,
}

impl EventGroup {
    /// Create a new group with all bits cleared
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                bits: 0,
                waiter: WakerRegistration::new(),
            })),
        }
    }

    /// Current bits
    pub fn bits(&self) -> u32 {
        self.state.lock(|state| state.borrow().bits)
    }

    /// Set bits from task context, returns the bits after the update
    pub fn set_bits(&self, mask: u32) -> u32 {
        self.set(mask).0
    }

    /// Set bits from interrupt context
    ///
    /// Returns true if a task was waiting on the group and has been woken.
    pub fn set_bits_from_isr(&self, mask: u32) -> bool {
        self.set(mask).1
    }

    fn set(&self, mask: u32) -> (u32, bool) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.bits |= mask;

            let woken = state.waiter.occupied();
            state.waiter.wake();
            (state.bits, woken)
        })
    }

    /// Clear bits, returns the bits before the update
    pub fn clear_bits(&self, mask: u32) -> u32 {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let previous = state.bits;
            state.bits &= !mask;
            previous
        })
    }

    /// Wait until any bit in `mask` is set
    ///
    /// Returns the bits of `mask` that were set. If `clear` is true those bits are cleared before returning.
    pub async fn wait_bits(&self, mask: u32, clear: bool) -> u32 {
        poll_fn(|cx| {
            self.state.lock(|state| {
                let mut state = state.borrow_mut();
                let matched = state.bits & mask;
                if matched != 0 {
                    if clear {
                        state.bits &= !matched;
                    }
                    Poll::Ready(matched)
                } else {
                    state.waiter.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

impl Default for EventGroup {
    fn default() -> Self {
        Self::new()
    }
}
