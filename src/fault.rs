//! Debug-build invariant violations.
//!
//! A tripped invariant means the calling layer broke a contract (for
//! example, using the serial fast path without a writable bank) and
//! continuing would corrupt hardware state. There is deliberately no
//! recovery: the installed hook halts. Release builds compile the
//! checks out at the call sites, so nothing here costs anything in the
//! field.

use core::cell::RefCell;

use critical_section::Mutex;

static HOOK: Mutex<RefCell<Option<fn() -> !>>> = Mutex::new(RefCell::new(None));

/// Install the halt hook. The firmware binary points this at an
/// LED-and-halt routine; without one, a trip panics.
pub fn set_fault_hook(hook: fn() -> !) {
    critical_section::with(|cs| {
        HOOK.borrow_ref_mut(cs).replace(hook);
    })
}

/// Halt through the installed hook. Only debug-build checks call this.
#[cfg_attr(not(debug_assertions), allow(dead_code))]
pub(crate) fn trip() -> ! {
    let hook = critical_section::with(|cs| *HOOK.borrow_ref(cs));
    match hook {
        Some(halt) => halt(),
        None => panic!("firmware invariant violated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "firmware invariant violated")]
    fn trips_to_panic_without_a_hook() {
        trip();
    }
}
