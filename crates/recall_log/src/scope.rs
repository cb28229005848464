//! Save/restore guard for ambient per-context state.

use std::cell::RefCell;

/// Installs a value into a slot and puts the previous value back when
/// dropped, on every exit path including unwinding.
pub struct SlotGuard<'a, T> {
    slot: &'a RefCell<Option<T>>,
    saved: Option<T>,
    restored: bool,
}

impl<'a, T> SlotGuard<'a, T> {
    /// Replace the slot content with `value` until the guard ends
    pub fn enter(slot: &'a RefCell<Option<T>>, value: Option<T>) -> Self {
        let saved = slot.replace(value);
        Self {
            slot,
            saved,
            restored: false,
        }
    }

    /// Restore the previous content and return what the slot held.
    pub fn exit(mut self) -> Option<T> {
        self.restored = true;
        self.slot.replace(self.saved.take())
    }
}

impl<T> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        if !self.restored {
            self.slot.replace(self.saved.take());
        }
    }
}
