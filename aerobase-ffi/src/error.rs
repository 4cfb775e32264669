//! Per-thread last-error slot and the panic guard wrapped around every entry
//! point.

use std::{
    cell::{Cell, RefCell},
    ffi::{CString, c_char, c_int},
    panic::{AssertUnwindSafe, catch_unwind},
    ptr,
};

use aerobase_core::{AeroBaseError, ErrorKind};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
    static LAST_CODE: Cell<c_int> = const { Cell::new(0) };
}

fn clear() {
    LAST_ERROR.with(|slot| slot.borrow_mut().take());
    LAST_CODE.with(|code| code.set(0));
}

fn record(code: c_int, message: &str) {
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
    LAST_CODE.with(|cell| cell.set(code));
}

/// Run `body` as a boundary call.
///
/// The calling thread's error slot is cleared first. An `Err` is recorded
/// and reported through `on_error`; a panic is caught, recorded as
/// [`ErrorKind::Unknown`], and also reported through `on_error`.
pub(crate) fn guard<T>(
    on_error: impl FnOnce(c_int) -> T,
    body: impl FnOnce() -> Result<T, AeroBaseError>,
) -> T {
    clear();
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            let code = err.kind().code();
            log::debug!("boundary call failed ({code}): {err}");
            record(code, &err.to_string());
            on_error(code)
        }
        Err(_) => {
            let code = ErrorKind::Unknown.code();
            log::error!("panic caught at the foreign call boundary");
            record(code, "internal panic");
            on_error(code)
        }
    }
}

/// Guard for entry points returning a status code.
pub(crate) fn status(body: impl FnOnce() -> Result<(), AeroBaseError>) -> c_int {
    guard(|code| code, || body().map(|()| 0))
}

/// Message for the most recent failure on this thread, or null.
pub(crate) fn last_error_ptr() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(ptr::null(), |msg| msg.as_ptr()))
}

/// Code for the most recent failure on this thread, or `0`.
pub(crate) fn last_error_code() -> c_int {
    LAST_CODE.with(Cell::get)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn success_clears_the_slot() {
        record(-2, "stale");
        assert_eq!(status(|| Ok(())), 0);
        assert!(last_error_ptr().is_null());
        assert_eq!(last_error_code(), 0);
    }

    #[test]
    fn errors_are_recorded_with_their_code() {
        let code = status(|| Err(AeroBaseError::not_found("airport", "ZZZZ")));
        assert_eq!(code, -1);
        assert_eq!(last_error_code(), -1);
        // SAFETY: the slot holds a live CString until the next boundary call.
        let message = unsafe { CStr::from_ptr(last_error_ptr()) };
        assert_eq!(message.to_str().expect("utf-8"), "airport ZZZZ not found");
    }

    #[test]
    fn panics_become_unknown() {
        let code = status(|| panic!("boom"));
        assert_eq!(code, -99);
        assert_eq!(last_error_code(), -99);
    }

    #[test]
    fn slots_are_per_thread() {
        let _ = status(|| Err(AeroBaseError::invalid_input("here")));
        let other = std::thread::spawn(last_error_code).join().expect("thread");
        assert_eq!(other, 0);
        assert_eq!(last_error_code(), -2);
    }
}
