//! C ABI entry points for engine-native plugins.
//!
//! The engine side links the cdylib and calls these functions from whatever
//! thread it runs callbacks on. Every function returns a status code from
//! [`crate::types::status`]; nothing here panics across the boundary.
//!
//! ```c
//! int32_t unity_relay_on_engine_message(const char *message);
//! int32_t unity_relay_on_engine_message_for(const char *context_id, const char *message);
//! bool    unity_relay_is_bound(void);
//! ```

use std::ffi::{c_char, CStr};
use std::panic::{self, AssertUnwindSafe};

use crate::relay::Registry;
use crate::types::{status, ContextId, Error, Result};

/// Relay `message` through the current relay of the global registry.
///
/// # Safety
///
/// `message` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn unity_relay_on_engine_message(message: *const c_char) -> i32 {
    // SAFETY: forwarded caller contract.
    let message = unsafe { read_str(message, "message") };
    guarded(|| {
        let message = message?;
        Registry::global().current()?.on_engine_message(message)
    })
}

/// Relay `message` through the relay bound for `context_id`.
///
/// # Safety
///
/// Both pointers must be null or point to NUL-terminated strings that stay
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn unity_relay_on_engine_message_for(
    context_id: *const c_char,
    message: *const c_char,
) -> i32 {
    // SAFETY: forwarded caller contract.
    let (context_id, message) =
        unsafe { (read_str(context_id, "context_id"), read_str(message, "message")) };
    guarded(|| {
        let context_id = ContextId::from_string(context_id?.to_owned()).map_err(Error::validation)?;
        let message = message?;
        Registry::global().get(&context_id)?.on_engine_message(message)
    })
}

/// Whether the global registry has a current, live relay.
#[no_mangle]
pub extern "C" fn unity_relay_is_bound() -> bool {
    panic::catch_unwind(|| Registry::global().current().is_ok()).unwrap_or(false)
}

/// Borrow a C string as `&str`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for `'a`.
unsafe fn read_str<'a>(ptr: *const c_char, field: &str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::validation(format!("{field} is null")));
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str()
        .map_err(|err| Error::validation(format!("{field} is not valid UTF-8: {err}")))
}

fn guarded(call: impl FnOnce() -> Result<()>) -> i32 {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => status::OK,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, code = err.status_code(), "engine call failed");
            err.status_code()
        }
        Err(_) => {
            tracing::error!("panic while relaying engine message");
            status::INTERNAL
        }
    }
}
