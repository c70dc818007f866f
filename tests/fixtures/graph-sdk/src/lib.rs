//! Stand-in graph SDK: clients keep the options JSON they were created with.
//! Options containing `"secret":"reject"` make the constructor return NULL.

use std::ffi::{CStr, CString, c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

const REJECTED_SECRET: &[u8] = b"\"secret\":\"reject\"";

static CREATED: AtomicUsize = AtomicUsize::new(0);
static FREED: AtomicUsize = AtomicUsize::new(0);

struct Client {
    options_json: CString,
}

/// # Safety
/// `options_json` must be NULL or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn graph_sdk_client_new(options_json: *const c_char) -> *mut c_void {
    if options_json.is_null() {
        return ptr::null_mut();
    }
    let options = unsafe { CStr::from_ptr(options_json) };
    if options
        .to_bytes()
        .windows(REJECTED_SECRET.len())
        .any(|window| window == REJECTED_SECRET)
    {
        return ptr::null_mut();
    }

    CREATED.fetch_add(1, Ordering::SeqCst);
    Box::into_raw(Box::new(Client {
        options_json: options.to_owned(),
    }))
    .cast()
}

/// # Safety
/// `client` must come from `graph_sdk_client_new` and not be freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn graph_sdk_client_free(client: *mut c_void) {
    if client.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(client.cast::<Client>()) });
    FREED.fetch_add(1, Ordering::SeqCst);
}

/// # Safety
/// `client` must be a live handle from `graph_sdk_client_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn graph_sdk_client_options(client: *const c_void) -> *const c_char {
    let client = unsafe { &*client.cast::<Client>() };
    client.options_json.as_ptr()
}

#[unsafe(no_mangle)]
pub extern "C" fn graph_sdk_clients_created() -> usize {
    CREATED.load(Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub extern "C" fn graph_sdk_clients_freed() -> usize {
    FREED.load(Ordering::SeqCst)
}
