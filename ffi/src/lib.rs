//! C-ABI wrapper around `bdl-core`.
//!
//! # Overview
//! Exposes operation listing and calling through `extern "C"` functions in
//! host-does-IO style: the C caller asks for a request, performs the HTTP
//! GET with its own stack, and hands the response back to be wrapped into
//! the same envelope the Rust dispatcher produces.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiEnvelope` carries every outcome: success payload, caller
//!   error, upstream status, host transport failure.
//! - The C caller owns all returned pointers and must call the matching
//!   `bdl_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bdl_core::config::DEFAULT_LANG;
use bdl_core::{BdlClient, Catalog, HttpResponse, ToolError, Translator};
use serde_json::Value;

use types::*;

/// Borrow a C string as `&str`, treating invalid UTF-8 as empty.
///
/// # Safety
/// `ptr` must be non-null and point to a NUL-terminated string that
/// outlives the returned reference.
unsafe fn str_arg<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or("")
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`.
///
/// `lang` is the default response language; null selects `pl`.
/// Returns null if `base_url` is null or if an internal panic occurs.
/// The caller must free the returned pointer with `bdl_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_client_new(base_url: *const c_char, lang: *const c_char) -> *mut FfiBdlClient {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let url = unsafe { str_arg(base_url) };
        let lang = if lang.is_null() {
            DEFAULT_LANG
        } else {
            unsafe { str_arg(lang) }
        };
        match Catalog::builtin() {
            Ok(catalog) => Box::into_raw(Box::new(FfiBdlClient {
                catalog,
                translator: Translator::new(lang),
                client: BdlClient::new(url),
            })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `bdl_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_client_free(client: *mut FfiBdlClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The operation catalog as JSON: `{"tools":[{name, description, inputSchema}]}`.
///
/// Returns null if `client` is null. Free with `bdl_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_list_operations(client: *const FfiBdlClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        to_c_string(client.catalog.to_json().to_string())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// Build the GET for `operation` called with `arguments_json`.
///
/// `arguments_json` may be null, meaning no arguments. On failure returns
/// null and, if `out_error` is non-null, stores a failure envelope there
/// (free it with `bdl_free_envelope`). Free a returned request with
/// `bdl_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_build_request(
    client: *const FfiBdlClient,
    operation: *const c_char,
    arguments_json: *const c_char,
    out_error: *mut *mut FfiEnvelope,
) -> *mut FfiHttpRequest {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return Err(FfiEnvelope::null_arg("client"));
        }
        if operation.is_null() {
            return Err(FfiEnvelope::null_arg("operation"));
        }
        let client = unsafe { &*client };
        let name = unsafe { str_arg(operation) };

        let arguments = if arguments_json.is_null() {
            Value::Null
        } else {
            serde_json::from_str(unsafe { str_arg(arguments_json) }).map_err(|e| {
                FfiEnvelope::from_error(&ToolError::Validation {
                    parameter: "arguments".to_string(),
                    reason: format!("not valid JSON: {e}"),
                })
            })?
        };

        client
            .catalog
            .get(name)
            .and_then(|op| client.translator.translate(op, &arguments))
            .and_then(|shape| client.client.build_request(&shape))
            .map(FfiHttpRequest::from_core)
            .map_err(|e| FfiEnvelope::from_error(&e))
    }))
    .unwrap_or_else(|_| Err(FfiEnvelope::panic("bdl_build_request")));

    match outcome {
        Ok(request) => request,
        Err(envelope) => {
            if out_error.is_null() {
                bdl_free_envelope(envelope);
            } else {
                unsafe { *out_error = envelope };
            }
            std::ptr::null_mut()
        }
    }
}

/// Wrap the response the host received into an envelope.
///
/// 2xx bodies become the success payload; any other status becomes an
/// `UpstreamHttpError`. Never returns null. Free with `bdl_free_envelope`.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_parse_response(
    client: *const FfiBdlClient,
    response: *const FfiHttpResponse,
) -> *mut FfiEnvelope {
    catch_unwind(|| {
        if client.is_null() {
            return FfiEnvelope::null_arg("client");
        }
        if response.is_null() {
            return FfiEnvelope::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        let body = if resp.body.is_null() {
            String::new()
        } else {
            unsafe { str_arg(resp.body) }.to_string()
        };
        let result = client.client.parse_response(HttpResponse {
            status: resp.status,
            body,
        });
        FfiEnvelope::from_core(&bdl_core::ResponseEnvelope::from_result(result))
    })
    .unwrap_or_else(|_| FfiEnvelope::panic("bdl_parse_response"))
}

/// Envelope for a request the host could not complete (connection refused,
/// timeout). `message` may be null. Never returns null.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_transport_failure(message: *const c_char) -> *mut FfiEnvelope {
    catch_unwind(|| {
        let message = if message.is_null() {
            "transport failed".to_string()
        } else {
            unsafe { str_arg(message) }.to_string()
        };
        FfiEnvelope::from_error(&ToolError::Transport(message))
    })
    .unwrap_or_else(|_| FfiEnvelope::panic("bdl_transport_failure"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `bdl_build_request`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiEnvelope` returned by any function above. Safe to call with
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_free_envelope(envelope: *mut FfiEnvelope) {
    if envelope.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let envelope = unsafe { Box::from_raw(envelope) };
        if !envelope.json.is_null() {
            drop(unsafe { CString::from_raw(envelope.json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn bdl_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
