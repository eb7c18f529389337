//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use bdl_core::{
    BdlClient, Catalog, ErrorKind, HttpRequest, ResponseEnvelope, ToolError, Translator,
};

/// Opaque handle to a configured client. C callers receive a pointer to
/// this and pass it back into every FFI function.
pub struct FfiBdlClient {
    pub(crate) catalog: Catalog,
    pub(crate) translator: Translator,
    pub(crate) client: BdlClient,
}

/// Convert to a C string, dropping interior NUL bytes instead of failing.
pub(crate) fn to_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|&b| b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A GET request described as C-compatible plain data.
///
/// Built by `bdl_build_request`. The C caller executes it and passes the
/// response back through `bdl_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = to_c_string(req.url);

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            // Boxed slice so capacity == len when reclaimed in `bdl_free_request`.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            url,
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request and
/// passes a pointer to `bdl_parse_response`. The FFI layer reads but does
/// not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiEnvelope`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    UnknownOperation = 1,
    Validation = 2,
    UpstreamHttp = 3,
    Transport = 4,
    Internal = 5,
    Panic = 6,
    NullArg = 7,
}

impl From<ErrorKind> for FfiErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UnknownOperation => FfiErrorCode::UnknownOperation,
            ErrorKind::ValidationError => FfiErrorCode::Validation,
            ErrorKind::UpstreamHttpError => FfiErrorCode::UpstreamHttp,
            ErrorKind::TransportError => FfiErrorCode::Transport,
            ErrorKind::InternalError => FfiErrorCode::Internal,
        }
    }
}

/// Outcome of a call as seen from C.
///
/// `json` always holds the serialized `ResponseEnvelope`, so a host can
/// forward it verbatim. `error_code` and `http_status` repeat the key facts
/// for callers that do not want to parse JSON.
#[repr(C)]
pub struct FfiEnvelope {
    pub error_code: FfiErrorCode,
    pub http_status: u16,
    pub json: *mut c_char,
}

impl FfiEnvelope {
    pub(crate) fn from_core(envelope: &ResponseEnvelope) -> *mut Self {
        let (error_code, http_status) = match &envelope.error {
            None => (FfiErrorCode::Ok, 0),
            Some(error) => (error.kind.into(), error.status.unwrap_or(0)),
        };
        Box::into_raw(Box::new(FfiEnvelope {
            error_code,
            http_status,
            json: to_c_string(envelope.to_json()),
        }))
    }

    pub(crate) fn from_error(err: &ToolError) -> *mut Self {
        Self::from_core(&ResponseEnvelope::from_error(err))
    }

    /// Internal-error envelope tagged with a boundary-specific code.
    fn boundary_failure(code: FfiErrorCode, message: String) -> *mut Self {
        let envelope = ResponseEnvelope::from_error(&ToolError::Internal(message));
        let result = Self::from_core(&envelope);
        // `result` was just allocated above and is non-null.
        unsafe { (*result).error_code = code };
        result
    }

    /// Build a failure for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boundary_failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build a failure for a caught panic.
    pub(crate) fn panic(function: &str) -> *mut Self {
        Self::boundary_failure(FfiErrorCode::Panic, format!("panic in {function}"))
    }
}
