//! C-linkage entry points.
//!
//! Every function returns `0` on success and `-1` on any failure. Failures are
//! logged; no panic or diagnostic text crosses the boundary. All functions
//! share one process-wide [`ModelHandle`].

use std::ffi::{c_char, c_float, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use lazy_static::lazy_static;
use log::{error, warn};

use crate::engine::{Backend, DefaultBackend};
use crate::handle::{HandleError, ModelHandle};

pub const FT_OK: c_int = 0;
pub const FT_ERROR: c_int = -1;

lazy_static! {
    static ref MODEL_HANDLE: ModelHandle<DefaultBackend> = ModelHandle::default();
}

/// The handle behind the C entry points.
pub fn global_handle() -> &'static ModelHandle<DefaultBackend> {
    &MODEL_HANDLE
}

/// Copies `src` into `dst` as a NUL-terminated C string.
///
/// At most `dst.len() - 1` bytes are copied, cut back to a character
/// boundary. Returns the full byte length of `src`, so a result of
/// `dst.len()` or more means the copy was truncated. An empty `dst` receives
/// nothing.
pub fn copy_c_string(src: &str, dst: &mut [u8]) -> usize {
    if let Some(capacity) = dst.len().checked_sub(1) {
        let mut end = src.len().min(capacity);
        while !src.is_char_boundary(end) {
            end -= 1;
        }
        dst[..end].copy_from_slice(&src.as_bytes()[..end]);
        dst[end] = 0;
    }
    src.len()
}

fn guarded(name: &str, f: impl FnOnce() -> c_int) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(status) => status,
        Err(_) => {
            error!("{} panicked", name);
            FT_ERROR
        }
    }
}

fn status(name: &str, result: Result<(), HandleError>) -> c_int {
    match result {
        Ok(()) => FT_OK,
        Err(e) => {
            warn!("{} failed: {}", name, e);
            FT_ERROR
        }
    }
}

unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, HandleError> {
    if ptr.is_null() {
        return Err(HandleError::InvalidInput(format!("{} is NULL", what)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| HandleError::InvalidInput(format!("{} is not valid UTF-8", what)))
}

/// [`ft_load_model`] against an explicit handle.
///
/// # Safety
/// `path` must be NULL or a valid NUL-terminated string.
pub unsafe fn load_model_with<B: Backend>(handle: &ModelHandle<B>, path: *const c_char) -> c_int {
    let result = read_str(path, "path").and_then(|path| handle.load(path).map(|_| ()));
    status("ft_load_model", result)
}

/// [`ft_predict_bounded`] against an explicit handle.
///
/// # Safety
/// `query` must be NULL or a valid NUL-terminated string. `prob` and
/// `required` must be NULL or valid for writes. `out` must be NULL or valid
/// for `out_size` bytes of writes.
pub unsafe fn predict_with<B: Backend>(
    handle: &ModelHandle<B>,
    query: *const c_char,
    prob: *mut c_float,
    out: *mut c_char,
    out_size: c_int,
    required: *mut c_int,
) -> c_int {
    let label_buf: &mut [u8] = if out.is_null() || out_size <= 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(out.cast::<u8>(), out_size as usize)
    };
    copy_c_string("", label_buf);
    if !prob.is_null() {
        *prob = -1.0;
    }
    if !required.is_null() {
        *required = 0;
    }
    if prob.is_null() {
        return status(
            "ft_predict",
            Err(HandleError::InvalidInput("probability pointer is NULL".into())),
        );
    }

    let result = read_str(query, "query")
        .and_then(|query| handle.predict(query))
        .map(|prediction| {
            *prob = prediction.probability;
            let needed = copy_c_string(&prediction.label, label_buf);
            if !required.is_null() {
                *required = c_int::try_from(needed).unwrap_or(c_int::MAX);
            }
        });
    status("ft_predict", result)
}

/// [`ft_get_vector_dimension`] against an explicit handle.
pub fn vector_dimension_with<B: Backend>(handle: &ModelHandle<B>) -> c_int {
    handle
        .dimension()
        .and_then(|dimension| c_int::try_from(dimension).ok())
        .unwrap_or(FT_ERROR)
}

/// [`ft_get_sentence_vector`] against an explicit handle.
///
/// # Safety
/// `query` must be NULL or a valid NUL-terminated string. `vector` must be
/// NULL or valid for `vector_size` floats of writes.
pub unsafe fn sentence_vector_with<B: Backend>(
    handle: &ModelHandle<B>,
    query: *const c_char,
    vector: *mut c_float,
    vector_size: c_int,
) -> c_int {
    if vector.is_null() || vector_size < 0 {
        return status(
            "ft_get_sentence_vector",
            Err(HandleError::InvalidInput("vector buffer is NULL or negative".into())),
        );
    }

    let result = read_str(query, "query")
        .and_then(|query| handle.sentence_vector(query))
        .and_then(|computed| {
            let size = vector_size as usize;
            if computed.len() != size {
                return Err(HandleError::DimensionMismatch {
                    expected: computed.len(),
                    actual: size,
                });
            }
            slice::from_raw_parts_mut(vector, size).copy_from_slice(&computed);
            Ok(())
        });
    status("ft_get_sentence_vector", result)
}

/// Loads the model at `path` into the process-wide handle.
///
/// Returns `0` on success, and also when a model is already loaded (the path
/// is then ignored). Returns `-1` if the file does not exist or cannot be
/// loaded.
///
/// # Safety
/// `path` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ft_load_model(path: *const c_char) -> c_int {
    guarded("ft_load_model", || load_model_with(global_handle(), path))
}

/// Predicts the most probable label of `query`.
///
/// On success writes the probability to `prob`, the label to `out`
/// (NUL-terminated, truncated to `out_size`) and returns `0`. On failure sets
/// `prob` to `-1`, writes an empty string and returns `-1`.
///
/// # Safety
/// `query` must be a valid NUL-terminated string, `prob` valid for writes and
/// `out` valid for `out_size` bytes.
#[no_mangle]
pub unsafe extern "C" fn ft_predict(
    query: *const c_char,
    prob: *mut c_float,
    out: *mut c_char,
    out_size: c_int,
) -> c_int {
    guarded("ft_predict", || {
        predict_with(global_handle(), query, prob, out, out_size, std::ptr::null_mut())
    })
}

/// Like [`ft_predict`], and also writes the label's full byte length
/// (excluding the terminator) to `required`. A value of `out_size` or more
/// means the label was truncated.
///
/// # Safety
/// Same as [`ft_predict`]; `required` must be NULL or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn ft_predict_bounded(
    query: *const c_char,
    prob: *mut c_float,
    out: *mut c_char,
    out_size: c_int,
    required: *mut c_int,
) -> c_int {
    guarded("ft_predict_bounded", || {
        predict_with(global_handle(), query, prob, out, out_size, required)
    })
}

/// Embedding width of the loaded model, or `-1` when none is loaded.
#[no_mangle]
pub extern "C" fn ft_get_vector_dimension() -> c_int {
    guarded("ft_get_vector_dimension", || vector_dimension_with(global_handle()))
}

/// Writes the sentence vector of `query` into `vector`.
///
/// `vector_size` must equal the model dimension; otherwise nothing is written
/// and `-1` is returned.
///
/// # Safety
/// `query` must be a valid NUL-terminated string and `vector` valid for
/// `vector_size` floats.
#[no_mangle]
pub unsafe extern "C" fn ft_get_sentence_vector(
    query: *const c_char,
    vector: *mut c_float,
    vector_size: c_int,
) -> c_int {
    guarded("ft_get_sentence_vector", || {
        sentence_vector_with(global_handle(), query, vector, vector_size)
    })
}
