//! C ABI for externally registered items
//!
//! A plugin describes an item kind with an `ItemCallbacks` table and hands it
//! to the registration procedure together with `CUSTOM_ITEM_API_VERSION`.
//! Every callback receives an opaque item handle (a pointer to the item's
//! `ItemGeometry`, valid for the duration of the call) and the private data
//! pointer its `init` returned.
//!
//! Custom data crosses the boundary as compact JSON text. Plugins draw and
//! add menu entries through the functions in `exports`.

pub mod exports;

pub use exports::RenderTarget;

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::grid::ItemConfig;
use crate::items::ItemGeometry;
use crate::registry::ItemRegistry;

/// Tables built against any other version are rejected
pub const CUSTOM_ITEM_API_VERSION: i64 = 1;

pub type InitFn = unsafe extern "C" fn(item: *const ItemGeometry) -> *mut c_void;
pub type DestroyFn = unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void);
/// Returns JSON text owned by the plugin, valid until the next call on this item
pub type SaveFn = unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void) -> *const c_char;
pub type LoadFn = unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void, json: *const c_char);
pub type ContextMenuFn = unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void, menu: *mut c_void);
pub type MouseEventFn = unsafe extern "C" fn(
    item: *const ItemGeometry,
    data: *mut c_void,
    cfg: *const ItemConfig,
    x: c_int,
    y: c_int,
    buttons: c_int,
    modifiers: c_int,
);
pub type RenderFn =
    unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void, cfg: *const ItemConfig, target: *mut c_void);
pub type FillColorFn = unsafe extern "C" fn(item: *const ItemGeometry, data: *mut c_void) -> u32;
pub type UpdateFn = unsafe extern "C" fn(
    item: *const ItemGeometry,
    data: *mut c_void,
    cfg: *const ItemConfig,
    col: c_int,
    row: c_int,
    w: c_int,
    h: c_int,
);
pub type StringFn = unsafe extern "C" fn() -> *const c_char;

/// Function table supplied by a plugin.
///
/// `get_id`, `get_name`, `init`, `destroy` and `render` are required.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCallbacks {
    pub init: Option<InitFn>,
    pub destroy: Option<DestroyFn>,
    pub save: Option<SaveFn>,
    pub load: Option<LoadFn>,
    pub context_menu: Option<ContextMenuFn>,
    pub mouse_event: Option<MouseEventFn>,
    pub render: Option<RenderFn>,
    pub fill_color: Option<FillColorFn>,
    pub update: Option<UpdateFn>,
    pub get_id: Option<StringFn>,
    pub get_name: Option<StringFn>,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("custom item built for api version {found}, expected {expected}")]
    VersionMismatch { found: i64, expected: i64 },
    #[error("no callback table passed")]
    NullCallbacks,
    #[error("custom item is missing get_id")]
    MissingId,
    #[error("custom item returned an empty or invalid id")]
    InvalidId,
    #[error("custom item '{id}' is missing required callback {callback}")]
    MissingCallback { id: String, callback: &'static str },
    #[error("custom item '{id}' returned an empty or invalid display name")]
    InvalidName { id: String },
    #[error("an item kind with id '{id}' is already registered")]
    AlreadyRegistered { id: String },
    #[error("custom data must be a JSON object or array")]
    InvalidData,
    #[error("custom data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("custom data contains a NUL byte")]
    Nul(#[from] std::ffi::NulError),
    #[error("failed to start registration thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Read a plugin-owned C string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub(crate) unsafe fn read_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = CStr::from_ptr(ptr).to_string_lossy().into_owned();
    (!s.is_empty()).then_some(s)
}

/// Stored per-item plugin state; only objects and arrays are accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomData {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl CustomData {
    pub fn from_value(value: &Value) -> Result<Self, BridgeError> {
        match value {
            Value::Object(o) => Ok(CustomData::Object(o.clone())),
            Value::Array(a) => Ok(CustomData::Array(a.clone())),
            _ => Err(BridgeError::InvalidData),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            CustomData::Object(o) => Value::Object(o),
            CustomData::Array(a) => Value::Array(a),
        }
    }

    /// Compact JSON text for `load`
    pub fn to_document(&self) -> Result<CString, BridgeError> {
        Ok(CString::new(serde_json::to_string(self)?)?)
    }

    /// Parse what `save` returned
    pub fn from_document(text: &CStr) -> Result<Self, BridgeError> {
        let value: Value = serde_json::from_slice(text.to_bytes())?;
        Self::from_value(&value)
    }
}

/// A validated callback table with its id and display name resolved
#[derive(Debug, Clone)]
pub struct CustomKind {
    pub id: String,
    pub name: String,
    pub callbacks: ItemCallbacks,
}

impl CustomKind {
    /// Check the table the way registration requires: id first, then the
    /// mandatory callbacks, then the display name
    pub fn validate(callbacks: &ItemCallbacks) -> Result<Self, BridgeError> {
        let get_id = callbacks.get_id.ok_or(BridgeError::MissingId)?;
        // SAFETY: the plugin guarantees get_id returns a static string or null
        let id = unsafe { read_c_str(get_id()) }.ok_or(BridgeError::InvalidId)?;

        let required = [
            ("init", callbacks.init.is_some()),
            ("destroy", callbacks.destroy.is_some()),
            ("get_name", callbacks.get_name.is_some()),
            ("render", callbacks.render.is_some()),
        ];
        if let Some(&(callback, _)) = required.iter().find(|(_, present)| !present) {
            return Err(BridgeError::MissingCallback { id, callback });
        }

        let name = callbacks
            .get_name
            // SAFETY: same contract as get_id
            .and_then(|get_name| unsafe { read_c_str(get_name()) })
            .ok_or_else(|| BridgeError::InvalidName { id: id.clone() })?;

        Ok(Self { id, name, callbacks: *callbacks })
    }
}

/// Entry point plugins call to register a custom item kind
#[derive(Clone)]
pub struct CustomItemProcedure {
    registry: Arc<ItemRegistry>,
}

impl CustomItemProcedure {
    pub fn new(registry: Arc<ItemRegistry>) -> Self {
        Self { registry }
    }

    pub fn call(&self, callbacks: Option<&ItemCallbacks>, api_version: i64) -> Result<(), BridgeError> {
        if api_version != CUSTOM_ITEM_API_VERSION {
            tracing::error!(
                found = api_version,
                expected = CUSTOM_ITEM_API_VERSION,
                "Rejected custom item with mismatched api version"
            );
            return Err(BridgeError::VersionMismatch { found: api_version, expected: CUSTOM_ITEM_API_VERSION });
        }
        let callbacks = callbacks.ok_or(BridgeError::NullCallbacks)?;
        self.registry.register_custom(callbacks).inspect_err(|e| {
            tracing::error!(error = %e, "Custom item registration failed");
        })
    }

    /// Raw-pointer form for plugins that only have the C table
    ///
    /// # Safety
    /// `callbacks` must be null or point to a valid `ItemCallbacks`.
    pub unsafe fn call_raw(&self, callbacks: *const ItemCallbacks, api_version: i64) -> Result<(), BridgeError> {
        self.call(callbacks.as_ref(), api_version)
    }
}

/// Run plugin discovery on a background thread and register every table it
/// yields. Returns the number of kinds that registered successfully.
pub fn spawn_custom_registration<F>(
    procedure: CustomItemProcedure,
    discover: F,
) -> Result<JoinHandle<usize>, BridgeError>
where
    F: FnOnce() -> Vec<(ItemCallbacks, i64)> + Send + 'static,
{
    thread::Builder::new()
        .name("multiview-registration".into())
        .spawn(move || {
            let tables = discover();
            let total = tables.len();
            let registered = tables
                .iter()
                .filter(|(callbacks, version)| procedure.call(Some(callbacks), *version).is_ok())
                .count();
            tracing::info!(registered, total, "Custom item discovery finished");
            registered
        })
        .map_err(BridgeError::Spawn)
}
