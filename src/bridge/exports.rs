//! Functions plugins call back into
//!
//! `render` receives a `*mut RenderTarget` and `context_menu` a
//! `*mut ContextMenu`, both as `void*`. They are only valid during that
//! callback. Null handles and null strings are ignored.

use std::ffi::{c_char, c_void};

use super::read_c_str;
use crate::host::{Color, GraphicsContext};
use crate::items::ContextMenu;

/// Invoked when a plugin-added menu action is chosen
pub type ActionCallback = unsafe extern "C" fn(user_data: *mut c_void);

/// Drawing surface handed to a custom item's `render`
pub struct RenderTarget<'a> {
    gfx: &'a mut dyn GraphicsContext,
}

impl<'a> RenderTarget<'a> {
    pub fn new(gfx: &'a mut dyn GraphicsContext) -> Self {
        Self { gfx }
    }

    pub fn as_raw(&mut self) -> *mut c_void {
        self as *mut Self as *mut c_void
    }
}

// The plugin owns whatever user_data points at and promises it may be used
// from the thread that shows the menu
struct UserData(*mut c_void);

unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

impl UserData {
    fn get(&self) -> *mut c_void {
        self.0
    }
}

unsafe fn target<'a, 'b>(target: *mut c_void) -> Option<&'a mut RenderTarget<'b>> {
    (target as *mut RenderTarget<'b>).as_mut()
}

/// Fill a rectangle in item-local coordinates
///
/// # Safety
/// `target` must be the pointer passed to the current `render` call.
#[no_mangle]
pub unsafe extern "C" fn multiview_draw_box(target_ptr: *mut c_void, x: f32, y: f32, cx: f32, cy: f32, argb: u32) {
    if let Some(t) = target(target_ptr) {
        t.gfx.draw_box(x, y, cx, cy, Color(argb));
    }
}

/// Render a host source by name into `(0, 0, cx, cy)`
///
/// # Safety
/// `target` must be the pointer passed to the current `render` call and
/// `name` a valid C string.
#[no_mangle]
pub unsafe extern "C" fn multiview_draw_source(target_ptr: *mut c_void, name: *const c_char, cx: f32, cy: f32) {
    if let (Some(t), Some(name)) = (target(target_ptr), read_c_str(name)) {
        t.gfx.draw_source(&name, cx, cy);
    }
}

/// # Safety
/// `target` must be the pointer passed to the current `render` call and
/// `text` a valid C string.
#[no_mangle]
pub unsafe extern "C" fn multiview_draw_label(target_ptr: *mut c_void, text: *const c_char, size: f32, argb: u32) {
    if let (Some(t), Some(text)) = (target(target_ptr), read_c_str(text)) {
        t.gfx.draw_label(&text, size, Color(argb));
    }
}

/// # Safety
/// `target` must be the pointer passed to the current `render` call.
#[no_mangle]
pub unsafe extern "C" fn multiview_push_matrix(target_ptr: *mut c_void) {
    if let Some(t) = target(target_ptr) {
        t.gfx.push_matrix();
    }
}

/// # Safety
/// `target` must be the pointer passed to the current `render` call.
#[no_mangle]
pub unsafe extern "C" fn multiview_pop_matrix(target_ptr: *mut c_void) {
    if let Some(t) = target(target_ptr) {
        t.gfx.pop_matrix();
    }
}

/// # Safety
/// `target` must be the pointer passed to the current `render` call.
#[no_mangle]
pub unsafe extern "C" fn multiview_translate(target_ptr: *mut c_void, x: f32, y: f32) {
    if let Some(t) = target(target_ptr) {
        t.gfx.translate(x, y);
    }
}

/// Append an action to the menu being built. `callback` runs with
/// `user_data` when the user picks it.
///
/// # Safety
/// `menu` must be the pointer passed to the current `context_menu` call,
/// `id` and `label` valid C strings.
#[no_mangle]
pub unsafe extern "C" fn multiview_menu_add_action(
    menu: *mut c_void,
    id: *const c_char,
    label: *const c_char,
    callback: Option<ActionCallback>,
    user_data: *mut c_void,
) {
    let Some(menu) = (menu as *mut ContextMenu).as_mut() else {
        return;
    };
    let Some(id) = read_c_str(id) else {
        return;
    };
    let label = read_c_str(label).unwrap_or_else(|| id.clone());
    match callback {
        Some(callback) => {
            let user = UserData(user_data);
            // SAFETY: the plugin keeps callback and user_data alive while its item exists
            menu.add_handler(id, label, move || unsafe { callback(user.get()) });
        }
        None => menu.add_action(id, label),
    }
}

/// # Safety
/// `menu` must be the pointer passed to the current `context_menu` call.
#[no_mangle]
pub unsafe extern "C" fn multiview_menu_add_separator(menu: *mut c_void) {
    if let Some(menu) = (menu as *mut ContextMenu).as_mut() {
        menu.add_separator();
    }
}
