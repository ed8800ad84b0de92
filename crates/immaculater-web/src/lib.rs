mod exports;
mod navigation;
mod page;
mod tooltip;

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

pub use exports::{
  create_button,
  create_option,
  html_escape,
  view_filter_html
};
pub use page::{
  Page,
  load_binding_config
};

thread_local! {
  static PAGE: RefCell<Option<Page>> =
    const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() {
  console_error_panic_hook::set_once();
  wasm_tracing::set_as_global_default();

  tracing::info!(
    "starting Immaculater page glue"
  );
}

fn with_page(
  f: impl FnOnce(&mut Page)
) -> Result<(), JsValue> {
  let document = web_sys::window()
    .and_then(|window| {
      window.document()
    })
    .ok_or_else(|| {
      JsValue::from_str(
        "no document to attach to"
      )
    })?;

  PAGE.with(|slot| {
    let mut slot = slot.borrow_mut();
    let page =
      slot.get_or_insert_with(|| {
        Page::new(
          document,
          load_binding_config()
        )
      });
    f(page);
  });
  Ok(())
}

/// Makes marked forms submit through
/// pjax. Only the first call binds.
#[wasm_bindgen(js_name = pjaxifyForms)]
pub fn pjaxify_forms()
-> Result<(), JsValue> {
  with_page(Page::bind_navigation)
}

/// Initializes tooltips and keeps them
/// torn down across navigations.
#[wasm_bindgen(js_name = installTooltips)]
pub fn install_tooltips()
-> Result<(), JsValue> {
  with_page(Page::install_tooltips)
}
