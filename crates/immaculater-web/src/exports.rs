//! Builders exposed under the names
//! server-rendered pages call.

use immaculater_core::escape::escape;
use immaculater_core::fragments;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = HTMLescape)]
pub fn html_escape(
  text: &str
) -> String {
  escape(text)
}

#[wasm_bindgen(js_name = createButton)]
pub fn create_button(
  servlet: &str,
  csrf_token: &str,
  uid: Option<String>,
  hidden_values: &str,
  button_text: &str,
  label_text: Option<String>
) -> String {
  fragments::button_form(
    servlet,
    csrf_token,
    uid.as_deref(),
    hidden_values,
    button_text,
    label_text.as_deref()
  )
}

#[wasm_bindgen(js_name = createOption)]
pub fn create_option(
  value: &str,
  text: &str,
  currently_selected: Option<String>
) -> String {
  fragments::option(
    value,
    text,
    currently_selected.as_deref()
  )
}

#[wasm_bindgen(js_name = viewFilterHTML)]
pub fn view_filter_html(
  servlet: &str,
  csrf_token: &str,
  uid: Option<String>,
  currently_selected: Option<String>
) -> String {
  fragments::view_filter_form(
    servlet,
    csrf_token,
    uid.as_deref(),
    currently_selected.as_deref()
  )
}
