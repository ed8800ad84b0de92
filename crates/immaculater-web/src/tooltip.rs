use gloo::events::EventListener;
use immaculater_core::pjax::NavigationEvent;
use immaculater_core::tooltip::TooltipHost;
use wasm_bindgen::prelude::*;
use web_sys::Document;

#[wasm_bindgen]
extern "C" {
  type JQuery;

  #[wasm_bindgen(
    catch,
    js_name = jQuery
  )]
  fn jquery(
    selector: &str
  ) -> Result<JQuery, JsValue>;

  #[wasm_bindgen(method, catch)]
  fn tooltip(
    this: &JQuery,
    command: &JsValue
  ) -> Result<JsValue, JsValue>;
}

/// Bootstrap tooltips driven through
/// the page's jQuery plugin.
#[derive(Clone)]
pub struct JQueryTooltips {
  document: Document
}

impl JQueryTooltips {
  pub fn new(
    document: Document
  ) -> Self {
    Self {
      document
    }
  }

  fn call(
    &self,
    selector: &str,
    command: &JsValue
  ) {
    let result = jquery(selector)
      .and_then(|matched| {
        matched.tooltip(command)
      });
    if let Err(error) = result {
      tracing::error!(
        selector,
        ?error,
        "tooltip plugin call failed"
      );
    }
  }
}

impl TooltipHost for JQueryTooltips {
  type Listener = EventListener;

  fn initialize(
    &self,
    selector: &str
  ) {
    self.call(
      selector,
      &JsValue::UNDEFINED
    );
  }

  fn dispose(&self, selector: &str) {
    self.call(
      selector,
      &JsValue::from_str("dispose")
    );
  }

  fn on_navigation_start(
    &self,
    mut handler: Box<dyn FnMut()>
  ) -> EventListener {
    EventListener::new(
      &self.document,
      NavigationEvent::Start.name(),
      move |_event| handler()
    )
  }
}
