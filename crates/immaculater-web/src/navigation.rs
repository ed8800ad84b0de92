use std::rc::Rc;

use anyhow::{
  Context,
  anyhow
};
use gloo::events::{
  EventListener,
  EventListenerOptions
};
use gloo::net::http::Request;
use immaculater_core::config::Method;
use immaculater_core::navigation::{
  ChangeAction,
  DomNode,
  NavigationBinder,
  PjaxRequest,
  SubmitAction
};
use immaculater_core::pjax::{
  self,
  NavigationEvent,
  PjaxHost
};
use wasm_bindgen::{
  JsCast,
  JsValue
};
use web_sys::{
  Document,
  Element,
  FormData,
  HtmlFormElement,
  RequestCache
};

/// A live DOM element seen through
/// the binder's eyes.
pub struct PageElement(pub Element);

impl DomNode for PageElement {
  fn has_class(
    &self,
    class: &str
  ) -> bool {
    self.0.class_list().contains(class)
  }

  fn is_form(&self) -> bool {
    self
      .0
      .dyn_ref::<HtmlFormElement>()
      .is_some()
  }

  fn closest_form(
    &self
  ) -> Option<Self> {
    self
      .0
      .closest("form")
      .ok()
      .flatten()
      .map(PageElement)
  }

  fn attribute(
    &self,
    name: &str
  ) -> Option<String> {
    self.0.get_attribute(name)
  }

  fn form_fields(
    &self
  ) -> Vec<(String, String)> {
    let Some(form) = self
      .0
      .dyn_ref::<HtmlFormElement>()
    else {
      return vec![];
    };

    match collect_form_fields(form) {
      | Ok(fields) => fields,
      | Err(error) => {
        tracing::error!(
          error = %format!("{error:#}"),
          "failed reading form fields"
        );
        vec![]
      }
    }
  }
}

/// Delegated submit and change
/// listeners on the document. Dropping
/// it unbinds them.
pub struct PageNavigation {
  _submit: EventListener,
  _change: EventListener
}

pub fn bind(
  document: &Document,
  binder: Rc<NavigationBinder>
) -> PageNavigation {
  let submit = {
    let binder = binder.clone();
    let host =
      PagePjax::new(document.clone());
    EventListener::new_with_options(
      document,
      "submit",
      EventListenerOptions::enable_prevent_default(),
      move |event| {
        let Some(target) =
          event_element(event)
        else {
          return;
        };

        let action =
          binder.on_submit(&target);
        if action.prevents_default() {
          event.prevent_default();
        }
        if let SubmitAction::Pjax(
          request
        ) = action
        {
          let host = host.clone();
          wasm_bindgen_futures::spawn_local(
            async move {
              pjax::navigate(
                &host, &request
              )
              .await;
            }
          );
        }
      }
    )
  };

  let change = EventListener::new(
    document,
    "change",
    move |event| {
      let Some(target) =
        event_element(event)
      else {
        return;
      };

      if let ChangeAction::SubmitForm(
        form
      ) = binder.on_change(&target)
      {
        submit_form(&form.0);
      }
    }
  );

  tracing::info!(
    "bound pjax submit and change \
     listeners"
  );

  PageNavigation {
    _submit: submit,
    _change: change
  }
}

fn event_element(
  event: &web_sys::Event
) -> Option<PageElement> {
  event
    .target()
    .and_then(|target| {
      target.dyn_into::<Element>().ok()
    })
    .map(PageElement)
}

/// Goes through the submit event so a
/// marked form takes the pjax path.
fn submit_form(form: &Element) {
  let Some(form) =
    form.dyn_ref::<HtmlFormElement>()
  else {
    return;
  };

  if let Err(error) =
    form.request_submit()
  {
    tracing::error!(
      ?error,
      "auto-submit failed"
    );
  }
}

fn collect_form_fields(
  form: &HtmlFormElement
) -> anyhow::Result<Vec<(String, String)>>
{
  let data =
    FormData::new_with_form(form)
      .map_err(|e| {
        anyhow!("FormData: {e:?}")
      })?;
  let entries = js_sys::try_iter(&data)
    .map_err(|e| {
      anyhow!(
        "FormData iteration: {e:?}"
      )
    })?
    .ok_or_else(|| {
      anyhow!(
        "FormData is not iterable"
      )
    })?;

  let mut fields = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|e| {
      anyhow!("FormData entry: {e:?}")
    })?;
    let pair =
      js_sys::Array::from(&entry);
    let name = pair.get(0).as_string();
    let value = pair.get(1).as_string();
    // File inputs carry blobs, which
    // have no urlencoded form.
    if let (Some(name), Some(value)) =
      (name, value)
    {
      fields.push((name, value));
    }
  }
  Ok(fields)
}

/// The live document as a pjax target.
#[derive(Clone)]
pub struct PagePjax {
  document: Document
}

impl PagePjax {
  pub fn new(
    document: Document
  ) -> Self {
    Self {
      document
    }
  }
}

impl PjaxHost for PagePjax {
  fn location(
    &self
  ) -> anyhow::Result<String> {
    self
      .document
      .location()
      .ok_or_else(|| {
        anyhow!("document has no location")
      })?
      .href()
      .map_err(|e| {
        anyhow!("location.href: {e:?}")
      })
  }

  fn dispatch(
    &self,
    event: NavigationEvent
  ) {
    let init =
      web_sys::CustomEventInit::new();
    init.set_bubbles(true);
    let result =
      web_sys::CustomEvent::new_with_event_init_dict(
        event.name(),
        &init
      )
      .and_then(|custom| {
        self
          .document
          .dispatch_event(&custom)
      });
    if let Err(error) = result {
      tracing::warn!(
        event = event.name(),
        ?error,
        "failed dispatching navigation \
         event"
      );
    }
  }

  async fn fetch(
    &self,
    request: &PjaxRequest,
    url: &str
  ) -> anyhow::Result<String> {
    let mut builder = match request
      .method
    {
      | Method::Get => Request::get(url),
      | Method::Post => {
        Request::post(url).header(
          "Content-Type",
          "application/x-www-form-urlencoded; charset=UTF-8"
        )
      }
    };
    for (name, value) in
      request.headers()
    {
      builder =
        builder.header(name, &value);
    }
    builder = builder.cache(
      if request.cache {
        RequestCache::Default
      } else {
        RequestCache::NoStore
      }
    );

    let built = match request.body()? {
      | Some(body) => builder.body(body),
      | None => builder.build()
    }
    .context("failed building request")?;

    let response =
      built.send().await.with_context(
        || {
          format!(
            "{} {url} failed",
            request.method.as_str()
          )
        }
      )?;

    if !response.ok() {
      return Err(anyhow!(
        "{} {url} returned {}",
        request.method.as_str(),
        response.status()
      ));
    }

    response.text().await.context(
      "failed reading response body"
    )
  }

  fn replace(
    &self,
    container: &str,
    html: &str
  ) -> anyhow::Result<()> {
    let region = self
      .document
      .query_selector(container)
      .map_err(|e| {
        anyhow!(
          "invalid container selector \
           {container}: {e:?}"
        )
      })?
      .ok_or_else(|| {
        anyhow!(
          "container {container} not \
           found"
        )
      })?;
    region.set_inner_html(html);
    activate_scripts(
      &self.document,
      &region
    )
  }

  fn set_title(&self, title: &str) {
    self.document.set_title(title);
  }

  fn push_url(
    &self,
    url: &str
  ) -> anyhow::Result<()> {
    web_sys::window()
      .ok_or_else(|| anyhow!("no window"))?
      .history()
      .map_err(|e| {
        anyhow!("window.history: {e:?}")
      })?
      .push_state_with_url(
        &JsValue::NULL,
        "",
        Some(url)
      )
      .map_err(|e| {
        anyhow!("pushState: {e:?}")
      })
  }
}

/// Scripts inserted through innerHTML
/// stay inert; fresh copies run.
fn activate_scripts(
  document: &Document,
  region: &Element
) -> anyhow::Result<()> {
  let scripts = region
    .query_selector_all("script")
    .map_err(|e| {
      anyhow!("script lookup: {e:?}")
    })?;

  for index in 0..scripts.length() {
    let Some(inert) = scripts
      .item(index)
      .and_then(|node| {
        node.dyn_into::<Element>().ok()
      })
    else {
      continue;
    };

    let fresh = document
      .create_element("script")
      .map_err(|e| {
        anyhow!("create script: {e:?}")
      })?;
    for name in
      inert.get_attribute_names().iter()
    {
      let Some(name) = name.as_string()
      else {
        continue;
      };
      if let Some(value) =
        inert.get_attribute(&name)
      {
        fresh
          .set_attribute(&name, &value)
          .map_err(|e| {
            anyhow!(
              "copy script attribute \
               {name}: {e:?}"
            )
          })?;
      }
    }
    fresh.set_text_content(
      inert.text_content().as_deref()
    );
    inert
      .replace_with_with_node_1(&fresh)
      .map_err(|e| {
        anyhow!("swap script: {e:?}")
      })?;
  }

  tracing::trace!(
    count = scripts.length(),
    "activated region scripts"
  );
  Ok(())
}
