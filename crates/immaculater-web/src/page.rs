use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use immaculater_core::config::{
  BindingConfig,
  Config
};
use immaculater_core::navigation::NavigationBinder;
use immaculater_core::pjax::NavigationEvent;
use immaculater_core::tooltip::TooltipManager;
use web_sys::Document;

use crate::navigation::{
  self,
  PageNavigation
};
use crate::tooltip::JQueryTooltips;

const BINDINGS_RC: &str =
  include_str!("../bindings.rc");

pub fn load_binding_config()
-> BindingConfig {
  match Config::from_rc_str(BINDINGS_RC)
    .and_then(|cfg| {
      BindingConfig::from_config(&cfg)
    }) {
    | Ok(binding) => {
      tracing::debug!(
        ?binding,
        "loaded page bindings"
      );
      binding
    }
    | Err(error) => {
      tracing::error!(
        error = %format!("{error:#}"),
        "invalid embedded bindings; \
         using defaults"
      );
      BindingConfig::default()
    }
  }
}

/// Everything the glue attaches to one
/// document. Dropping it detaches.
pub struct Page {
  document:   Document,
  binding:    BindingConfig,
  navigation: Option<PageNavigation>,
  tooltips:   Option<
    Rc<
      RefCell<
        TooltipManager<JQueryTooltips>
      >
    >
  >,
  reinstall:  Option<EventListener>
}

impl Page {
  pub fn new(
    document: Document,
    binding: BindingConfig
  ) -> Self {
    Self {
      document,
      binding,
      navigation: None,
      tooltips: None,
      reinstall: None
    }
  }

  /// Binds the delegated pjax
  /// listeners. Later calls are no-ops.
  pub fn bind_navigation(&mut self) {
    if self.navigation.is_some() {
      tracing::debug!(
        "pjax listeners already bound"
      );
      return;
    }

    let binder = Rc::new(
      NavigationBinder::new(
        self.binding.clone()
      )
    );
    self.navigation = Some(
      navigation::bind(
        &self.document,
        binder
      )
    );
  }

  /// Installs tooltips now and again
  /// after every completed navigation.
  pub fn install_tooltips(&mut self) {
    let tooltips = self
      .tooltips
      .get_or_insert_with(|| {
        Rc::new(RefCell::new(
          TooltipManager::new(
            JQueryTooltips::new(
              self.document.clone()
            ),
            self
              .binding
              .tooltip_selector
              .clone()
          )
        ))
      })
      .clone();

    tooltips.borrow_mut().install();

    if self.reinstall.is_none() {
      let tooltips = tooltips.clone();
      self.reinstall =
        Some(EventListener::new(
          &self.document,
          NavigationEvent::End.name(),
          move |_event| {
            match tooltips
              .try_borrow_mut()
            {
              | Ok(mut manager) => {
                manager.install()
              }
              | Err(_) => {
                tracing::warn!(
                  "tooltip manager busy; \
                   skipping reinstall"
                );
              }
            }
          }
        ));
    }

    tracing::debug!(
      state = ?tooltips.borrow().state(),
      "tooltip manager ready"
    );
  }
}
