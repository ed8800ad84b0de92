//! Turns submissions of marked forms into partial-page ("pjax") requests.
//!
//! The binder only decides; a DOM backend listens for events on the
//! document, asks the binder what to do with the event target, and carries
//! the answer out. Deciding from the target at event time means forms
//! inserted after setup are covered without rebinding.

use tracing::{debug, instrument, trace};

use crate::config::{BindingConfig, Method};

/// The slice of an element the binder needs to look at.
pub trait DomNode: Sized {
    fn has_class(&self, class: &str) -> bool;

    fn is_form(&self) -> bool;

    /// Nearest form that contains this node, the node itself included.
    fn closest_form(&self) -> Option<Self>;

    fn attribute(&self, name: &str) -> Option<String>;

    /// Successful controls of a form, in document order.
    fn form_fields(&self) -> Vec<(String, String)>;
}

pub const PJAX_HEADER: &str = "X-PJAX";
pub const PJAX_CONTAINER_HEADER: &str = "X-PJAX-Container";

/// Everything needed to fetch a fragment and swap it into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PjaxRequest {
    pub method: Method,
    /// The form's `action`; empty means the current document URL.
    pub url: String,
    pub fields: Vec<(String, String)>,
    pub container: String,
    pub push: bool,
    pub cache: bool,
}

impl PjaxRequest {
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (PJAX_HEADER, "true".to_string()),
            (PJAX_CONTAINER_HEADER, self.container.clone()),
            ("X-Requested-With", "XMLHttpRequest".to_string()),
        ]
    }

    /// Fields as `application/x-www-form-urlencoded`.
    pub fn encoded_fields(&self) -> anyhow::Result<String> {
        Ok(serde_urlencoded::to_string(&self.fields)?)
    }

    /// URL to fetch. GET requests carry the fields in the query string.
    pub fn target_url(&self) -> anyhow::Result<String> {
        if self.method == Method::Post || self.fields.is_empty() {
            return Ok(self.url.clone());
        }
        let query = self.encoded_fields()?;
        let separator = if self.url.contains('?') { '&' } else { '?' };
        Ok(format!("{}{separator}{query}", self.url))
    }

    /// Request body; GET requests have none.
    pub fn body(&self) -> anyhow::Result<Option<String>> {
        match self.method {
            Method::Post => self.encoded_fields().map(Some),
            Method::Get => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Cancel the native submission and issue this request instead.
    Pjax(PjaxRequest),
    /// Let the browser navigate.
    Native,
}

impl SubmitAction {
    pub fn prevents_default(&self) -> bool {
        matches!(self, SubmitAction::Pjax(_))
    }
}

#[derive(Debug)]
pub enum ChangeAction<N> {
    /// Submit this form through the regular submit path.
    SubmitForm(N),
    Ignore,
}

#[derive(Debug, Clone)]
pub struct NavigationBinder {
    config: BindingConfig,
}

impl NavigationBinder {
    pub fn new(config: BindingConfig) -> Self {
        debug!(
            form_class = %config.form_class,
            autosubmit_class = %config.autosubmit_class,
            container = %config.container,
            "initialized navigation binder"
        );
        Self { config }
    }

    #[instrument(skip_all)]
    pub fn on_submit<N: DomNode>(&self, target: &N) -> SubmitAction {
        if !target.is_form() || !target.has_class(&self.config.form_class) {
            trace!("submit target is not a pjax form");
            return SubmitAction::Native;
        }

        let method = target
            .attribute("method")
            .and_then(|raw| Method::parse(&raw))
            .unwrap_or(self.config.method);
        let url = target.attribute("action").unwrap_or_default();
        let fields = target.form_fields();

        debug!(
            method = method.as_str(),
            url = %url,
            field_count = fields.len(),
            container = %self.config.container,
            "intercepted pjax form submit"
        );

        SubmitAction::Pjax(PjaxRequest {
            method,
            url,
            fields,
            container: self.config.container.clone(),
            push: self.config.push,
            cache: self.config.cache,
        })
    }

    #[instrument(skip_all)]
    pub fn on_change<N: DomNode>(&self, target: &N) -> ChangeAction<N> {
        if !target.has_class(&self.config.autosubmit_class) {
            return ChangeAction::Ignore;
        }

        match target.closest_form() {
            Some(form) => {
                debug!("auto-submitting enclosing form");
                ChangeAction::SubmitForm(form)
            }
            None => {
                debug!("auto-submit control has no enclosing form");
                ChangeAction::Ignore
            }
        }
    }
}
