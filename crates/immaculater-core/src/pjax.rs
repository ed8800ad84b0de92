//! Carries a pjax request out against a page: announce it, fetch the
//! fragment, swap it in, and report how it ended.

use std::future::Future;

use tracing::{debug, error, instrument, warn};

use crate::navigation::PjaxRequest;

/// Events dispatched on the document around a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    Start,
    End,
    Error,
}

impl NavigationEvent {
    pub const fn name(self) -> &'static str {
        match self {
            NavigationEvent::Start => "pjax:start",
            NavigationEvent::End => "pjax:end",
            NavigationEvent::Error => "pjax:error",
        }
    }
}

/// What a page offers a pjax navigation.
pub trait PjaxHost {
    /// The current document URL.
    fn location(&self) -> anyhow::Result<String>;

    fn dispatch(&self, event: NavigationEvent);

    /// Response body of `url`. Non-2xx responses are errors.
    fn fetch(
        &self,
        request: &PjaxRequest,
        url: &str,
    ) -> impl Future<Output = anyhow::Result<String>>;

    /// Swaps `html` into the region matched by `container` and runs the
    /// scripts it carries.
    fn replace(&self, container: &str, html: &str) -> anyhow::Result<()>;

    fn set_title(&self, title: &str);

    fn push_url(&self, url: &str) -> anyhow::Result<()>;
}

/// Runs one navigation. `Start` is dispatched before the fetch; `End` only
/// after the region was replaced. On failure the region is left as it was
/// and `Error` is dispatched instead. Returns the closing event.
#[instrument(skip_all, fields(method = request.method.as_str(), container = %request.container))]
pub async fn navigate<H: PjaxHost>(host: &H, request: &PjaxRequest) -> NavigationEvent {
    host.dispatch(NavigationEvent::Start);

    let outcome = match swap(host, request).await {
        Ok(url) => {
            debug!(url = %url, "replaced region");
            NavigationEvent::End
        }
        Err(err) => {
            error!(
                error = %format!("{err:#}"),
                url = %request.url,
                "pjax navigation failed"
            );
            NavigationEvent::Error
        }
    };

    host.dispatch(outcome);
    outcome
}

async fn swap<H: PjaxHost>(host: &H, request: &PjaxRequest) -> anyhow::Result<String> {
    let url = resolve_url(host, request)?;
    let html = host.fetch(request, &url).await?;
    host.replace(&request.container, &html)?;

    if let Some(title) = response_title(&html) {
        host.set_title(&title);
    }
    if request.push
        && let Err(err) = host.push_url(&url)
    {
        warn!(error = %format!("{err:#}"), url = %url, "failed pushing history entry");
    }
    Ok(url)
}

/// URL to fetch; an empty form action means the current document.
pub fn resolve_url<H: PjaxHost>(host: &H, request: &PjaxRequest) -> anyhow::Result<String> {
    if !request.url.is_empty() {
        return request.target_url();
    }
    let mut request = request.clone();
    request.url = host.location()?;
    request.target_url()
}

/// Text of the last `<title>` in a response, entity-decoded.
pub fn response_title(html: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets valid for `html`.
    let lower = html.to_ascii_lowercase();
    let open = lower.rfind("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    let title = html_escape::decode_html_entities(html[start..end].trim()).into_owned();
    (!title.is_empty()).then_some(title)
}

#[cfg(test)]
mod pjax_tests {
    use std::cell::RefCell;

    use anyhow::anyhow;

    use super::*;
    use crate::config::Method;

    struct FakePage {
        location: String,
        response: Result<String, String>,
        region: RefCell<String>,
        title: RefCell<Option<String>>,
        history: RefCell<Vec<String>>,
        log: RefCell<Vec<String>>,
    }

    impl FakePage {
        fn answering(response: Result<&str, &str>) -> Self {
            Self {
                location: "https://todo.example/todo/home".to_string(),
                response: response.map(str::to_string).map_err(str::to_string),
                region: RefCell::new("original".to_string()),
                title: RefCell::new(None),
                history: RefCell::new(vec![]),
                log: RefCell::new(vec![]),
            }
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl PjaxHost for FakePage {
        fn location(&self) -> anyhow::Result<String> {
            Ok(self.location.clone())
        }

        fn dispatch(&self, event: NavigationEvent) {
            self.log.borrow_mut().push(event.name().to_string());
        }

        async fn fetch(&self, request: &PjaxRequest, url: &str) -> anyhow::Result<String> {
            self.log
                .borrow_mut()
                .push(format!("fetch {} {url}", request.method.as_str()));
            self.response.clone().map_err(|message| anyhow!(message))
        }

        fn replace(&self, container: &str, html: &str) -> anyhow::Result<()> {
            if container != "#main" {
                return Err(anyhow!("container {container} not found"));
            }
            self.log.borrow_mut().push("replace".to_string());
            *self.region.borrow_mut() = html.to_string();
            Ok(())
        }

        fn set_title(&self, title: &str) {
            *self.title.borrow_mut() = Some(title.to_string());
        }

        fn push_url(&self, url: &str) -> anyhow::Result<()> {
            self.history.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    fn request(method: Method, url: &str) -> PjaxRequest {
        PjaxRequest {
            method,
            url: url.to_string(),
            fields: vec![("view_filter".to_string(), "actionable".to_string())],
            container: "#main".to_string(),
            push: false,
            cache: false,
        }
    }

    #[tokio::test]
    async fn start_precedes_fetch_and_end_follows_the_swap() {
        let page = FakePage::answering(Ok("<p>fresh</p>"));
        let outcome = navigate(&page, &request(Method::Post, "/todo/home")).await;

        assert_eq!(outcome, NavigationEvent::End);
        assert_eq!(
            page.log(),
            ["pjax:start", "fetch POST /todo/home", "replace", "pjax:end"]
        );
        assert_eq!(*page.region.borrow(), "<p>fresh</p>");
        assert!(page.history.borrow().is_empty());
        assert_eq!(*page.title.borrow(), None);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_region_untouched() {
        let page = FakePage::answering(Err("POST /todo/home returned 500"));
        let outcome = navigate(&page, &request(Method::Post, "/todo/home")).await;

        assert_eq!(outcome, NavigationEvent::Error);
        assert_eq!(
            page.log(),
            ["pjax:start", "fetch POST /todo/home", "pjax:error"]
        );
        assert_eq!(*page.region.borrow(), "original");
    }

    #[tokio::test]
    async fn missing_container_is_an_error() {
        let page = FakePage::answering(Ok("<p>fresh</p>"));
        let mut pjax = request(Method::Post, "/todo/home");
        pjax.container = "#content".to_string();

        assert_eq!(navigate(&page, &pjax).await, NavigationEvent::Error);
        assert_eq!(page.log().last().map(String::as_str), Some("pjax:error"));
        assert_eq!(*page.region.borrow(), "original");
    }

    #[tokio::test]
    async fn empty_action_fetches_the_current_document() {
        let page = FakePage::answering(Ok(""));
        navigate(&page, &request(Method::Get, "")).await;

        assert_eq!(
            page.log()[1],
            "fetch GET https://todo.example/todo/home?view_filter=actionable"
        );
    }

    #[tokio::test]
    async fn push_and_title_apply_after_the_swap() {
        let page = FakePage::answering(Ok(
            "<title>Todo &amp; more</title><div id=\"list\">items</div>",
        ));
        let mut pjax = request(Method::Get, "/todo/home");
        pjax.push = true;

        assert_eq!(navigate(&page, &pjax).await, NavigationEvent::End);
        assert_eq!(*page.history.borrow(), ["/todo/home?view_filter=actionable"]);
        assert_eq!(page.title.borrow().as_deref(), Some("Todo & more"));
    }

    #[test]
    fn response_title_takes_the_last_title() {
        assert_eq!(response_title("<div>no title</div>"), None);
        assert_eq!(response_title("<TITLE> </TITLE>"), None);
        assert_eq!(
            response_title("<title>Old</title><Title lang=\"en\">New</Title>").as_deref(),
            Some("New")
        );
    }
}
