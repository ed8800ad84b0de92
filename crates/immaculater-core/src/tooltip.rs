use tracing::{debug, info};

/// Access to the page's tooltip widgets and its navigation-start event.
pub trait TooltipHost {
    /// Dropping it unregisters the handler.
    type Listener;

    fn initialize(&self, selector: &str);

    fn dispose(&self, selector: &str);

    fn on_navigation_start(&self, handler: Box<dyn FnMut()>) -> Self::Listener;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipState {
    Uninitialized,
    Active,
}

/// Keeps tooltips alive on the page while making sure they are torn down
/// before a partial navigation replaces the elements they hang off.
pub struct TooltipManager<H: TooltipHost> {
    host: H,
    selector: String,
    teardown: Option<H::Listener>,
}

impl<H> TooltipManager<H>
where
    H: TooltipHost + Clone + 'static,
{
    pub fn new(host: H, selector: impl Into<String>) -> Self {
        Self {
            host,
            selector: selector.into(),
            teardown: None,
        }
    }

    pub fn state(&self) -> TooltipState {
        if self.teardown.is_some() {
            TooltipState::Active
        } else {
            TooltipState::Uninitialized
        }
    }

    /// Initializes tooltips and (re)registers the single teardown handler.
    /// Safe to call after every navigation.
    #[tracing::instrument(skip(self), fields(selector = %self.selector))]
    pub fn install(&mut self) {
        self.host.initialize(&self.selector);

        if self.teardown.take().is_some() {
            debug!("replaced previous tooltip teardown handler");
        }

        let host = self.host.clone();
        let selector = self.selector.clone();
        let listener = self.host.on_navigation_start(Box::new(move || {
            debug!(selector = %selector, "disposing tooltips before navigation");
            host.dispose(&selector);
        }));
        self.teardown = Some(listener);

        info!("tooltips installed");
    }
}
