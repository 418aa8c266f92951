use std::sync::Arc;

mod desktop;

/// Hands URLs to the operating system, e.g. an OAuth consent page.
pub trait UiLinkOpener: Send + Sync {
    fn open_url(&self, url: &str);
}

pub type LinkOpenerRef = Arc<dyn UiLinkOpener>;

pub use desktop::DesktopLinkOpener;
