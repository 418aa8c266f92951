use std::process::Command;

use super::UiLinkOpener;

/// Opens sign-in and checkout pages in the system browser.
pub struct DesktopLinkOpener;

/// Plain-http hosts the browser may be sent to. Sign-in redirects land on
/// the app's own loopback listener.
const LOOPBACK_HOSTS: &[&str] = &["127.0.0.1", "localhost", "[::1]"];

impl DesktopLinkOpener {
    /// Any https page, or http pointed back at this machine.
    #[must_use]
    pub fn is_openable(url: &str) -> bool {
        let url = url.trim();
        if url.starts_with("https://") {
            return url.len() > "https://".len();
        }
        let Some(rest) = url.strip_prefix("http://") else {
            return false;
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let host = match authority.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => authority,
        };
        LOOPBACK_HOSTS.contains(&host)
    }
}

impl UiLinkOpener for DesktopLinkOpener {
    fn open_url(&self, url: &str) {
        let url = url.trim();
        if !Self::is_openable(url) {
            return;
        }
        #[cfg(target_os = "macos")]
        {
            let _ = Command::new("open").arg(url).spawn();
        }
        #[cfg(target_os = "windows")]
        {
            let _ = Command::new("cmd").args(["/C", "start", "", url]).spawn();
        }
        #[cfg(target_os = "linux")]
        {
            let _ = Command::new("xdg-open").arg(url).spawn();
        }
    }
}
