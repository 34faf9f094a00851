use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::catalog::{DEFAULT_RENDER_TIMEOUT_MS, SBV_ENGLISH_URL};
use crate::data_source::{RateSource, SourceError, SourceFuture, SourceResult};
use crate::http_client::BROWSER_USER_AGENT;
use crate::{Payload, RateQuery, SourceId};

const BROWSER_NAMES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Lets scripts on the page settle before the DOM is dumped.
const VIRTUAL_TIME_BUDGET_MS: u64 = 5_000;

/// Locates a Chromium-family binary: an explicit path first, then well-known
/// names on `PATH`.
pub fn find_browser(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        return which::which(path).ok();
    }

    BROWSER_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Loads a page in headless Chromium and reads the rendered DOM.
///
/// On unix the browser leads its own process group, and the whole group
/// (renderer and zygote children included) is killed when the timeout
/// elapses. `kill_on_drop` still covers the main process if the fetch
/// future is dropped early.
#[derive(Debug, Clone)]
pub struct RenderedPageAdapter {
    url: String,
    browser: Option<PathBuf>,
    timeout_ms: u64,
}

impl RenderedPageAdapter {
    /// Adapter for the English SBV page using the browser found on this host.
    pub fn new(explicit_browser: Option<&Path>) -> Self {
        Self::with_browser(SBV_ENGLISH_URL, find_browser(explicit_browser))
    }

    pub fn with_browser(url: impl Into<String>, browser: Option<PathBuf>) -> Self {
        Self {
            url: url.into(),
            browser,
            timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn render(&self, browser: &Path) -> Result<String, SourceError> {
        let mut command = Command::new(browser);
        command
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--window-size=1920,1080")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"))
            .arg(format!("--virtual-time-budget={VIRTUAL_TIME_BUDGET_MS}"))
            .arg("--dump-dom")
            .arg(&self.url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            SourceError::unavailable(format!("failed to launch '{}': {e}", browser.display()))
        })?;
        let pid = child.id();

        let output = match tokio::time::timeout(
            Duration::from_millis(self.timeout_ms),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => {
                output.map_err(|e| SourceError::unavailable(format!("browser process failed: {e}")))?
            }
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid).await;
                }
                return Err(SourceError::timeout(format!(
                    "browser did not finish rendering '{}' within {} ms",
                    self.url, self.timeout_ms
                )));
            }
        };

        if !output.status.success() {
            return Err(SourceError::unavailable(format!(
                "browser exited with {}",
                output.status
            )));
        }

        let dom = String::from_utf8_lossy(&output.stdout).into_owned();
        if dom.trim().is_empty() {
            return Err(SourceError::parse("browser returned an empty DOM"));
        }
        Ok(dom)
    }
}

/// Sends SIGKILL to the process group led by `pid`.
#[cfg(unix)]
async fn kill_process_group(pid: u32) {
    let status = Command::new("kill")
        .args(["-s", "KILL", "--", &format!("-{pid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!(pid, "browser process group killed"),
        Ok(status) => debug!(pid, %status, "kill reported failure for browser process group"),
        Err(error) => debug!(pid, %error, "could not run kill for browser process group"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pid: u32) {}

impl RateSource for RenderedPageAdapter {
    fn id(&self) -> SourceId {
        SourceId::SbvRendered
    }

    fn ensure_available(&self) -> Result<(), SourceError> {
        match self.browser {
            Some(_) => Ok(()),
            None => Err(SourceError::missing_dependency(format!(
                "no Chromium or Chrome binary found (looked for {}); set SBV_RATE_BROWSER",
                BROWSER_NAMES.join(", ")
            ))),
        }
    }

    fn fetch<'a>(&'a self, _query: &'a RateQuery) -> SourceFuture<'a> {
        Box::pin(async move {
            let rendered = match self.browser.as_deref() {
                Some(browser) => {
                    debug!(browser = %browser.display(), url = %self.url, "rendering page");
                    self.render(browser).await
                }
                None => Err(self
                    .ensure_available()
                    .err()
                    .unwrap_or_else(|| SourceError::missing_dependency("browser unavailable"))),
            };

            match rendered {
                Ok(dom) => SourceResult::fetched(self.id(), self.url.clone(), Payload::Text(dom)),
                Err(error) => SourceResult::failed(self.id(), Some(self.url.clone()), error),
            }
        })
    }
}
