//! Live Chrome backend over the DevTools protocol

use headless_chrome::browser::tab::element::Element;
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::DOM;
use headless_chrome::types::RemoteError;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{BrowserPage, ElementHandle, PageLauncher};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, BrowserResult};

/// Poll interval for readiness waits
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A resource count unchanged for this long counts as network-idle
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

const VISIBILITY_TIMEOUT: Duration = Duration::from_millis(200);

/// Protocol identity of an element handed out as an [`ElementHandle`]
#[derive(Debug, Clone)]
struct NodeRef {
    remote_object_id: String,
    backend_node_id: DOM::NodeId,
    node_id: DOM::NodeId,
    tag_name: String,
}

/// One Chrome process with a single tab
pub struct ChromePage {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
    load_timeout: Duration,
    nodes: Vec<NodeRef>,
    /// Handle already issued for each backend node id
    issued: HashMap<DOM::NodeId, ElementHandle>,
}

impl ChromePage {
    /// Launch a browser and open a blank tab
    pub fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(Duration::from_secs(config.idle_timeout_secs))
            .path(config.chrome_path.clone())
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| BrowserError::Launch(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| BrowserError::Launch(e.to_string()))?;
        tab.set_default_timeout(Duration::from_secs(config.load_timeout_secs));

        info!("🌐 Browser launched (headless: {})", config.headless);

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
            load_timeout: Duration::from_secs(config.load_timeout_secs),
            nodes: Vec::new(),
            issued: HashMap::new(),
        })
    }

    fn tab(&self) -> BrowserResult<Arc<Tab>> {
        self.tab.as_ref().map(Arc::clone).ok_or(BrowserError::Closed)
    }

    /// Issue a handle for `element`, reusing the one already given for the same node
    fn register(&mut self, element: &Element<'_>) -> ElementHandle {
        if let Some(&handle) = self.issued.get(&element.backend_node_id) {
            return handle;
        }
        let handle = ElementHandle(self.nodes.len() as u32);
        self.nodes.push(NodeRef {
            remote_object_id: element.remote_object_id.clone(),
            backend_node_id: element.backend_node_id,
            node_id: element.node_id,
            tag_name: element.tag_name.clone(),
        });
        self.issued.insert(element.backend_node_id, handle);
        handle
    }

    /// Rebuild the crate's element view of a handle
    fn element<'t>(&self, tab: &'t Tab, handle: ElementHandle) -> BrowserResult<Element<'t>> {
        let node = self
            .nodes
            .get(handle.0 as usize)
            .ok_or(BrowserError::StaleElement(handle.0))?;

        Ok(Element {
            remote_object_id: node.remote_object_id.clone(),
            backend_node_id: node.backend_node_id,
            node_id: node.node_id,
            parent: tab,
            attributes: None,
            tag_name: node.tag_name.clone(),
            value: String::new(),
        })
    }

    /// Like [`ChromePage::element`], with a node id valid for the current DOM
    /// bindings; every document lookup discards the previous ones
    fn scope_element<'t>(&self, tab: &'t Tab, handle: ElementHandle) -> BrowserResult<Element<'t>> {
        let mut element = self.element(tab, handle)?;
        element.node_id = tab
            .call_method(DOM::RequestNode {
                object_id: element.remote_object_id.clone(),
            })
            .map_err(|_| BrowserError::StaleElement(handle.0))?
            .node_id;
        Ok(element)
    }

    fn ready_state(&self) -> BrowserResult<String> {
        let remote = self
            .tab()?
            .evaluate("document.readyState", false)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(remote
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    fn resource_count(&self) -> BrowserResult<u64> {
        let remote = self
            .tab()?
            .evaluate("performance.getEntriesByType('resource').length", false)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(remote.value.and_then(|v| v.as_u64()).unwrap_or(0))
    }
}

/// A failed query either matched nothing (`None`) or is a real error
fn query_failure(selector: &str, error: anyhow::Error) -> Option<BrowserError> {
    if error.is::<NoElementFound>() {
        return None;
    }
    match error.downcast::<RemoteError>() {
        Ok(remote) => Some(BrowserError::InvalidSelector {
            selector: selector.to_string(),
            reason: remote.message,
        }),
        Err(other) => Some(BrowserError::Protocol(other.to_string())),
    }
}

fn protocol(error: anyhow::Error) -> BrowserError {
    BrowserError::Protocol(error.to_string())
}

impl BrowserPage for ChromePage {
    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let tab = self.tab()?;
        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.nodes.clear();
        self.issued.clear();
        debug!("Navigated to {}", url);
        Ok(())
    }

    fn wait_for_load(&mut self) -> BrowserResult<()> {
        let deadline = Instant::now() + self.load_timeout;

        // DOM-ready
        while self.ready_state()? != "complete" {
            if Instant::now() >= deadline {
                return Err(BrowserError::LoadTimeout(self.load_timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }

        // Network-idle: no new resource entries during the quiet window
        let mut last_count = self.resource_count()?;
        let mut quiet_since = Instant::now();
        while quiet_since.elapsed() < NETWORK_QUIET_WINDOW {
            if Instant::now() >= deadline {
                return Err(BrowserError::LoadTimeout(self.load_timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
            let count = self.resource_count()?;
            if count != last_count {
                last_count = count;
                quiet_since = Instant::now();
            }
        }

        Ok(())
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle> {
        let tab = self.tab()?;
        match tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(element) => Ok(self.register(&element)),
            Err(e) if e.is::<Timeout>() => Err(BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            }),
            Err(e) => Err(query_failure(selector, e).unwrap_or(BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            })),
        }
    }

    fn query_all(&mut self, scope: Option<ElementHandle>, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        let tab = self.tab()?;
        let found = match scope {
            None => tab.find_elements(selector),
            Some(handle) => self.scope_element(&tab, handle)?.find_elements(selector),
        };

        match found {
            Ok(elements) => Ok(elements.iter().map(|element| self.register(element)).collect()),
            Err(e) => match query_failure(selector, e) {
                None => Ok(Vec::new()),
                Some(err) => Err(err),
            },
        }
    }

    fn is_visible(&mut self, element: ElementHandle) -> BrowserResult<bool> {
        let tab = self.tab()?;
        self.element(&tab, element)?
            .is_visible_with_timeout(VISIBILITY_TIMEOUT)
            .map_err(protocol)
    }

    fn text_content(&mut self, element: ElementHandle) -> BrowserResult<String> {
        let tab = self.tab()?;
        self.element(&tab, element)?.get_inner_text().map_err(protocol)
    }

    fn attribute(&mut self, element: ElementHandle, name: &str) -> BrowserResult<Option<String>> {
        let tab = self.tab()?;
        self.element(&tab, element)?
            .get_attribute_value(name)
            .map_err(protocol)
    }

    fn click(&mut self, element: ElementHandle) -> BrowserResult<()> {
        let tab = self.tab()?;
        self.element(&tab, element)?.click().map_err(protocol)?;
        Ok(())
    }

    fn scroll_into_view(&mut self, element: ElementHandle) -> BrowserResult<()> {
        let tab = self.tab()?;
        self.element(&tab, element)?.scroll_into_view().map_err(protocol)?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> BrowserResult<Value> {
        let remote = self
            .tab()?
            .evaluate(script, false)
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(remote.value.unwrap_or(Value::Null))
    }

    fn content(&mut self) -> BrowserResult<String> {
        self.tab()?.get_content().map_err(protocol)
    }

    fn close(&mut self) -> BrowserResult<()> {
        let Some(tab) = self.tab.take() else {
            return Ok(());
        };
        self.nodes.clear();
        self.issued.clear();

        let result = tab.close(true).map(|_| ()).map_err(protocol);

        // Dropping the browser terminates the Chrome process
        self.browser.take();
        info!("🔒 Browser closed");
        result
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close browser tab cleanly: {}", e);
        }
    }
}

/// Launches a fresh Chrome page per run
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl PageLauncher for ChromeLauncher {
    fn launch(&self) -> BrowserResult<Box<dyn BrowserPage>> {
        Ok(Box::new(ChromePage::launch(&self.config)?))
    }
}
