//! The node-map view component.
//!
//! DESIGN
//! ======
//! `NodeMapView` is presentational: it owns no transport and renders
//! nothing. It reacts to stabilization and click events from the network
//! with local state transitions and selects the current overlay. The
//! network and the event host are trait parameters so the component can be
//! driven by the physics engine in production and by mocks in tests.
//!
//! LIFECYCLE
//! =========
//! 1. `mount` — take ownership of the network, register the touch guard
//! 2. stabilization progress → one-time fit + loading cleared + edges shown
//! 3. clicks → focus/info or fit/clear
//! 4. `unmount` — remove the touch guard

use uuid::Uuid;

use crate::state::{Person, Relationship};

use super::info::{self, PersonInfo};
use super::network::Network;
use super::types::{Animation, Easing, GraphData, NetworkOptions};

/// Iterations the stabilizer must pass before the view counts as settled.
const STABILIZED_MIN_ITERATIONS: u32 = 10;
/// Fit animation applied once after stabilization.
const STABILIZED_FIT: Animation = Animation { duration_ms: 1000, easing: Easing::EaseInOutQuad };
/// Animation for click-driven focus and fit.
const CLICK_ANIMATION: Animation = Animation { duration_ms: 500, easing: Easing::EaseInOutQuad };
/// Zoom applied when focusing a clicked node.
const FOCUS_SCALE: f64 = 0.95;

// =============================================================================
// SEAMS
// =============================================================================

/// Page-level event registration owned by the embedding environment.
///
/// The view blocks window-level touch scrolling while mounted so panning the
/// canvas does not scroll the page; the guard must not outlive the view.
pub trait EventHost {
    fn block_touch_scroll(&mut self);
    fn unblock_touch_scroll(&mut self);
}

// =============================================================================
// PROPS & OVERLAY
// =============================================================================

/// External inputs, mirroring what the surrounding page supplies.
#[derive(Debug, Clone, Default)]
pub struct ViewProps {
    pub data: GraphData,
    /// Full collections for overlay lookups.
    pub people: Vec<Person>,
    pub relationships: Vec<Relationship>,
    /// Vertical layout offset reserved by the page chrome.
    pub height: f64,
}

/// Three-state overlay selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Stabilization still running.
    Loading,
    /// A node is focused; carries its resolved display data.
    Info(PersonInfo),
    /// Nothing to show.
    None,
}

// =============================================================================
// VIEW
// =============================================================================

pub struct NodeMapView<N: Network, H: EventHost> {
    network: N,
    host: H,
    props: ViewProps,
    options: NetworkOptions,
    loading: bool,
    info: bool,
    focus: Option<Uuid>,
}

impl<N: Network, H: EventHost> NodeMapView<N, H> {
    /// Mount the view: take ownership of the freshly constructed network and
    /// register the window-level touch-scroll guard.
    pub fn mount(network: N, mut host: H, props: ViewProps, options: NetworkOptions) -> Self {
        host.block_touch_scroll();
        Self {
            network,
            host,
            props,
            options,
            loading: true,
            info: false,
            focus: None,
        }
    }

    /// Stabilization progress callback. Once the minimum iteration threshold
    /// is passed, perform a one-time animated fit, clear the loading flag,
    /// and re-apply the configuration with edges revealed.
    pub fn on_stabilization_progress(&mut self, iterations: u32) {
        if self.loading && iterations > STABILIZED_MIN_ITERATIONS {
            self.network.fit(STABILIZED_FIT);
            self.loading = false;
            self.options = self.options.revealed();
            self.network.set_options(self.options);
        }
    }

    /// Click callback. A node hit focuses it and shows the info overlay;
    /// empty canvas resets to fit-to-view and hides the overlay.
    pub fn on_click(&mut self, node: Option<Uuid>) {
        if let Some(id) = node {
            self.network.focus(id, FOCUS_SCALE, CLICK_ANIMATION);
            self.info = true;
            self.focus = Some(id);
        } else {
            self.network.fit(CLICK_ANIMATION);
            self.info = false;
        }
    }

    /// Close the info overlay without moving the viewport.
    pub fn exit(&mut self) {
        self.info = false;
    }

    /// Replace the prop collections (new data from the page).
    pub fn update_props(&mut self, props: ViewProps) {
        self.props = props;
    }

    /// Select the current overlay.
    #[must_use]
    pub fn overlay(&self) -> Overlay {
        if self.loading {
            return Overlay::Loading;
        }
        if self.info {
            if let Some(focus) = self.focus {
                if let Some(resolved) = info::resolve(focus, &self.props.people, &self.props.relationships) {
                    return Overlay::Info(resolved);
                }
            }
        }
        Overlay::None
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn focused(&self) -> Option<Uuid> {
        self.focus
    }

    #[must_use]
    pub fn props(&self) -> &ViewProps {
        &self.props
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Unmount the view, removing the touch-scroll guard. Returns the host
    /// so callers can verify deregistration.
    pub fn unmount(mut self) -> H {
        self.host.unblock_touch_scroll();
        self.host
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
