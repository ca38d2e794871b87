//! Network-graph view of the people directory.
//!
//! SYSTEM CONTEXT
//! ==============
//! Physics layout is delegated to the `force_graph` crate behind the
//! [`network::Network`] trait; [`view::NodeMapView`] is the presentational
//! component that reacts to stabilization and click events and selects the
//! overlay. Route handlers build [`types::GraphData`] from the directory
//! and drive a view per WebSocket connection.

pub mod info;
pub mod network;
pub mod types;
pub mod view;
