//! # Message Bus Module
//!
//! Provides the publish/subscribe channel the roster screen components use
//! to coordinate without holding references to one another.
//!
//! ## Overview
//!
//! - Publishers emit a typed `RosterEvent` without knowing subscribers
//! - Subscribers match the event exhaustively
//! - Delivery is synchronous, in registration order, with each handler
//!   isolated from the others
//!
//! ## Usage
//!
//! ```rust
//! use rosterkit_core::event_bus::{MessageBus, RosterEvent};
//!
//! let bus = MessageBus::new();
//!
//! let subscription = bus.subscribe(|event| match event {
//!     RosterEvent::Added => println!("refetch"),
//!     RosterEvent::Edited(_) | RosterEvent::DeleteRequested(_) => {}
//! });
//!
//! bus.publish(RosterEvent::Added);
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
