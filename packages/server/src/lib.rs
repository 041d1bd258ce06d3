//! Realtime messaging and booking negotiation subsystem for Shitei,
//! a mentorship marketplace.
//!
//! Students discover mentors, exchange chat messages, negotiate scheduled
//! sessions ("bookings") inline within chat threads, and receive
//! notifications. This crate implements the bidirectional event protocol
//! between chat participants, the booking state machine referenced from
//! chat messages, and the conversation/notification aggregation driving
//! unread counts.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
