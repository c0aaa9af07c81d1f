//! :steam_locomotive: Allocation and promotion engine of the berth reservation
//! system.
//!
//! The components, leaves first: the coach [topology], the tier
//! [classifier], the berth [allocator], the [booking] workflow and the
//! [cancellation] cascade. All of them operate on the [database] and are
//! serialized by the [office].

#![allow(rustdoc::private_intra_doc_links)]

pub mod allocator;
pub mod booking;
pub mod cancellation;
pub mod classifier;
pub mod database;
mod office;
pub mod topology;

use berth_core::Config;
pub use office::BookingOffice;

/// Entrypoint of the engine
///
/// Constructs a booking office which is served requests by the surrounding
/// infrastructure.
pub fn launch(config: &Config) -> BookingOffice {
    tracing::info!(?config, "booking office open");
    BookingOffice::new(config)
}
