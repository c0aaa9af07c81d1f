//! Berth numbering scheme and tier capacities of the coach
//!
//! Berths are numbered `1..=72` in 9 compartments of 8. Within a compartment
//! the position (`n % 8`, where `0` is the 8th position) decides the type:
//!
//! | position | type        |
//! |----------|-------------|
//! | 1, 4     | lower       |
//! | 2, 5     | middle      |
//! | 3, 6     | upper       |
//! | 7        | side lower  |
//! | 0        | side upper  |

use berth_core::{Berth, BerthType};

/// Number of physical berths
pub const BERTH_COUNT: u32 = 72;

/// Berths per compartment
pub const COMPARTMENT_SIZE: u32 = 8;

/// Capacity of the Confirmed tier
pub const CONFIRMED_BERTHS: u32 = 63;

/// Passengers sharing one side lower berth under RAC
pub const RAC_BERTH_OCCUPANCY: u32 = 2;

/// Capacity of the RAC tier
pub const RAC_SLOTS: u32 = (BERTH_COUNT / COMPARTMENT_SIZE) * RAC_BERTH_OCCUPANCY;

/// Capacity of the waiting list
pub const WAITING_LIST_SLOTS: u32 = 10;

/// Type of berth `number`, [`None`] outside `1..=72`
pub fn berth_type(number: u32) -> Option<BerthType> {
    if !(1..=BERTH_COUNT).contains(&number) {
        return None;
    }
    Some(match number % COMPARTMENT_SIZE {
        1 | 4 => BerthType::LowerBerth,
        2 | 5 => BerthType::MiddleBerth,
        3 | 6 => BerthType::UpperBerth,
        7 => BerthType::SideLower,
        _ => BerthType::SideUpper,
    })
}

/// Berth `number` with its type, [`None`] outside `1..=72`
#[inline]
pub fn berth(number: u32) -> Option<Berth> {
    berth_type(number).map(|kind| Berth { number, kind })
}

/// All berths in ascending order
pub fn berths() -> impl Iterator<Item = Berth> {
    (1..=BERTH_COUNT).filter_map(berth)
}

/// Side lower berths, which host the RAC tier, in ascending order
pub fn rac_berths() -> impl Iterator<Item = Berth> {
    berths().filter(|b| b.kind == BerthType::SideLower)
}
