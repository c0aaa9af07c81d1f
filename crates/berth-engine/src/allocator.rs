//! Picks a concrete berth for a classified booking

use std::collections::{BTreeMap, BTreeSet};

use berth_core::{Berth, BerthType, BookingError, Gender, Passenger};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::topology::{self, RAC_BERTH_OCCUPANCY};

/// Passengers aged this or older are seniors
pub const SENIOR_AGE: u32 = 60;

/// Seniors and women travelling with a child are seated on a lower berth
/// whenever one is free
pub fn has_berth_priority(passenger: &Passenger) -> bool {
    let is_senior = passenger.age >= SENIOR_AGE;
    let is_priority_woman = passenger.gender == Gender::Female && passenger.has_child;
    is_senior || is_priority_woman
}

/// Allocate a Confirmed berth for `passenger`
///
/// `occupied` holds the berth numbers of all active tickets. Side lower
/// berths are never handed out here, they belong to the RAC tier.
pub fn allocate_confirmed<R: Rng + ?Sized>(
    occupied: &BTreeSet<u32>,
    passenger: &Passenger,
    rng: &mut R,
) -> Result<Berth, BookingError> {
    let (lower, other): (Vec<Berth>, Vec<Berth>) = topology::berths()
        .filter(|b| b.kind != BerthType::SideLower && !occupied.contains(&b.number))
        .partition(|b| b.kind == BerthType::LowerBerth);

    let pool = if has_berth_priority(passenger) && !lower.is_empty() {
        &lower
    } else if !other.is_empty() {
        &other
    } else {
        &lower
    };

    pool.choose(rng).copied().ok_or_else(|| {
        BookingError::InternalConsistency(format!(
            "no free confirmed berth although {} of them are occupied",
            occupied.len()
        ))
    })
}

/// Allocate a RAC berth
///
/// `occupancy` maps side lower berth numbers to the number of active RAC
/// tickets on them. The lowest berth with a free place wins.
pub fn allocate_rac(occupancy: &BTreeMap<u32, u32>) -> Result<Berth, BookingError> {
    topology::rac_berths()
        .find(|b| occupancy.get(&b.number).copied().unwrap_or(0) < RAC_BERTH_OCCUPANCY)
        .ok_or_else(|| {
            BookingError::InternalConsistency(String::from(
                "no RAC berth has a free place although RAC capacity remains",
            ))
        })
}

#[cfg(test)]
mod tests {
    use berth_core::{PassengerFields, PassengerId};
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn passenger(age: i64, gender: Gender, has_child: bool) -> Passenger {
        let details = PassengerFields::new("P", age, gender, has_child)
            .validate()
            .unwrap();
        Passenger::new(PassengerId(1), details)
    }

    fn lower_numbers() -> BTreeSet<u32> {
        topology::berths()
            .filter(|b| b.kind == BerthType::LowerBerth)
            .map(|b| b.number)
            .collect()
    }

    #[test]
    fn priority_predicate() {
        assert!(has_berth_priority(&passenger(60, Gender::Male, false)));
        assert!(has_berth_priority(&passenger(30, Gender::Female, true)));
        assert!(!has_berth_priority(&passenger(59, Gender::Male, true)));
        assert!(!has_berth_priority(&passenger(30, Gender::Female, false)));
    }

    #[test]
    fn deterministic_source_picks_lowest_candidate() {
        let mut rng = StepRng::new(0, 0);
        let senior = passenger(70, Gender::Male, false);
        let adult = passenger(30, Gender::Male, false);
        let none = BTreeSet::new();

        assert_eq!(allocate_confirmed(&none, &senior, &mut rng).unwrap().number, 1);
        assert_eq!(allocate_confirmed(&none, &adult, &mut rng).unwrap().number, 2);
    }

    #[test]
    fn priority_passenger_gets_lower_berth() {
        let mut rng = StdRng::seed_from_u64(7);
        let woman = passenger(28, Gender::Female, true);
        for _ in 0..50 {
            let berth = allocate_confirmed(&BTreeSet::new(), &woman, &mut rng).unwrap();
            assert_eq!(berth.kind, BerthType::LowerBerth);
        }
    }

    #[test]
    fn regular_passenger_avoids_lower_and_side_lower() {
        let mut rng = StdRng::seed_from_u64(11);
        let adult = passenger(35, Gender::Male, false);
        for _ in 0..50 {
            let berth = allocate_confirmed(&BTreeSet::new(), &adult, &mut rng).unwrap();
            assert!(!matches!(
                berth.kind,
                BerthType::LowerBerth | BerthType::SideLower
            ));
        }
    }

    #[test]
    fn regular_passenger_falls_back_to_lower() {
        let mut rng = StdRng::seed_from_u64(3);
        let adult = passenger(35, Gender::Male, false);
        let mut occupied: BTreeSet<u32> = topology::berths().map(|b| b.number).collect();
        occupied.remove(&12);
        let berth = allocate_confirmed(&occupied, &adult, &mut rng).unwrap();
        assert_eq!(berth.number, 12);
        assert_eq!(berth.kind, BerthType::LowerBerth);
    }

    #[test]
    fn priority_passenger_takes_other_when_lowers_are_gone() {
        let mut rng = StdRng::seed_from_u64(5);
        let senior = passenger(65, Gender::Female, false);
        let berth = allocate_confirmed(&lower_numbers(), &senior, &mut rng).unwrap();
        assert_ne!(berth.kind, BerthType::LowerBerth);
        assert_ne!(berth.kind, BerthType::SideLower);
    }

    #[test]
    fn full_coach_is_an_internal_error() {
        let mut rng = StepRng::new(0, 0);
        let occupied: BTreeSet<u32> = topology::berths()
            .filter(|b| b.kind != BerthType::SideLower)
            .map(|b| b.number)
            .collect();
        let err = allocate_confirmed(&occupied, &passenger(30, Gender::Male, false), &mut rng)
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn rac_fills_each_side_lower_twice_in_order() {
        let mut occupancy = BTreeMap::new();
        assert_eq!(allocate_rac(&occupancy).unwrap().number, 7);

        occupancy.insert(7, 1);
        assert_eq!(allocate_rac(&occupancy).unwrap().number, 7);

        occupancy.insert(7, 2);
        let berth = allocate_rac(&occupancy).unwrap();
        assert_eq!(berth.number, 15);
        assert_eq!(berth.kind, BerthType::SideLower);

        // A berth freed by a cancellation is reused before later ones
        occupancy.insert(15, 2);
        occupancy.insert(7, 1);
        assert_eq!(allocate_rac(&occupancy).unwrap().number, 7);
    }

    #[test]
    fn rac_full_is_an_internal_error() {
        let occupancy: BTreeMap<u32, u32> = topology::rac_berths()
            .map(|b| (b.number, RAC_BERTH_OCCUPANCY))
            .collect();
        assert!(allocate_rac(&occupancy).unwrap_err().is_fatal());
    }
}
