use super::common::*;
use std::sync::Arc;
use std::thread;

use crate::listings::domain::{Occupancy, UserId};
use crate::listings::principal::Principal;
use crate::listings::rental::{ConflictReason, ForbiddenReason, RentalError, RentalStateManager};
use crate::listings::repository::RepositoryError;
use crate::listings::HouseId;

#[test]
fn rent_then_leave_walks_the_occupancy_cycle() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();

    let rented = rentals
        .rent(&house_id, &Principal::user("user-42"))
        .expect("vacant house can be rented");
    assert_eq!(rented.occupancy, Occupancy::rented_by(UserId::new("user-42")));

    match rentals.rent(&house_id, &Principal::user("user-99")) {
        Err(RentalError::Conflict(ConflictReason::AlreadyRented)) => {}
        other => panic!("expected already rented conflict, got {other:?}"),
    }

    match rentals.leave(&house_id, &Principal::user("user-99")) {
        Err(RentalError::Forbidden(ForbiddenReason::NotYourRental)) => {}
        other => panic!("expected not your rental, got {other:?}"),
    }

    let vacated = rentals
        .leave(&house_id, &Principal::user("user-42"))
        .expect("renter can leave");
    assert_eq!(vacated.occupancy, Occupancy::Vacant);
    assert_eq!(fixture.houses.stored(&house_id).occupancy, Occupancy::Vacant);
}

#[test]
fn second_rent_by_same_user_conflicts() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();
    let renter = Principal::user("user-42");

    rentals.rent(&house_id, &renter).expect("first rent succeeds");
    assert_eq!(
        rentals.rent(&house_id, &renter),
        Err(RentalError::Conflict(ConflictReason::AlreadyRented))
    );
}

#[test]
fn unknown_house_is_not_found() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let missing = HouseId::generate();

    assert_eq!(
        rentals.rent(&missing, &Principal::user("user-42")),
        Err(RentalError::NotFound)
    );
    assert_eq!(
        rentals.leave(&missing, &Principal::user("user-42")),
        Err(RentalError::NotFound)
    );
}

#[test]
fn not_found_is_reported_before_role_checks() {
    let fixture = fixture();
    let rentals = fixture.rentals();

    assert_eq!(
        rentals.rent(&HouseId::generate(), &Principal::user(AGENT_USER)),
        Err(RentalError::NotFound)
    );
}

#[test]
fn agents_cannot_rent_regardless_of_state() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let vacant = fixture.vacant_house();
    let rented = fixture.rented_house("user-42");

    for house_id in [vacant, rented] {
        assert_eq!(
            rentals.rent(&house_id, &Principal::user(OTHER_AGENT_USER)),
            Err(RentalError::Forbidden(ForbiddenReason::AgentsCannotRent))
        );
    }
    assert_eq!(fixture.houses.stored(&vacant).occupancy, Occupancy::Vacant);
}

#[test]
fn agents_cannot_leave() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.rented_house("user-42");

    assert_eq!(
        rentals.leave(&house_id, &Principal::user(AGENT_USER)),
        Err(RentalError::Forbidden(ForbiddenReason::AgentsCannotLeave))
    );
}

#[test]
fn leaving_a_vacant_house_conflicts_for_everyone() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();

    for principal in [
        Principal::user("user-42"),
        Principal::admin("site-admin"),
        Principal::admin(ADMIN_AGENT_USER),
    ] {
        assert_eq!(
            rentals.leave(&house_id, &principal),
            Err(RentalError::Conflict(ConflictReason::NotRented))
        );
    }
}

#[test]
fn admin_leaves_on_behalf_of_current_renter() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.rented_house("user-42");

    let vacated = rentals
        .leave(&house_id, &Principal::admin(ADMIN_AGENT_USER))
        .expect("admin may end any tenancy");
    assert_eq!(vacated.occupancy, Occupancy::Vacant);
}

#[test]
fn admin_holding_agent_registration_may_rent() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();

    let rented = rentals
        .rent(&house_id, &Principal::admin(ADMIN_AGENT_USER))
        .expect("admin override applies");
    assert_eq!(
        rented.occupancy.renter(),
        Some(&UserId::new(ADMIN_AGENT_USER))
    );
}

#[test]
fn deleted_houses_are_not_found() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let mut house = house_for(fixture.agent_id);
    house.is_active = false;
    let house_id = fixture.houses.seed(house);

    assert_eq!(
        rentals.rent(&house_id, &Principal::user("user-42")),
        Err(RentalError::NotFound)
    );
}

#[test]
fn concurrent_rents_on_one_house_admit_a_single_winner() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();

    let handles: Vec<_> = (0..16)
        .map(|index| {
            let rentals = rentals.clone();
            thread::spawn(move || rentals.rent(&house_id, &Principal::user(format!("user-{index}"))))
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes"))
        .collect();

    let winners: Vec<_> = outcomes.iter().filter_map(|outcome| outcome.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(outcomes.iter().all(|outcome| matches!(
        outcome,
        Ok(_) | Err(RentalError::Conflict(ConflictReason::AlreadyRented))
    )));

    let stored = fixture.houses.stored(&house_id);
    assert_eq!(stored.occupancy, winners[0].occupancy);
}

#[test]
fn rent_detects_a_lost_race_at_write_time() {
    let fixture = fixture();
    let house_id = fixture.vacant_house();
    let racing = Arc::new(RacingHouses {
        inner: (*fixture.houses).clone(),
        interleaved: Occupancy::rented_by(UserId::new("user-7")),
    });
    let rentals = RentalStateManager::new(racing, fixture.agents.clone());

    assert_eq!(
        rentals.rent(&house_id, &Principal::user("user-42")),
        Err(RentalError::Conflict(ConflictReason::AlreadyRented))
    );
    assert_eq!(
        fixture.houses.stored(&house_id).occupancy.renter(),
        Some(&UserId::new("user-7"))
    );
}

#[test]
fn leave_reclassifies_a_changed_tenancy() {
    let fixture = fixture();
    let house_id = fixture.rented_house("user-42");

    let vacated_meanwhile = RentalStateManager::new(
        Arc::new(RacingHouses {
            inner: (*fixture.houses).clone(),
            interleaved: Occupancy::Vacant,
        }),
        fixture.agents.clone(),
    );
    assert_eq!(
        vacated_meanwhile.leave(&house_id, &Principal::user("user-42")),
        Err(RentalError::Conflict(ConflictReason::NotRented))
    );

    let reassigned = RentalStateManager::new(
        Arc::new(RacingHouses {
            inner: (*fixture.houses).clone(),
            interleaved: Occupancy::rented_by(UserId::new("user-7")),
        }),
        fixture.agents.clone(),
    );
    let second_house = fixture.rented_house("user-42");
    assert_eq!(
        reassigned.leave(&second_house, &Principal::user("user-42")),
        Err(RentalError::Forbidden(ForbiddenReason::NotYourRental))
    );

    let third_house = fixture.rented_house("user-42");
    assert_eq!(
        reassigned.leave(&third_house, &Principal::admin("site-admin")),
        Err(RentalError::Conflict(ConflictReason::ConcurrentModification))
    );
}

#[test]
fn authorize_mutation_requires_owning_agent_or_admin() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.vacant_house();

    assert_eq!(
        rentals.authorize_mutation(&house_id, &Principal::user(AGENT_USER)),
        Ok(fixture.agent_id)
    );
    assert_eq!(
        rentals.authorize_mutation(&house_id, &Principal::user(OTHER_AGENT_USER)),
        Err(RentalError::Forbidden(ForbiddenReason::NotOwningAgent))
    );
    assert_eq!(
        rentals.authorize_mutation(&house_id, &Principal::admin(ADMIN_AGENT_USER)),
        Ok(fixture.admin_agent_id)
    );
    assert_eq!(
        rentals.authorize_mutation(&house_id, &Principal::user("user-42")),
        Err(RentalError::Forbidden(
            ForbiddenReason::AgentRegistrationRequired
        ))
    );
    assert_eq!(
        rentals.authorize_mutation(&house_id, &Principal::admin("site-admin")),
        Err(RentalError::Forbidden(
            ForbiddenReason::AgentRegistrationRequired
        ))
    );
    assert_eq!(
        rentals.authorize_mutation(&HouseId::generate(), &Principal::user(AGENT_USER)),
        Err(RentalError::NotFound)
    );
}

#[test]
fn authorize_mutation_never_changes_the_house() {
    let fixture = fixture();
    let rentals = fixture.rentals();
    let house_id = fixture.rented_house("user-42");
    let before = fixture.houses.stored(&house_id);

    rentals
        .authorize_mutation(&house_id, &Principal::user(AGENT_USER))
        .expect("owner authorized");
    assert_eq!(fixture.houses.stored(&house_id), before);
}

#[test]
fn persistence_failures_surface_as_a_distinct_error() {
    let fixture = fixture();
    let rentals = RentalStateManager::new(Arc::new(UnavailableHouses), fixture.agents.clone());

    assert_eq!(
        rentals.rent(&HouseId::generate(), &Principal::user("user-42")),
        Err(RentalError::Persistence(RepositoryError::Unavailable(
            "database offline".to_string()
        )))
    );
}
