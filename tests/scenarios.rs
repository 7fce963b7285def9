//! Acceptance scenarios, run against both storage backends

mod common;

use chrono::Duration;

use common::{at, Fixture};
use parkgate::domain::booking::{BookingRequest, NewBooking};
use parkgate::domain::{BookingKind, BookingStatus, DomainError};

/// One test per backend for each scenario
macro_rules! on_both_backends {
    ($($scenario:ident),* $(,)?) => {
        $(
            mod $scenario {
                use super::*;

                #[tokio::test]
                async fn memory() {
                    cases::$scenario(&Fixture::memory()).await;
                }

                #[tokio::test]
                async fn sqlite() {
                    cases::$scenario(&Fixture::sqlite().await).await;
                }
            }
        )*
    };
}

on_both_backends!(
    reserve_threshold_blocks_booking,
    on_site_takes_first_free_slot,
    overlapping_reservation_is_rejected,
    exit_without_funds_fails_closed,
    active_booking_cannot_be_cancelled,
    pending_booking_can_be_cancelled_once,
    pre_booked_times_are_validated,
    reservation_needs_a_known_slot,
    vehicle_must_belong_to_requester,
    open_ended_reservation_checks_current_holders,
    complete_on_site_requires_active_on_site,
);

mod cases {
    use super::*;

    fn on_site(d: &crate::common::Driver, location_id: uuid::Uuid) -> NewBooking {
        NewBooking {
            vehicle_id: d.vehicle.id,
            user_id: d.user.id,
            location_id,
            request: BookingRequest::OnSite { start_time: None },
        }
    }

    fn reserve(
        d: &crate::common::Driver,
        location_id: uuid::Uuid,
        spot: &str,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> NewBooking {
        NewBooking {
            vehicle_id: d.vehicle.id,
            user_id: d.user.id,
            location_id,
            request: BookingRequest::PreBooked {
                spot_number: spot.into(),
                start_time: start,
                end_time: Some(end),
            },
        }
    }

    fn reserve_open(
        d: &crate::common::Driver,
        location_id: uuid::Uuid,
        spot: &str,
        start: chrono::DateTime<chrono::Utc>,
    ) -> NewBooking {
        NewBooking {
            vehicle_id: d.vehicle.id,
            user_id: d.user.id,
            location_id,
            request: BookingRequest::PreBooked {
                spot_number: spot.into(),
                start_time: start,
                end_time: None,
            },
        }
    }

    pub async fn reserve_threshold_blocks_booking(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 250).await;

        let err = fx
            .engine
            .bookings
            .create(on_site(&driver, location.id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientFunds {
                required: 300,
                available: 250
            }
        ));
        assert!(!fx.slot_occupied(location.id, "A1").await);
    }

    pub async fn on_site_takes_first_free_slot(fx: &Fixture) {
        let location = fx.location(&[("A1", false), ("A2", true)]).await;
        let driver = fx.driver("CAB1234", 300).await;

        let booking = fx
            .engine
            .bookings
            .create(on_site(&driver, location.id))
            .await
            .unwrap();
        assert_eq!(booking.spot_number.as_deref(), Some("A1"));
        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.kind, BookingKind::OnSite);
        assert!(fx.slot_occupied(location.id, "A1").await);

        let err = fx
            .engine
            .bookings
            .create(on_site(&driver, location.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)), "got {err:?}");
    }

    pub async fn overlapping_reservation_is_rejected(fx: &Fixture) {
        let location = fx.location(&[("A1", false), ("A2", false)]).await;
        let first = fx.driver("CAB1111", 300).await;
        let second = fx.driver("CAB2222", 300).await;
        let third = fx.driver("CAB3333", 300).await;
        let now = at(8, 0);

        let booked = fx
            .engine
            .bookings
            .create_at(reserve(&first, location.id, "A2", at(10, 0), at(11, 0)), now)
            .await
            .unwrap();
        assert_eq!(booked.status, BookingStatus::Pending);

        let err = fx
            .engine
            .bookings
            .create_at(reserve(&second, location.id, "A2", at(10, 30), at(11, 30)), now)
            .await
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) => {
                assert_eq!(msg, "parking spot already booked for this time")
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let adjacent = fx
            .engine
            .bookings
            .create_at(reserve(&third, location.id, "A2", at(11, 0), at(12, 0)), now)
            .await
            .unwrap();
        assert_eq!(adjacent.spot_number.as_deref(), Some("A2"));
    }

    pub async fn exit_without_funds_fails_closed(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 300).await;

        let entry = fx
            .engine
            .gate
            .enter_at(location.id, b"CAB 1234", at(9, 0))
            .await
            .unwrap();
        fx.engine
            .wallets
            .deduct(driver.user.id, 250, "Adjustment")
            .await
            .unwrap();

        let err = fx
            .engine
            .gate
            .exit_at(location.id, b"CAB 1234", at(9, 0) + Duration::minutes(30))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InsufficientFunds {
                required: 100,
                available: 50
            }
        ));

        let booking = fx.engine.bookings.get(entry.booking.id).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.total_amount, None);
        assert!(fx.slot_occupied(location.id, "A1").await);
        assert_eq!(fx.engine.wallets.balance(driver.user.id).await.unwrap(), 50);
    }

    pub async fn active_booking_cannot_be_cancelled(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 300).await;
        let booking = fx
            .engine
            .bookings
            .create(on_site(&driver, location.id))
            .await
            .unwrap();

        let err = fx.engine.bookings.cancel(booking.id).await.unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert_eq!(msg, "booking is not pending"),
            other => panic!("expected conflict, got {other:?}"),
        }
        let stored = fx.engine.bookings.get(booking.id).await.unwrap();
        assert_eq!(stored.status, BookingStatus::Active);
    }

    pub async fn pending_booking_can_be_cancelled_once(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 300).await;
        let booking = fx
            .engine
            .bookings
            .create_at(reserve(&driver, location.id, "A1", at(10, 0), at(11, 0)), at(8, 0))
            .await
            .unwrap();

        let cancelled = fx.engine.bookings.cancel(booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(fx.engine.bookings.cancel(booking.id).await.is_err());

        // the freed window can be booked again
        let again = fx
            .engine
            .bookings
            .create_at(reserve(&driver, location.id, "A1", at(10, 0), at(11, 0)), at(8, 0))
            .await
            .unwrap();
        assert_eq!(again.status, BookingStatus::Pending);
    }

    pub async fn pre_booked_times_are_validated(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 300).await;
        let now = at(10, 0);

        let in_past = fx
            .engine
            .bookings
            .create_at(reserve(&driver, location.id, "A1", at(9, 0), at(11, 0)), now)
            .await
            .unwrap_err();
        assert!(matches!(in_past, DomainError::Validation(_)), "got {in_past:?}");

        for end in [at(12, 0), at(11, 0)] {
            let err = fx
                .engine
                .bookings
                .create_at(reserve(&driver, location.id, "A1", at(12, 0), end), now)
                .await
                .unwrap_err();
            match err {
                DomainError::Validation(msg) => {
                    assert_eq!(msg, "end time must be after start time")
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
        assert!(fx.engine.bookings.by_vehicle(driver.vehicle.id).await.unwrap().is_empty());
    }

    pub async fn reservation_needs_a_known_slot(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let driver = fx.driver("CAB1234", 300).await;

        let err = fx
            .engine
            .bookings
            .create_at(reserve(&driver, location.id, "Z9", at(10, 0), at(11, 0)), at(8, 0))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DomainError::NotFound { entity: "Slot", .. }),
            "got {err:?}"
        );
    }

    pub async fn vehicle_must_belong_to_requester(fx: &Fixture) {
        let location = fx.location(&[("A1", false)]).await;
        let owner = fx.driver("CAB1111", 300).await;
        let other = fx.driver("CAB2222", 300).await;

        let mut request = reserve(&other, location.id, "A1", at(10, 0), at(11, 0));
        request.vehicle_id = owner.vehicle.id;
        let err = fx.engine.bookings.create_at(request, at(8, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");

        let mut request = on_site(&other, location.id);
        request.vehicle_id = owner.vehicle.id;
        let err = fx.engine.bookings.create(request).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "got {err:?}");
        assert!(!fx.slot_occupied(location.id, "A1").await);
        assert!(fx.engine.bookings.by_vehicle(owner.vehicle.id).await.unwrap().is_empty());
    }

    pub async fn open_ended_reservation_checks_current_holders(fx: &Fixture) {
        let location = fx.location(&[("A1", false), ("A2", false)]).await;
        let parked = fx.driver("CAB1111", 300).await;
        let reserver = fx.driver("CAB2222", 300).await;

        let holder = fx
            .engine
            .bookings
            .create_at(on_site(&parked, location.id), at(9, 0))
            .await
            .unwrap();
        assert_eq!(holder.spot_number.as_deref(), Some("A1"));

        // A1 is held right now, so an open-ended reservation cannot take it
        let err = fx
            .engine
            .bookings
            .create_at(reserve_open(&reserver, location.id, "A1", at(9, 30)), at(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");

        let free = fx
            .engine
            .bookings
            .create_at(reserve_open(&reserver, location.id, "A2", at(9, 30)), at(9, 0))
            .await
            .unwrap();
        assert_eq!(free.status, BookingStatus::Pending);
        assert_eq!(free.end_time, None);
    }

    pub async fn complete_on_site_requires_active_on_site(fx: &Fixture) {
        let location = fx.location(&[("A1", false), ("A2", false)]).await;
        let driver = fx.driver("CAB1111", 300).await;
        let reserver = fx.driver("CAB2222", 300).await;

        let reserved = fx
            .engine
            .bookings
            .create_at(reserve(&reserver, location.id, "A2", at(10, 0), at(11, 0)), at(8, 0))
            .await
            .unwrap();
        let err = fx
            .engine
            .bookings
            .complete_on_site(reserved.id, at(11, 0), 100)
            .await
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert!(msg.ends_with("not on_site"), "{msg}"),
            other => panic!("expected conflict, got {other:?}"),
        }

        let parked = fx
            .engine
            .bookings
            .create_at(on_site(&driver, location.id), at(9, 0))
            .await
            .unwrap();
        let done = fx
            .engine
            .bookings
            .complete_on_site_at(parked.id, at(10, 15), 200, at(10, 16))
            .await
            .unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert_eq!(done.end_time, Some(at(10, 15)));
        assert_eq!(done.total_amount, Some(200));
        assert_eq!(done.updated_at, at(10, 16));

        let err = fx
            .engine
            .bookings
            .complete_on_site(parked.id, at(10, 20), 200)
            .await
            .unwrap_err();
        match err {
            DomainError::Conflict(msg) => assert!(msg.ends_with("is not active"), "{msg}"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
