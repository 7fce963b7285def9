//! Gate workflow: arrivals, departures and retriggered events

mod common;

use chrono::Duration;

use common::{at, Fixture};
use parkgate::domain::booking::{BookingRequest, NewBooking};
use parkgate::domain::{BookingStatus, DomainError, TransactionType};
use parkgate::EngineEvent;

#[tokio::test]
async fn entry_then_exit_charges_by_the_started_hour() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false), ("A2", false)]).await;
    let driver = fx.driver("CAB1234", 500).await;
    let mut events = fx.engine.events.subscribe();

    let entry = fx
        .engine
        .gate
        .enter_at(location.id, b"cab-1234", at(9, 0))
        .await
        .unwrap();
    assert_eq!(entry.plate, "CAB1234");
    assert_eq!(entry.vehicle.id, driver.vehicle.id);
    assert!(entry.owner.password_hash.is_none());
    assert!(!entry.reused_reservation);
    assert_eq!(entry.booking.spot_number.as_deref(), Some("A1"));
    assert!(fx.slot_occupied(location.id, "A1").await);

    let exit = fx
        .engine
        .gate
        .exit_at(location.id, b"CAB1234", at(10, 30))
        .await
        .unwrap();
    assert_eq!(exit.billed_hours, 2);
    assert_eq!(exit.amount, 200);
    assert_eq!(exit.booking.status, BookingStatus::Completed);
    assert_eq!(exit.booking.total_amount, Some(200));
    assert_eq!(exit.booking.end_time, Some(at(10, 30)));
    assert_eq!(exit.booking.updated_at, at(10, 30));
    assert_eq!(exit.transaction.kind, TransactionType::Deduct);
    assert_eq!(exit.transaction.description, "Parking payment for CAB1234");
    assert!(!fx.slot_occupied(location.id, "A1").await);
    assert_eq!(fx.engine.wallets.balance(driver.user.id).await.unwrap(), 300);

    let mut seen = Vec::new();
    while let Some(msg) = events.try_recv() {
        seen.push(msg.event.event_type());
    }
    assert!(seen.contains(&"booking_created"));
    assert!(seen.contains(&"booking_completed"));
    assert!(seen.contains(&"slot_released"));
    assert!(seen.contains(&"payment_settled"));
}

#[tokio::test]
async fn retriggered_entry_is_a_conflict() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false), ("A2", false)]).await;
    fx.driver("CAB1234", 300).await;

    fx.engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 0))
        .await
        .unwrap();
    let err = fx
        .engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 1))
        .await
        .unwrap_err();
    match err {
        DomainError::Conflict(msg) => assert_eq!(msg, "vehicle already has an active booking"),
        other => panic!("expected conflict, got {other:?}"),
    }
    // second slot untouched
    assert!(!fx.slot_occupied(location.id, "A2").await);
}

#[tokio::test]
async fn arrival_honours_reservation_slot() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false), ("A2", false)]).await;
    let driver = fx.driver("CAB1234", 300).await;

    let reserved = fx
        .engine
        .bookings
        .create_at(
            NewBooking {
                vehicle_id: driver.vehicle.id,
                user_id: driver.user.id,
                location_id: location.id,
                request: BookingRequest::PreBooked {
                    spot_number: "A2".into(),
                    start_time: at(9, 0),
                    end_time: Some(at(11, 0)),
                },
            },
            at(8, 0),
        )
        .await
        .unwrap();

    let entry = fx
        .engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 5))
        .await
        .unwrap();
    assert!(entry.reused_reservation);
    assert_eq!(entry.booking.id, reserved.id);
    assert_eq!(entry.booking.status, BookingStatus::Active);
    assert!(fx.slot_occupied(location.id, "A2").await);
    assert!(!fx.slot_occupied(location.id, "A1").await);

    let exit = fx
        .engine
        .gate
        .exit_at(location.id, b"CAB1234", at(10, 5))
        .await
        .unwrap();
    // billed from the reserved start
    assert_eq!(exit.billed_hours, 2);
    assert!(!fx.slot_occupied(location.id, "A2").await);
}

#[tokio::test]
async fn exit_before_reserved_arrival_keeps_occupied_slot() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false), ("A2", false)]).await;
    let reserver = fx.driver("ABC1111", 300).await;
    fx.driver("XYZ2222", 300).await;
    fx.driver("QQQ3333", 300).await;

    fx.engine
        .bookings
        .create_at(
            NewBooking {
                vehicle_id: reserver.vehicle.id,
                user_id: reserver.user.id,
                location_id: location.id,
                request: BookingRequest::PreBooked {
                    spot_number: "A1".into(),
                    start_time: at(15, 0),
                    end_time: Some(at(16, 0)),
                },
            },
            at(8, 0),
        )
        .await
        .unwrap();

    let parked = fx
        .engine
        .gate
        .enter_at(location.id, b"XYZ2222", at(9, 0))
        .await
        .unwrap();
    assert_eq!(parked.booking.spot_number.as_deref(), Some("A1"));

    // reserver never entered, so the exit closes the reservation only
    let exit = fx
        .engine
        .gate
        .exit_at(location.id, b"ABC1111", at(9, 30))
        .await
        .unwrap();
    assert_eq!(exit.booking.status, BookingStatus::Completed);
    assert!(fx.slot_occupied(location.id, "A1").await);

    let next = fx
        .engine
        .gate
        .enter_at(location.id, b"QQQ3333", at(9, 40))
        .await
        .unwrap();
    assert_eq!(next.booking.spot_number.as_deref(), Some("A2"));
}

#[tokio::test]
async fn reservation_elsewhere_blocks_entry() {
    let fx = Fixture::memory();
    let booked_at = fx.location(&[("B1", false)]).await;
    let gate_at = fx.location(&[("A1", false)]).await;
    let driver = fx.driver("CAB1234", 300).await;

    fx.engine
        .bookings
        .create_at(
            NewBooking {
                vehicle_id: driver.vehicle.id,
                user_id: driver.user.id,
                location_id: booked_at.id,
                request: BookingRequest::PreBooked {
                    spot_number: "B1".into(),
                    start_time: at(9, 0),
                    end_time: Some(at(11, 0)),
                },
            },
            at(8, 0),
        )
        .await
        .unwrap();

    let err = fx
        .engine
        .gate
        .enter_at(gate_at.id, b"CAB1234", at(9, 30))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn repeated_exit_finds_nothing_to_charge() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false)]).await;
    let driver = fx.driver("CAB1234", 300).await;

    fx.engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 0))
        .await
        .unwrap();
    fx.engine
        .gate
        .exit_at(location.id, b"CAB1234", at(9, 20))
        .await
        .unwrap();

    let err = fx
        .engine
        .gate
        .exit_at(location.id, b"CAB1234", at(9, 21))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Booking", .. }));

    let ledger = fx.engine.wallets.transactions(driver.user.id).await.unwrap();
    let deducts = ledger
        .iter()
        .filter(|t| t.kind == TransactionType::Deduct)
        .count();
    assert_eq!(deducts, 1);
    assert_eq!(fx.engine.wallets.balance(driver.user.id).await.unwrap(), 200);
}

#[tokio::test]
async fn simultaneous_exits_charge_once() {
    let fx = Fixture::sqlite().await;
    let location = fx.location(&[("A1", false)]).await;
    let driver = fx.driver("CAB1234", 300).await;

    fx.engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 0))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        fx.engine.gate.exit_at(location.id, b"CAB1234", at(9, 40)),
        fx.engine.gate.exit_at(location.id, b"CAB1234", at(9, 40)),
    );
    assert!(a.is_ok() || b.is_ok());

    let ledger = fx.engine.wallets.transactions(driver.user.id).await.unwrap();
    let deducts = ledger
        .iter()
        .filter(|t| t.kind == TransactionType::Deduct)
        .count();
    assert_eq!(deducts, 1);
    assert_eq!(fx.engine.wallets.balance(driver.user.id).await.unwrap(), 200);
    assert!(!fx.slot_occupied(location.id, "A1").await);
}

#[tokio::test]
async fn unknown_and_unreadable_plates() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false)]).await;

    let err = fx
        .engine
        .gate
        .enter_at(location.id, b"ZZZ9999", at(9, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Vehicle", .. }));

    let err = fx
        .engine
        .gate
        .enter_at(location.id, b"???", at(9, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = fx
        .engine
        .gate
        .enter_at(location.id, &[0xff, 0xfe], at(9, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Upstream(_)));
}

#[tokio::test]
async fn declined_exit_publishes_event() {
    let fx = Fixture::memory();
    let location = fx.location(&[("A1", false)]).await;
    let driver = fx.driver("CAB1234", 300).await;

    fx.engine
        .gate
        .enter_at(location.id, b"CAB1234", at(9, 0))
        .await
        .unwrap();
    fx.engine
        .wallets
        .deduct(driver.user.id, 300, "Adjustment")
        .await
        .unwrap();

    let mut events = fx.engine.events.subscribe();
    assert!(fx
        .engine
        .gate
        .exit_at(location.id, b"CAB1234", at(9, 0) + Duration::hours(3))
        .await
        .is_err());

    let declined = std::iter::from_fn(|| events.try_recv())
        .find_map(|msg| match msg.event {
            EngineEvent::PaymentDeclined(e) => Some(e),
            _ => None,
        })
        .expect("declined event");
    assert_eq!(declined.required, 300);
    assert_eq!(declined.available, 0);
    assert_eq!(declined.user_id, driver.user.id);
}
