//! # Ledger Property Tests
//!
//! Random sequences of purchases, refunds and clock moves against a single
//! train, checked after every step against a simple model:
//!
//! - sold seats are unique and match the seat assignments;
//! - escrow equals payments taken minus fares refunded;
//! - every ticket still held by a buyer owns its seat;
//! - closing credits the treasury with exactly the remaining escrow.

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;
use railbook_core::{AccountId, Credits, ManualClock, StationName, Timestamp, MILLIS_PER_MINUTE};
use railbook_ledger::{BookingEngine, LedgerConfig, NewTrain, Ticket};

const CAPACITY: u32 = 6;
const PRICE: u64 = 100;
const T0: u64 = 1_767_225_600_000;

#[derive(Debug, Clone)]
enum Op {
    Buy { buyer: u8, seat: u32, extra: u64 },
    Refund { index: usize, by_holder: bool },
    Advance { minutes: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..4, 0u32..=CAPACITY + 1, prop_oneof![Just(0u64), 0u64..50])
            .prop_map(|(buyer, seat, extra)| Op::Buy { buyer, seat, extra }),
        3 => (any::<usize>(), any::<bool>())
            .prop_map(|(index, by_holder)| Op::Refund { index, by_holder }),
        1 => (1u64..30).prop_map(|minutes| Op::Advance { minutes }),
    ]
}

fn buyer(n: u8) -> AccountId {
    AccountId::new(format!("buyer-{n}")).unwrap()
}

proptest! {
    /// Seat exclusivity and escrow conservation hold after every step.
    #[test]
    fn invariants_hold_for_any_operation_sequence(ops in prop::collection::vec(op(), 1..60)) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(T0)));
        let (engine, admin) =
            BookingEngine::init_with_clock(LedgerConfig::default(), clock.clone()).unwrap();
        let train = engine
            .create_train(
                &admin,
                NewTrain {
                    origin: StationName::new("Riga").unwrap(),
                    destination: StationName::new("Tallinn").unwrap(),
                    seat_capacity: CAPACITY,
                    price: Credits::new(PRICE),
                    start_offset_minutes: 0,
                    end_offset_minutes: 240,
                },
            )
            .unwrap();

        let mut held: Vec<Ticket> = Vec::new();
        let mut expected_escrow: u64 = 0;

        for op in ops {
            match op {
                Op::Buy { buyer: n, seat, extra } => {
                    let payment = PRICE + extra;
                    let was_sold = engine.seats(train).unwrap().contains(&seat);
                    match engine.buy(train, buyer(n), Credits::new(payment), seat) {
                        Ok(ticket) => {
                            prop_assert!(!was_sold);
                            prop_assert!((1..=CAPACITY).contains(&seat));
                            expected_escrow += payment;
                            held.push(ticket);
                        }
                        Err(err) => {
                            prop_assert!(
                                was_sold
                                    || !(1..=CAPACITY).contains(&seat)
                                    || err.kind() == "sale_closed",
                                "unexpected rejection: {}",
                                err
                            );
                        }
                    }
                }
                Op::Refund { index, by_holder } => {
                    if held.is_empty() {
                        continue;
                    }
                    let ticket = held.swap_remove(index % held.len());
                    let caller = if by_holder {
                        ticket.holder().clone()
                    } else {
                        AccountId::new("stranger").unwrap()
                    };
                    match engine.refund(train, ticket, &caller) {
                        Ok(refunded) => {
                            prop_assert!(by_holder);
                            prop_assert_eq!(refunded, Credits::new(PRICE));
                            expected_escrow -= PRICE;
                        }
                        Err(rejected) => {
                            let (ticket, reason) = rejected.into_parts();
                            prop_assert!(
                                !by_holder || reason.kind() == "refund_window_closed",
                                "unexpected rejection: {}",
                                reason
                            );
                            held.push(ticket);
                        }
                    }
                }
                Op::Advance { minutes } => {
                    clock.advance(minutes * MILLIS_PER_MINUTE);
                }
            }

            let summary = engine.train_summary(train).unwrap();
            let unique: BTreeSet<u32> = summary.sold_seats.iter().copied().collect();
            prop_assert_eq!(unique.len(), summary.sold_seats.len());
            prop_assert_eq!(summary.sold_seats.len(), held.len());
            prop_assert_eq!(summary.escrow, Credits::new(expected_escrow));
            for ticket in &held {
                let assignment = engine.seat_holder(train, ticket.seat_no()).unwrap();
                prop_assert_eq!(assignment.map(|a| a.ticket_id), Some(ticket.id()));
            }
        }

        let end = engine.train_summary(train).unwrap().sale_window_end;
        clock.set(Timestamp::from_millis(end.as_millis() + 1));
        let settlement = engine.close_train(&admin, train).unwrap();
        prop_assert_eq!(settlement.swept, Credits::new(expected_escrow));
        prop_assert_eq!(engine.treasury(), Credits::new(expected_escrow));
        prop_assert_eq!(settlement.released_seats.len(), held.len());
    }

    /// A refund accepted before the cutoff always returns the fare, whatever
    /// was paid.
    #[test]
    fn refund_returns_exactly_the_fare(extra in 0u64..10_000, seat in 1u32..=CAPACITY) {
        let (engine, admin) = BookingEngine::with_defaults();
        let train = engine
            .create_train(
                &admin,
                NewTrain {
                    origin: StationName::new("Riga").unwrap(),
                    destination: StationName::new("Vilnius").unwrap(),
                    seat_capacity: CAPACITY,
                    price: Credits::new(PRICE),
                    start_offset_minutes: 0,
                    end_offset_minutes: 600,
                },
            )
            .unwrap();
        let holder = buyer(1);
        let ticket = engine
            .buy(train, holder.clone(), Credits::new(PRICE + extra), seat)
            .unwrap();
        prop_assert_eq!(engine.refund(train, ticket, &holder).unwrap(), Credits::new(PRICE));
        prop_assert_eq!(engine.train_summary(train).unwrap().escrow, Credits::new(extra));
    }
}
