//! Control-bus validation and subscription lifetime coverage.

use std::cell::RefCell;
use std::rc::Rc;

use instruction_codec as _;
use machine_core::{
    Architecture, Bus, BusPayload, ChannelKey, ErrorClass, MachineError, MEMORY_IO, READ, WRITE,
};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn counting(bus: &Bus, signal: Option<&str>) -> (Rc<RefCell<usize>>, machine_core::Subscription) {
    let hits = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&hits);
    let subscription = bus
        .subscribe(signal, move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        })
        .expect("valid signal");
    (hits, subscription)
}

#[test]
fn undefined_signal_fails_before_dispatch() {
    let bus = Bus::control(Architecture::X86);
    let (hits, _subscription) = counting(&bus, Some(READ));

    let error = bus
        .send(Some("HALT"), BusPayload::Level(true))
        .expect_err("HALT is not an x86 control signal");
    assert_eq!(
        error,
        MachineError::InvalidSignal {
            signal: "HALT".to_owned(),
            architecture: Architecture::X86
        }
    );
    assert_eq!(error.class(), ErrorClass::Protocol);
    assert_eq!(*hits.borrow(), 0);
    assert!(bus.subscribe(Some("HALT"), |_| Ok(())).is_err());
}

#[rstest]
#[case(READ)]
#[case(WRITE)]
#[case(MEMORY_IO)]
fn every_x86_signal_dispatches_only_to_its_own_listeners(#[case] signal: &str) {
    let bus = Bus::control(Architecture::X86);
    let listeners: Vec<_> = [READ, WRITE, MEMORY_IO]
        .into_iter()
        .map(|name| (name, counting(&bus, Some(name))))
        .collect();

    bus.send(Some(signal), BusPayload::Level(true)).expect("send");

    for (name, (hits, _subscription)) in &listeners {
        let expected = usize::from(*name == signal);
        assert_eq!(*hits.borrow(), expected, "listeners on {name}");
    }
}

#[test]
fn plain_buses_ignore_signal_names() {
    let bus = Bus::data();
    let (hits, subscription) = counting(&bus, Some("anything"));
    bus.send(None, BusPayload::Word(1)).expect("send");
    bus.send(Some("other"), BusPayload::Word(2)).expect("send");
    assert_eq!(*hits.borrow(), 2);
    assert_eq!(subscription.channel(), ChannelKey::Bus(machine_core::BusKind::Data));
}

#[test]
fn dropped_and_cancelled_subscriptions_stop_receiving() {
    let bus = Bus::address();
    let (dropped_hits, dropped) = counting(&bus, None);
    let (cancelled_hits, cancelled) = counting(&bus, None);
    let (detached_hits, detached) = counting(&bus, None);

    drop(dropped);
    cancelled.cancel();
    detached.detach();
    bus.send(None, BusPayload::Address(0x10)).expect("send");

    assert_eq!(*dropped_hits.borrow(), 0);
    assert_eq!(*cancelled_hits.borrow(), 0);
    assert_eq!(*detached_hits.borrow(), 1);
    assert_eq!(bus.listener_count(None), Ok(1));
}

#[test]
fn cloned_handles_share_listeners() {
    let bus = Bus::control(Architecture::X86);
    let handle = bus.clone();
    let (hits, _subscription) = counting(&bus, Some(WRITE));
    handle.send(Some(WRITE), BusPayload::Level(true)).expect("send");
    assert_eq!(*hits.borrow(), 1);
}

proptest! {
    #[test]
    fn unknown_names_never_dispatch(name in "[A-Z_]{1,12}") {
        prop_assume!(![READ, WRITE, MEMORY_IO].contains(&name.as_str()));
        let bus = Bus::control(Architecture::X86);
        let (hits, _subscription) = counting(&bus, Some(READ));
        let is_invalid_signal = matches!(
            bus.send(Some(&name), BusPayload::Level(true)),
            Err(MachineError::InvalidSignal { .. })
        );
        prop_assert!(is_invalid_signal);
        prop_assert_eq!(*hits.borrow(), 0);
    }
}
