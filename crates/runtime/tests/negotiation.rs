//! End-to-end request negotiation through a running runtime.

mod common;

use std::time::Duration;

use waystone_core::env::{EntityPolicy, Message};
use waystone_core::{CoreConfig, EntityId, Position, RequestDirection, RequestError};
use waystone_runtime::{RequestOutcome, Runtime};

use common::FakeWorld;

const ALICE: EntityId = EntityId(1);
const BOB: EntityId = EntityId(2);
const CAROL: EntityId = EntityId(3);

/// Resolution happens without a countdown so accept effects are immediate.
fn instant_config() -> CoreConfig {
    CoreConfig {
        teleport_delay_secs: 0,
        ..CoreConfig::new()
    }
}

fn start(world: &FakeWorld, core: CoreConfig) -> Runtime {
    Runtime::builder()
        .core_config(core)
        .collaborators(world.collaborator_set())
        .build()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn accept_moves_sender_to_target() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(10.0, 64.0, -3.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    let outcome = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, RequestOutcome::Sent);
    assert!(world.messages_for(BOB).contains(&Message::RequestReceived {
        sender: ALICE,
        direction: RequestDirection::ToTarget,
    }));
    assert!(world
        .messages_for(ALICE)
        .contains(&Message::RequestSent { target: BOB }));

    handle.accept(BOB).await.unwrap().unwrap();

    assert_eq!(world.position_of(ALICE), Some(Position::new(10.0, 64.0, -3.0)));
    assert_eq!(world.relocations(), vec![(ALICE, Position::new(10.0, 64.0, -3.0))]);
    let accepted = |entity| {
        world
            .messages_for(entity)
            .iter()
            .filter(|m| matches!(m, Message::RequestAccepted { .. }))
            .count()
    };
    assert_eq!(accepted(ALICE), 1);
    assert_eq!(accepted(BOB), 1);
}

#[tokio::test(start_paused = true)]
async fn bring_to_me_moves_target_to_sender() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::new(-5.0, 70.0, 5.0));
    world.join(BOB, Position::ORIGIN);
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToSender)
        .await
        .unwrap()
        .unwrap();
    handle.accept(BOB).await.unwrap().unwrap();

    assert_eq!(world.position_of(BOB), Some(Position::new(-5.0, 70.0, 5.0)));
    assert_eq!(world.position_of(ALICE), Some(Position::new(-5.0, 70.0, 5.0)));
}

#[tokio::test(start_paused = true)]
async fn second_request_rejected_while_first_pending() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    world.join(CAROL, Position::new(2.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    let second = handle
        .send_request(ALICE, CAROL, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(second, Err(RequestError::AlreadyPending));

    // The original request is untouched by the rejected one.
    handle.accept(BOB).await.unwrap().unwrap();
    assert_eq!(world.position_of(ALICE), Some(Position::new(1.0, 0.0, 0.0)));
}

#[tokio::test(start_paused = true)]
async fn self_target_rejected() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    let runtime = start(&world, instant_config());

    let result = runtime
        .handle()
        .send_request(ALICE, ALICE, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(result, Err(RequestError::SelfTarget));
}

#[tokio::test(start_paused = true)]
async fn unreachable_target_rejected() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    let runtime = start(&world, instant_config());

    let result = runtime
        .handle()
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(result, Err(RequestError::TargetUnreachable { target: BOB }));
}

#[tokio::test(start_paused = true)]
async fn disabled_target_rejected_before_cooldown_starts() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    world.set_policy(
        BOB,
        EntityPolicy {
            requests_enabled: false,
            ..EntityPolicy::default()
        },
    );
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    let result = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(result, Err(RequestError::RequestsDisabled));

    // Rejection leaves no cooldown behind.
    world.set_policy(BOB, EntityPolicy::default());
    let retry = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(retry, Ok(RequestOutcome::Sent));
}

#[tokio::test(start_paused = true)]
async fn cooldown_gates_resend_until_bypassed() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    handle.deny(BOB).await.unwrap().unwrap();

    let retry = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap();
    match retry {
        Err(RequestError::OnCooldown { remaining }) => assert!(remaining > Duration::ZERO),
        other => panic!("expected cooldown rejection, got {other:?}"),
    }

    world.set_policy(
        ALICE,
        EntityPolicy {
            bypass_cooldown: true,
            ..EntityPolicy::default()
        },
    );
    let bypassed = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap();
    assert_eq!(bypassed, Ok(RequestOutcome::Sent));
}

#[tokio::test(start_paused = true)]
async fn auto_accept_resolves_without_pending_state() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(4.0, 0.0, 4.0));
    world.set_policy(
        BOB,
        EntityPolicy {
            auto_accept: true,
            ..EntityPolicy::default()
        },
    );
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    let outcome = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome, RequestOutcome::AutoAccepted);
    assert_eq!(world.position_of(ALICE), Some(Position::new(4.0, 0.0, 4.0)));

    // Nothing was left pending for the target to act on.
    let accept = handle.accept(BOB).await.unwrap();
    assert_eq!(accept, Err(RequestError::NoPendingRequest));
}

#[tokio::test(start_paused = true)]
async fn relationship_auto_accept_only_covers_related_senders() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(4.0, 0.0, 4.0));
    world.join(CAROL, Position::new(8.0, 0.0, 8.0));
    world.set_policy(
        BOB,
        EntityPolicy {
            relationship_auto_accept: true,
            ..EntityPolicy::default()
        },
    );
    world.relate(ALICE, BOB);
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    let related = handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(related, RequestOutcome::AutoAccepted);

    let unrelated = handle
        .send_request(CAROL, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unrelated, RequestOutcome::Sent);
}

#[tokio::test(start_paused = true)]
async fn unanswered_request_expires() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, CoreConfig::new());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_secs(61)).await;

    let accept = handle.accept(BOB).await.unwrap();
    assert_eq!(accept, Err(RequestError::NoPendingRequest));
    assert!(world
        .messages_for(ALICE)
        .contains(&Message::RequestExpired { target: BOB }));
    assert!(world.relocations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn deny_notifies_both_and_drops_request() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    handle.deny(BOB).await.unwrap().unwrap();

    assert!(world
        .messages_for(ALICE)
        .contains(&Message::RequestDenied { other: BOB }));
    assert!(world
        .messages_for(BOB)
        .contains(&Message::RequestDenied { other: ALICE }));
    assert!(world.relocations().is_empty());
    assert_eq!(
        handle.accept(BOB).await.unwrap(),
        Err(RequestError::NoPendingRequest)
    );
}

#[tokio::test(start_paused = true)]
async fn disconnect_drops_requests_addressed_to_the_leaver() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    handle.disconnect(BOB).await.unwrap();
    world.leave(BOB);

    assert_eq!(
        handle.accept(BOB).await.unwrap(),
        Err(RequestError::NoPendingRequest)
    );

    // The removed request's expiry timer is dead: long after the expiry
    // window the sender still hears nothing.
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!world
        .messages_for(ALICE)
        .contains(&Message::RequestExpired { target: BOB }));
}

#[tokio::test(start_paused = true)]
async fn disconnect_drops_the_leavers_outgoing_request() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    handle.disconnect(ALICE).await.unwrap();
    world.leave(ALICE);

    assert_eq!(
        handle.accept(BOB).await.unwrap(),
        Err(RequestError::NoPendingRequest)
    );
}

#[tokio::test(start_paused = true)]
async fn accepting_for_a_vanished_sender_degrades_to_notification() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    world.join(BOB, Position::new(1.0, 0.0, 0.0));
    let runtime = start(&world, instant_config());
    let handle = runtime.handle();

    handle
        .send_request(ALICE, BOB, RequestDirection::ToTarget)
        .await
        .unwrap()
        .unwrap();
    world.leave(ALICE);

    handle.accept(BOB).await.unwrap().unwrap();
    assert!(world
        .messages_for(BOB)
        .contains(&Message::ParticipantUnavailable));
    assert!(world.relocations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn directory_resolves_display_names() {
    let world = FakeWorld::new();
    world.join(ALICE, Position::ORIGIN);
    let collaborators = world.collaborator_set();

    assert_eq!(collaborators.directory().find("e1"), Some(ALICE));
    assert_eq!(collaborators.directory().find("nobody"), None);
}
