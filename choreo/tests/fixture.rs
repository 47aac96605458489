mod common;

use chrono::Duration;
use choreo::{
    matchers, ConfigBuilder, CreationPolicy, Error, LogicalTime, Message, PayloadType,
    SagaContext, SagaHandler, SagaRule, SagaTestFixture,
};
use common::*;
use serde_json::{json, Value};
use tracing_test::traced_test;

fn fixture() -> SagaTestFixture {
    SagaTestFixture::new(order_saga())
}

#[test]
#[traced_test]
fn order_placed_starts_saga() {
    let mut fixture = fixture();

    fixture
        .given_no_prior_activity()
        .when_publishing(message(&OrderPlaced { order_id: 42 }))
        .unwrap()
        .expect_active_sagas(1)
        .unwrap()
        .expect_association_with("order_id", 42)
        .unwrap()
        .expect_dispatched_commands_equal_to(&[message(&ReserveStock { order_id: 42 })])
        .unwrap()
        .expect_scheduled_event(payment_window(), &PaymentDeadlinePassed { order_id: 42 })
        .unwrap()
        .expect_scheduled_event_of_type::<PaymentDeadlinePassed>(payment_window())
        .unwrap()
        .expect_published_events(&[])
        .unwrap();

    assert!(logs_contain("order-saga when order-placed"));
    assert!(logs_contain("started by order-placed"));
}

#[test]
#[traced_test]
fn deadline_fires_once_due() {
    let mut fixture = fixture();
    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap();

    let result = fixture.when_time_elapses(Duration::minutes(15)).unwrap();

    assert!(result.expect_no_scheduled_events().unwrap_err().is_assertion());
    result
        .expect_scheduled_event_matching_at(
            LogicalTime::since_epoch(payment_window()),
            &matchers::payload_of_type::<PaymentDeadlinePassed>(),
        )
        .unwrap()
        .expect_scheduled_event(Duration::minutes(15), &PaymentDeadlinePassed { order_id: 42 })
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap()
        .expect_active_sagas(1)
        .unwrap();

    fixture
        .when_time_elapses(Duration::minutes(15))
        .unwrap()
        .expect_dispatched_commands_equal_to(&[message(&CancelOrder { order_id: 42 })])
        .unwrap()
        .expect_no_scheduled_events()
        .unwrap()
        .expect_active_sagas(0)
        .unwrap();

    assert!(fixture.scheduler().all_pending().is_empty());
    assert_eq!(
        fixture.current_time(),
        LogicalTime::since_epoch(payment_window())
    );
}

#[test]
#[traced_test]
fn payment_cancels_deadline() {
    let mut fixture = fixture();

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap()
        .when_publishing(message(&PaymentReceived { order_id: 42 }))
        .unwrap()
        .expect_dispatched_commands_equal_to(&[message(&ShipOrder {
            order_id: 42,
            warehouse: "default".to_owned(),
        })])
        .unwrap()
        .expect_published_events(&[message(&OrderCompleted { order_id: 42 })])
        .unwrap()
        .expect_no_scheduled_events()
        .unwrap()
        .expect_active_sagas(0)
        .unwrap()
        .expect_no_association_with("order_id", 42)
        .unwrap();
}

#[test]
fn resources_reach_handlers() {
    let mut fixture = fixture().data(Warehouse("north".to_owned()));

    fixture
        .given_published([message(&OrderPlaced { order_id: 7 })])
        .unwrap()
        .when_publishing(message(&PaymentReceived { order_id: 7 }))
        .unwrap()
        .expect_dispatched_commands_matching(&matchers::exact_sequence_of(vec![
            matchers::payload_equal_to(&ShipOrder {
                order_id: 7,
                warehouse: "north".to_owned(),
            })
            .unwrap(),
        ]))
        .unwrap();
}

#[test]
#[traced_test]
fn association_removed() {
    let mut fixture = fixture();
    let linked = CustomerLinked {
        order_id: 42,
        customer_id: "c-7".to_owned(),
    };

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 }), message(&linked)])
        .unwrap();

    fixture
        .result()
        .expect_association_with("customer_id", "c-7")
        .unwrap();

    let result = fixture
        .when_publishing(message(&CustomerUnlinked {
            order_id: 42,
            customer_id: "c-7".to_owned(),
        }))
        .unwrap();

    result
        .expect_no_association_with("customer_id", "c-7")
        .unwrap()
        .expect_association_with("order_id", 42)
        .unwrap();

    let err = result
        .expect_association_with("customer_id", "c-7")
        .unwrap_err();
    assert!(err.to_string().contains("key:<customer_id> value:<c-7>"));
}

#[test]
fn events_without_association_are_skipped() {
    let mut fixture = fixture();

    fixture
        .when_publishing(Message::new(OrderPlaced::payload_type()))
        .unwrap()
        .expect_active_sagas(0)
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap();
}

#[test]
fn events_without_saga_are_ignored() {
    let mut fixture = fixture();

    fixture
        .when_publishing(message(&PaymentReceived { order_id: 1 }))
        .unwrap()
        .expect_active_sagas(0)
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap()
        .expect_published_events_matching(&matchers::no_events())
        .unwrap();
}

#[test]
fn if_none_found_reuses_saga() {
    let mut fixture = fixture();

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap()
        .when_publishing(message(&OrderPlaced { order_id: 42 }))
        .unwrap()
        .expect_active_sagas(1)
        .unwrap()
        .expect_dispatched_commands_equal_to(&[message(&ReserveStock { order_id: 42 })])
        .unwrap();

    assert_eq!(fixture.scheduler().len(), 2);
}

#[test]
fn ended_saga_receives_nothing() {
    let mut fixture = fixture();

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap()
        .and_then_time_elapses(payment_window())
        .unwrap()
        .when_publishing(message(&PaymentReceived { order_id: 42 }))
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap()
        .expect_published_events(&[])
        .unwrap()
        .expect_active_sagas(0)
        .unwrap();
}

#[test]
fn configured_start_time() {
    let start = LogicalTime::from_secs(3600);
    let config = ConfigBuilder::new().start_time(start).build();
    let mut fixture = SagaTestFixture::with_config(order_saga(), config);

    assert_eq!(fixture.current_time(), start);

    let deadline = start.checked_add(payment_window()).unwrap();

    fixture
        .when_publishing(message(&OrderPlaced { order_id: 3 }))
        .unwrap()
        .expect_scheduled_event_of_type_at::<PaymentDeadlinePassed>(deadline)
        .unwrap()
        .expect_scheduled_event_at(deadline, &PaymentDeadlinePassed { order_id: 3 })
        .unwrap();

    let err = fixture
        .when_time_advances_to(LogicalTime::EPOCH)
        .err()
        .unwrap();
    assert!(matches!(err, Error::InvalidTime { .. }));
}

#[test]
fn zero_elapse_leaves_future_events_pending() {
    let mut fixture = fixture();

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap()
        .when_time_elapses(Duration::zero())
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap()
        .expect_scheduled_event_of_type::<PaymentDeadlinePassed>(payment_window())
        .unwrap();
}

#[derive(Clone)]
struct Rejecting;

impl choreo::CallbackBehavior for Rejecting {
    fn handle(&self, command: &Message) -> anyhow::Result<Value> {
        if command.is::<CancelOrder>() {
            anyhow::bail!("order already shipped");
        }

        Ok(json!({ "accepted": true }))
    }
}

#[test]
fn callback_behavior_failure() {
    let mut fixture = fixture().callback_behavior(Rejecting);

    fixture
        .given_published([message(&OrderPlaced { order_id: 42 })])
        .unwrap();

    let err = fixture
        .when_time_elapses(payment_window())
        .err()
        .unwrap();

    assert!(matches!(err, Error::Handler(_)));
    assert!(err.to_string().contains("order already shipped"));
    assert_eq!(fixture.commands().messages().len(), 1);
}

/// Forwards the `id` property of the handled event under a new name.
#[derive(Clone)]
enum Forward {
    Publish(&'static str),
    Send(&'static str),
    ScheduleNow(&'static str),
}

impl SagaHandler for Forward {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data = json!({ "id": event.property("id") });

        match self {
            Forward::Publish(name) => ctx.publish(Message::new(*name).data(data)?),
            Forward::Send(name) => {
                ctx.send(Message::new(*name).data(data)?)?;
            }
            Forward::ScheduleNow(name) => {
                ctx.schedule_after(Duration::zero(), Message::new(*name).data(data)?)?;
            }
        }

        Ok(())
    }
}

fn ping_rule() -> SagaRule {
    SagaRule::new("ping-saga")
        .start("ping", "id", CreationPolicy::IfNoneFound, Forward::Publish("pong"))
        .handler("pong", "id", Forward::Send("ack"))
}

fn ping(id: u32) -> Message {
    Message::new("ping").data(json!({ "id": id })).unwrap()
}

#[test]
fn published_events_not_redelivered_by_default() {
    let mut fixture = SagaTestFixture::new(ping_rule());

    fixture
        .when_publishing(ping(1))
        .unwrap()
        .expect_published_events_matching(&matchers::exact_sequence_of(vec![
            matchers::named("pong"),
        ]))
        .unwrap()
        .expect_no_dispatched_commands()
        .unwrap();
}

#[test]
fn published_events_redelivered() {
    let config = ConfigBuilder::new().redeliver_published_events(true).build();
    let mut fixture = SagaTestFixture::with_config(ping_rule(), config);

    fixture
        .when_publishing(ping(1))
        .unwrap()
        .expect_dispatched_commands_matching(&matchers::list_with_all_of(vec![
            matchers::named("ack"),
        ]))
        .unwrap();
}

#[test]
fn cascade_limit() {
    let rule = SagaRule::new("echo-saga").start(
        "ping",
        "id",
        CreationPolicy::IfNoneFound,
        Forward::Publish("ping"),
    );
    let config = ConfigBuilder::new()
        .redeliver_published_events(true)
        .max_cascade(10)
        .build();
    let mut fixture = SagaTestFixture::with_config(rule, config);

    let err = fixture.when_publishing(ping(1)).err().unwrap();

    assert!(matches!(err, Error::CascadeLimit(10)));
    assert_eq!(fixture.events().messages().len(), 10);
}

#[test]
fn always_starts_new_saga() {
    let rule = SagaRule::new("audit-saga").start(
        "ping",
        "id",
        CreationPolicy::Always,
        Forward::Send("audit"),
    );
    let mut fixture = SagaTestFixture::new(rule);

    fixture.given_published([ping(1)]).unwrap();

    fixture
        .when_publishing(ping(1))
        .unwrap()
        .expect_active_sagas(2)
        .unwrap()
        .expect_dispatched_commands_equal_to(&[
            Message::new("audit").data(json!({ "id": "1" })).unwrap(),
            Message::new("audit").data(json!({ "id": "1" })).unwrap(),
        ])
        .unwrap();
}

#[test]
#[traced_test]
fn zero_elapse_delivers_events_due_now() {
    let rule = SagaRule::new("reminder-saga")
        .start(
            "ping",
            "id",
            CreationPolicy::IfNoneFound,
            Forward::ScheduleNow("remind"),
        )
        .handler("remind", "id", Forward::Send("ack"));
    let mut fixture = SagaTestFixture::new(rule);

    fixture.given_published([ping(1)]).unwrap();

    fixture
        .result()
        .expect_scheduled_event_matching_at(LogicalTime::EPOCH, &matchers::named("remind"))
        .unwrap();

    fixture
        .when_time_elapses(Duration::zero())
        .unwrap()
        .expect_dispatched_commands_equal_to(&[Message::new("ack")
            .data(json!({ "id": "1" }))
            .unwrap()])
        .unwrap()
        .expect_no_scheduled_events()
        .unwrap();

    assert_eq!(fixture.current_time(), LogicalTime::EPOCH);
}
