#![allow(dead_code)]

use chrono::Duration;
use choreo::{
    CreationPolicy, Message, Payload, PayloadType, Saga, SagaContext, SagaHandler, SagaInfo,
    SagaRule, ScheduleToken,
};
use serde::{Deserialize, Serialize};

#[derive(Payload, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: u32,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct PaymentReceived {
    pub order_id: u32,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct PaymentDeadlinePassed {
    pub order_id: u32,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct CustomerLinked {
    pub order_id: u32,
    pub customer_id: String,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct CustomerUnlinked {
    pub order_id: u32,
    pub customer_id: String,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub order_id: u32,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct ReserveStock {
    pub order_id: u32,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct ShipOrder {
    pub order_id: u32,
    pub warehouse: String,
}

#[derive(Payload, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: u32,
}

#[derive(Saga)]
pub struct OrderSaga;

#[derive(Default, Serialize, Deserialize)]
pub struct OrderState {
    pub deadline: Option<ScheduleToken>,
}

/// Warehouse orders ship from, injected as a fixture resource.
pub struct Warehouse(pub String);

pub fn payment_window() -> Duration {
    Duration::minutes(30)
}

pub fn message<P: PayloadType + Serialize>(payload: &P) -> Message {
    Message::from_payload(payload).unwrap()
}

#[derive(Clone)]
struct OnOrderPlaced;

impl SagaHandler for OnOrderPlaced {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data: OrderPlaced = event.to_data()?;

        ctx.send(Message::from_payload(&ReserveStock {
            order_id: data.order_id,
        })?)?;

        let deadline = ctx.schedule_after(
            payment_window(),
            Message::from_payload(&PaymentDeadlinePassed {
                order_id: data.order_id,
            })?,
        )?;

        ctx.save_state(&OrderState {
            deadline: Some(deadline),
        })?;

        Ok(())
    }
}

#[derive(Clone)]
struct OnPaymentReceived;

impl SagaHandler for OnPaymentReceived {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data: PaymentReceived = event.to_data()?;
        let state: OrderState = ctx.state()?;

        if let Some(deadline) = state.deadline {
            ctx.cancel(deadline);
        }

        let warehouse = ctx
            .get::<Warehouse>()
            .map(|warehouse| warehouse.0.to_owned())
            .unwrap_or_else(|| "default".to_owned());

        ctx.send(Message::from_payload(&ShipOrder {
            order_id: data.order_id,
            warehouse,
        })?)?;
        ctx.publish(Message::from_payload(&OrderCompleted {
            order_id: data.order_id,
        })?);
        ctx.end()?;

        Ok(())
    }
}

#[derive(Clone)]
struct OnPaymentDeadlinePassed;

impl SagaHandler for OnPaymentDeadlinePassed {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data: PaymentDeadlinePassed = event.to_data()?;

        ctx.send(Message::from_payload(&CancelOrder {
            order_id: data.order_id,
        })?)?;
        ctx.end()?;

        Ok(())
    }
}

#[derive(Clone)]
struct OnCustomerLinked;

impl SagaHandler for OnCustomerLinked {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data: CustomerLinked = event.to_data()?;
        ctx.associate_with("customer_id", data.customer_id)?;

        Ok(())
    }
}

#[derive(Clone)]
struct OnCustomerUnlinked;

impl SagaHandler for OnCustomerUnlinked {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        let data: CustomerUnlinked = event.to_data()?;
        ctx.remove_association("customer_id", data.customer_id)?;

        Ok(())
    }
}

pub fn order_saga() -> SagaRule {
    SagaRule::of::<OrderSaga>()
        .start(
            OrderPlaced::payload_type(),
            "order_id",
            CreationPolicy::IfNoneFound,
            OnOrderPlaced,
        )
        .handler(PaymentReceived::payload_type(), "order_id", OnPaymentReceived)
        .handler(
            PaymentDeadlinePassed::payload_type(),
            "order_id",
            OnPaymentDeadlinePassed,
        )
        .handler("customer-*", "order_id", CustomerRoute)
}

/// Routes both customer events through one glob registration.
#[derive(Clone)]
struct CustomerRoute;

impl SagaHandler for CustomerRoute {
    fn handle(&self, event: &Message, ctx: &mut SagaContext<'_>) -> anyhow::Result<()> {
        if event.is::<CustomerLinked>() {
            return OnCustomerLinked.handle(event, ctx);
        }

        OnCustomerUnlinked.handle(event, ctx)
    }
}

pub fn order_saga_type() -> &'static str {
    OrderSaga::saga_type()
}
