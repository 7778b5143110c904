//! Background task handling for the kiosk
//!
//! Effects produced by the session are either applied to the UI right away
//! (alerts, notifications, resets) or run as tokio tasks whose results come
//! back as `BackgroundMessage::Response` and are fed into the session on the
//! UI thread.
//!
//! Channel sends use `let _ =`: the receiver is only gone during shutdown,
//! when nobody is waiting for the result anyway.

use crate::app::messages::BackgroundMessage;
use crate::app::RuntimeContext;
use crate::kiosk::artifact::{encode_qr, save_pdf};
use crate::kiosk::{Effect, Event};
use crate::ui::{App, ToastKind};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc;
use tracing::{debug, error};

/// Feed one event to the session and carry out what it asks for.
pub fn dispatch(app: &mut App, event: Event, ctx: &RuntimeContext) {
    let effects = app.session.handle(event);
    execute_effects(app, effects, ctx);
    app.clamp_cursors();
}

pub fn drain_messages(app: &mut App, rx: &mpsc::Receiver<BackgroundMessage>, ctx: &RuntimeContext) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            BackgroundMessage::Response(event) => dispatch(app, event, ctx),
            BackgroundMessage::Error(e) => {
                error!("{}", e);
                app.show_toast("Ocurrió un error inesperado.", ToastKind::Error);
            }
        }
    }
}

pub fn execute_effects(app: &mut App, effects: Vec<Effect>, ctx: &RuntimeContext) {
    for effect in effects {
        match effect {
            Effect::Alert(message) => app.show_toast(&message, ToastKind::Error),
            Effect::Notify(message) => app.show_toast(&message, ToastKind::Success),
            Effect::SessionReset(reason) => app.on_session_reset(reason),
            request => spawn_request(request, ctx),
        }
    }
}

fn spawn_request(effect: Effect, ctx: &RuntimeContext) {
    let api = ctx.api.clone();
    let tx = ctx.tx.clone();
    let respond = move |event: Event| {
        let _ = tx.send(BackgroundMessage::Response(event));
    };

    match effect {
        Effect::LoadAreas {
            tag,
            branch_id,
            is_client,
        } => {
            debug!(branch = %branch_id, is_client, "loading areas");
            spawn_background(ctx.tx.clone(), "load_areas", async move {
                let result = api.list_areas(&branch_id, is_client).await;
                respond(Event::AreasLoaded { tag, result });
            });
        }
        Effect::LoadServices {
            tag,
            area_id,
            is_client,
        } => {
            debug!(area = %area_id, is_client, "loading services");
            spawn_background(ctx.tx.clone(), "load_services", async move {
                let result = api.list_services(&area_id, is_client).await;
                respond(Event::ServicesLoaded { tag, result });
            });
        }
        Effect::ValidateContract { tag, contract } => {
            spawn_background(ctx.tx.clone(), "validate_contract", async move {
                let result = api.validate_contract(&contract).await;
                respond(Event::ContractValidated { tag, result });
            });
        }
        Effect::CreateTurn { tag, request } => {
            spawn_background(ctx.tx.clone(), "create_turn", async move {
                let result = api.create_turn(&request).await;
                respond(Event::TurnCreated { tag, result });
            });
        }
        Effect::CancelTurn { tag, ticket_id } => {
            spawn_background(ctx.tx.clone(), "cancel_turn", async move {
                let result = api.cancel_turn(&ticket_id).await;
                respond(Event::TurnCancelled { tag, result });
            });
        }
        Effect::RenderQr { tag, payload } => {
            spawn_background(ctx.tx.clone(), "render_qr", async move {
                let result = tokio::task::spawn_blocking(move || encode_qr(&payload))
                    .await
                    .unwrap_or_else(|e| Err(e.to_string()));
                respond(Event::QrRendered { tag, result });
            });
        }
        Effect::DownloadTicket {
            tag,
            url,
            file_name,
        } => {
            let dir = ctx.download_dir.clone();
            spawn_background(ctx.tx.clone(), "download_ticket", async move {
                let result = match api.fetch_pdf(url).await {
                    Ok(bytes) => tokio::task::spawn_blocking(move || {
                        save_pdf(&dir, &file_name, &bytes).map_err(|e| e.to_string())
                    })
                    .await
                    .unwrap_or_else(|e| Err(e.to_string())),
                    Err(e) => Err(e.to_string()),
                };
                respond(Event::TicketDownloaded { tag, result });
            });
        }
        Effect::Alert(_) | Effect::Notify(_) | Effect::SessionReset(_) => {}
    }
}

pub fn spawn_background<F>(tx: mpsc::Sender<BackgroundMessage>, task_name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let detail = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            let _ = tx.send(BackgroundMessage::Error(format!(
                "Background task '{}' crashed unexpectedly: {}",
                task_name, detail
            )));
        }
    });
}
