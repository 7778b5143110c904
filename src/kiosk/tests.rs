use super::artifact::{encode_qr, QrState};
use super::*;
use crate::api::ApiError;
use crate::models::{Area, Branch, Service, Ticket, ValidatedClient};
use url::Url;

// ========================================================================
// Fixtures
// ========================================================================

fn settings() -> KioskSettings {
    KioskSettings {
        api_base: Url::parse("http://turnos.test/api/").unwrap(),
        idle_secs: 60,
        return_secs: 20,
    }
}

fn centro() -> Branch {
    Branch::new("b-centro", "Centro")
}

fn new_session() -> KioskSession {
    KioskSession::new(centro(), settings())
}

fn area(id: &str, name: &str) -> Area {
    Area {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        code: String::new(),
    }
}

fn service(id: &str, name: &str) -> Service {
    Service {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        code: String::new(),
        client_eligibility: None,
    }
}

fn ticket(id: &str, number: &str) -> Ticket {
    Ticket {
        id: id.into(),
        number: number.into(),
        area_name: "Facturación".into(),
        service_name: "Consulta de Recibo".into(),
        branch_name: "Centro".into(),
        wait_time: Some(10),
        created_at: None,
    }
}

fn client() -> ValidatedClient {
    ValidatedClient {
        id: "cli-7".into(),
        name: "Ana Torres".into(),
        contract: Some("123456".into()),
    }
}

fn areas_tag(effects: &[Effect]) -> RequestTag {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::LoadAreas { tag, .. } => Some(*tag),
            _ => None,
        })
        .expect("areas should be requested")
}

fn services_tag(effects: &[Effect]) -> RequestTag {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::LoadServices { tag, .. } => Some(*tag),
            _ => None,
        })
        .expect("services should be requested")
}

fn create_tags(effects: &[Effect]) -> Vec<RequestTag> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::CreateTurn { tag, .. } => Some(*tag),
            _ => None,
        })
        .collect()
}

fn cancel_tags(effects: &[Effect]) -> Vec<RequestTag> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::CancelTurn { tag, .. } => Some(*tag),
            _ => None,
        })
        .collect()
}

/// Non-client visitor with the area list loaded.
fn at_service_selection() -> KioskSession {
    with_areas_loaded(new_session())
}

fn with_areas_loaded(mut s: KioskSession) -> KioskSession {
    let effects = s.handle(Event::ChooseNonClient);
    let tag = areas_tag(&effects);
    s.handle(Event::AreasLoaded {
        tag,
        result: Ok(vec![
            area("a-fac", "Facturación"),
            area("a-caja", "Caja"),
            area("a-tec", "Servicios Técnicos"),
        ]),
    });
    s
}

/// Area and service picked, confirmation modal open.
fn at_confirmation() -> KioskSession {
    confirming(at_service_selection())
}

fn confirming(mut s: KioskSession) -> KioskSession {
    let tag = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    s.handle(Event::ServicesLoaded {
        tag,
        result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
    });
    s.handle(Event::SelectService("s-recibo".into()));
    assert_eq!(s.active_modal(), Modal::Confirm);
    s
}

fn at_ticket() -> KioskSession {
    let mut s = at_confirmation();
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    s.handle(Event::TurnCreated {
        tag,
        result: Ok(ticket("t-42", "42")),
    });
    assert_eq!(s.step(), Step::Ticket);
    s
}

fn assert_initial(s: &KioskSession) {
    assert_eq!(s.step(), Step::ClientType);
    assert_eq!(s.client_type(), None);
    assert!(s.selection().selected_area().is_none());
    assert!(s.selection().selected_service().is_none());
    assert!(s.selection().areas().is_empty());
    assert!(s.ticket().is_none());
    assert_eq!(s.idle_remaining(), None);
    assert_eq!(s.return_remaining(), None);
    assert_eq!(s.active_modal(), Modal::None);
    assert!(!s.is_creating());
    assert!(!s.is_cancelling());
    s.check_invariants().unwrap();
}

// ========================================================================
// Scenarios
// ========================================================================

#[test]
fn test_scenario_a_ticket_issued_then_auto_return() {
    let mut s = at_confirmation();
    assert_eq!(s.selection().selected_area().unwrap().name, "Facturación");
    assert_eq!(
        s.selection().selected_service().unwrap().name,
        "Consulta de Recibo"
    );

    let mut effects = Vec::new();
    for _ in 0..3 {
        effects.extend(s.handle(Event::ConfirmTurn));
    }
    let creates = create_tags(&effects);
    assert_eq!(creates.len(), 1);
    match &effects[0] {
        Effect::CreateTurn { request, .. } => {
            assert_eq!(request.ck_sucursal, "b-centro");
            assert_eq!(request.ck_area, "a-fac");
            assert_eq!(request.ck_servicio, "s-recibo");
            assert!(!request.es_cliente);
            assert_eq!(request.ck_cliente, None);
        }
        other => panic!("unexpected effect {other:?}"),
    }

    let effects = s.handle(Event::TurnCreated {
        tag: creates[0],
        result: Ok(ticket("t-42", "42")),
    });
    assert_eq!(s.step(), Step::Ticket);
    assert_eq!(s.ticket().unwrap().number, "42");
    assert_eq!(s.return_remaining(), Some(20));
    assert_eq!(s.idle_remaining(), None);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::RenderQr { payload, .. } if payload == "http://turnos.test/api/turnos/ticket/t-42/pdf"
    )));

    for _ in 0..19 {
        assert!(s.handle(Event::Tick).is_empty());
        assert_eq!(s.step(), Step::Ticket);
    }
    assert_eq!(s.return_remaining(), Some(1));

    let effects = s.handle(Event::Tick);
    assert_eq!(effects, vec![Effect::SessionReset(ResetReason::ReturnTimeout)]);
    assert_initial(&s);
    assert_eq!(s.branch().name, "Centro");
}

#[test]
fn test_scenario_b_stale_service_response_discarded() {
    let mut s = at_service_selection();
    let for_a1 = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    let for_a2 = services_tag(&s.handle(Event::SelectArea("a-caja".into())));

    s.handle(Event::ServicesLoaded {
        tag: for_a1,
        result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
    });
    assert!(s.selection().services().is_empty());
    assert_eq!(s.selection().selected_area().unwrap().id, "a-caja");

    s.handle(Event::ServicesLoaded {
        tag: for_a2,
        result: Ok(vec![service("s-pago", "Pago en Caja")]),
    });
    let ids: Vec<_> = s.selection().services().iter().map(|x| x.id.as_str()).collect();
    assert_eq!(ids, vec!["s-pago"]);
}

#[test]
fn test_scenario_c_failed_contract_validation_keeps_client_type() {
    let mut s = new_session();
    assert!(s.handle(Event::ChooseClient).is_empty());
    assert_eq!(s.active_modal(), Modal::ContractValidation);

    for c in "123456".chars() {
        s.handle(Event::ContractInput(c));
    }
    let effects = s.handle(Event::SubmitContract);
    let tag = match effects.as_slice() {
        [Effect::ValidateContract { tag, contract }] => {
            assert_eq!(contract, "123456");
            *tag
        }
        other => panic!("unexpected effects {other:?}"),
    };

    let effects = s.handle(Event::ContractValidated {
        tag,
        result: Err(ApiError::Rejected("contrato no encontrado".into())),
    });
    assert!(effects.is_empty());
    assert_eq!(s.step(), Step::ClientType);
    assert_eq!(s.client_type(), None);
    assert_eq!(s.active_modal(), Modal::ContractValidation);
    assert!(s.contract().error().is_some());

    // Retry is possible right away
    assert!(matches!(
        s.handle(Event::SubmitContract).as_slice(),
        [Effect::ValidateContract { .. }]
    ));
}

// ========================================================================
// Client path
// ========================================================================

#[test]
fn test_contract_success_sets_client_and_enters_selection_together() {
    let mut s = new_session();
    s.handle(Event::ChooseClient);
    s.handle(Event::ContractInput('9'));
    let tag = match s.handle(Event::SubmitContract).as_slice() {
        [Effect::ValidateContract { tag, .. }] => *tag,
        other => panic!("unexpected effects {other:?}"),
    };

    let effects = s.handle(Event::ContractValidated {
        tag,
        result: Ok(client()),
    });
    assert_eq!(s.step(), Step::ServiceSelection);
    assert_eq!(s.client_type(), Some(true));
    assert_eq!(s.validated_client().unwrap().id, "cli-7");
    assert_eq!(s.active_modal(), Modal::None);
    assert!(matches!(
        effects.as_slice(),
        [Effect::LoadAreas { is_client: true, branch_id, .. }] if branch_id == "b-centro"
    ));
}

#[test]
fn test_client_turn_request_carries_client_id() {
    let mut s = new_session();
    s.handle(Event::ChooseClient);
    s.handle(Event::ContractInput('1'));
    let tag = match s.handle(Event::SubmitContract).as_slice() {
        [Effect::ValidateContract { tag, .. }] => *tag,
        other => panic!("unexpected effects {other:?}"),
    };
    let tag = areas_tag(&s.handle(Event::ContractValidated {
        tag,
        result: Ok(client()),
    }));
    s.handle(Event::AreasLoaded {
        tag,
        result: Ok(vec![area("a-fac", "Facturación")]),
    });
    let tag = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    s.handle(Event::ServicesLoaded {
        tag,
        result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
    });
    s.handle(Event::SelectService("s-recibo".into()));

    match s.handle(Event::ConfirmTurn).as_slice() {
        [Effect::CreateTurn { request, .. }] => {
            assert!(request.es_cliente);
            assert_eq!(request.ck_cliente.as_deref(), Some("cli-7"));
        }
        other => panic!("unexpected effects {other:?}"),
    }
}

#[test]
fn test_dismissed_gate_ignores_late_validation() {
    let mut s = new_session();
    s.handle(Event::ChooseClient);
    s.handle(Event::ContractInput('5'));
    let tag = match s.handle(Event::SubmitContract).as_slice() {
        [Effect::ValidateContract { tag, .. }] => *tag,
        other => panic!("unexpected effects {other:?}"),
    };
    s.handle(Event::DismissContract);

    let effects = s.handle(Event::ContractValidated {
        tag,
        result: Ok(client()),
    });
    assert!(effects.is_empty());
    assert_initial(&s);
}

#[test]
fn test_non_client_choice_is_ignored_while_gate_open() {
    let mut s = new_session();
    s.handle(Event::ChooseClient);
    assert!(s.handle(Event::ChooseNonClient).is_empty());
    assert_eq!(s.step(), Step::ClientType);
}

// ========================================================================
// Selection engine through the machine
// ========================================================================

#[test]
fn test_any_delivery_order_shows_current_area_services() {
    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];
    for order in orders {
        let mut s = at_service_selection();
        let tags = [
            services_tag(&s.handle(Event::SelectArea("a-fac".into()))),
            services_tag(&s.handle(Event::SelectArea("a-caja".into()))),
            services_tag(&s.handle(Event::SelectArea("a-tec".into()))),
        ];
        let names = ["from-fac", "from-caja", "from-tec"];

        for i in order {
            s.handle(Event::ServicesLoaded {
                tag: tags[i],
                result: Ok(vec![service(names[i], names[i])]),
            });
            let shown: Vec<_> = s.selection().services().iter().map(|x| x.id.clone()).collect();
            assert!(
                shown.is_empty() || shown == vec!["from-tec".to_string()],
                "order {order:?} showed {shown:?}"
            );
        }
        assert_eq!(s.selection().services()[0].id, "from-tec");
    }
}

#[test]
fn test_reselecting_area_does_not_refetch() {
    let mut s = at_service_selection();
    let tag = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    s.handle(Event::ServicesLoaded {
        tag,
        result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
    });
    assert!(s.handle(Event::SelectArea("a-fac".into())).is_empty());
    assert_eq!(s.selection().services().len(), 1);
}

#[test]
fn test_listing_failure_degrades_to_empty_without_alert() {
    let mut s = at_service_selection();
    let tag = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    let effects = s.handle(Event::ServicesLoaded {
        tag,
        result: Err(ApiError::Status {
            status: 500,
            body: "boom".into(),
        }),
    });
    assert!(effects.is_empty());
    assert!(s.selection().services().is_empty());
    assert_eq!(s.step(), Step::ServiceSelection);

    // Re-selecting another area retries normally
    assert!(matches!(
        s.handle(Event::SelectArea("a-caja".into())).as_slice(),
        [Effect::LoadServices { .. }]
    ));
}

#[test]
fn test_area_response_from_previous_session_is_discarded() {
    let mut s = new_session();
    let old = areas_tag(&s.handle(Event::ChooseNonClient));
    s.handle(Event::BackNavigation);
    let new = areas_tag(&s.handle(Event::ChooseNonClient));
    assert_ne!(old.session, new.session);

    s.handle(Event::AreasLoaded {
        tag: old,
        result: Ok(vec![area("stale", "Stale")]),
    });
    assert!(s.selection().areas().is_empty());
    assert!(s.selection().is_loading_areas());
}

// ========================================================================
// Timers
// ========================================================================

#[test]
fn test_idle_timer_starts_full_and_resets_on_area_selection() {
    let mut s = at_service_selection();
    assert_eq!(s.idle_remaining(), Some(60));
    for _ in 0..59 {
        s.handle(Event::Tick);
    }
    assert_eq!(s.idle_remaining(), Some(1));

    s.handle(Event::SelectArea("a-fac".into()));
    assert_eq!(s.idle_remaining(), Some(60));
}

#[test]
fn test_idle_expiry_clears_everything() {
    let mut s = at_confirmation();
    let mut last = Vec::new();
    for _ in 0..60 {
        last = s.handle(Event::Tick);
    }
    assert_eq!(last, vec![Effect::SessionReset(ResetReason::IdleTimeout)]);
    assert_initial(&s);
}

#[test]
fn test_reentering_selection_starts_fresh_idle_budget() {
    let mut s = at_service_selection();
    for _ in 0..30 {
        s.handle(Event::Tick);
    }
    s.handle(Event::BackNavigation);
    assert_eq!(s.idle_remaining(), None);

    s.handle(Event::ChooseNonClient);
    assert_eq!(s.idle_remaining(), Some(60));
}

#[test]
fn test_ticks_on_client_type_do_nothing() {
    let mut s = new_session();
    for _ in 0..500 {
        assert!(s.handle(Event::Tick).is_empty());
    }
    assert_initial(&s);
}

#[test]
fn test_activity_refreshes_idle_budget() {
    let mut s = at_service_selection();
    for _ in 0..40 {
        s.handle(Event::Tick);
    }
    s.handle(Event::Activity);
    assert_eq!(s.idle_remaining(), Some(60));
}

#[test]
fn test_only_one_timer_runs_at_a_time() {
    let s = at_service_selection();
    assert!(s.idle_remaining().is_some());
    assert!(s.return_remaining().is_none());

    let s = at_ticket();
    assert!(s.idle_remaining().is_none());
    assert!(s.return_remaining().is_some());
}

#[test]
fn test_manual_return_resets_and_next_ticket_gets_full_countdown() {
    let mut s = at_ticket();
    for _ in 0..15 {
        s.handle(Event::Tick);
    }
    assert_eq!(
        s.handle(Event::ManualReturn),
        vec![Effect::SessionReset(ResetReason::ManualReturn)]
    );
    assert_initial(&s);

    let tag = areas_tag(&s.handle(Event::ChooseNonClient));
    s.handle(Event::AreasLoaded {
        tag,
        result: Ok(vec![area("a-fac", "Facturación")]),
    });
    let tag = services_tag(&s.handle(Event::SelectArea("a-fac".into())));
    s.handle(Event::ServicesLoaded {
        tag,
        result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
    });
    s.handle(Event::SelectService("s-recibo".into()));
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    s.handle(Event::TurnCreated {
        tag,
        result: Ok(ticket("t-43", "43")),
    });
    assert_eq!(s.return_remaining(), Some(20));
}

// ========================================================================
// Creation
// ========================================================================

#[test]
fn test_creation_failure_alerts_and_allows_retry() {
    let mut s = at_confirmation();
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    let effects = s.handle(Event::TurnCreated {
        tag,
        result: Err(ApiError::Rejected("Servicio no disponible".into())),
    });
    match effects.as_slice() {
        [Effect::Alert(msg)] => assert!(msg.contains("Servicio no disponible")),
        other => panic!("unexpected effects {other:?}"),
    }
    assert_eq!(s.step(), Step::ServiceSelection);
    assert_eq!(s.active_modal(), Modal::Confirm);
    assert!(!s.is_creating());
    assert!(s.selection().selected_service().is_some());

    assert_eq!(create_tags(&s.handle(Event::ConfirmTurn)).len(), 1);
}

#[test]
fn test_confirmation_cannot_be_dismissed_while_creating() {
    let mut s = at_confirmation();
    s.handle(Event::ConfirmTurn);
    s.handle(Event::DismissConfirm);
    assert_eq!(s.active_modal(), Modal::Confirm);
}

#[test]
fn test_dismissed_confirmation_clears_service_only() {
    let mut s = at_confirmation();
    s.handle(Event::DismissConfirm);
    assert_eq!(s.active_modal(), Modal::None);
    assert!(s.selection().selected_service().is_none());
    assert!(s.selection().selected_area().is_some());
    assert_eq!(s.step(), Step::ServiceSelection);
}

#[test]
fn test_creation_response_after_idle_reset_is_discarded() {
    let mut s = at_confirmation();
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    for _ in 0..60 {
        s.handle(Event::Tick);
    }
    assert_eq!(s.step(), Step::ClientType);

    let effects = s.handle(Event::TurnCreated {
        tag,
        result: Ok(ticket("t-99", "99")),
    });
    assert!(effects.is_empty());
    assert_initial(&s);
}

// ========================================================================
// Ticket step
// ========================================================================

#[test]
fn test_successful_cancellation_stops_countdown_and_resets() {
    let mut s = at_ticket();
    s.handle(Event::RequestCancel);
    assert_eq!(s.active_modal(), Modal::CancelConfirm);
    assert_eq!(s.return_remaining(), None);

    let mut effects = Vec::new();
    effects.extend(s.handle(Event::ConfirmCancel));
    effects.extend(s.handle(Event::ConfirmCancel));
    let cancels = cancel_tags(&effects);
    assert_eq!(cancels.len(), 1);
    assert!(s.is_cancelling());

    let effects = s.handle(Event::TurnCancelled {
        tag: cancels[0],
        result: Ok("Turno cancelado".into()),
    });
    assert_eq!(
        effects,
        vec![
            Effect::Notify("Turno cancelado".into()),
            Effect::SessionReset(ResetReason::TurnCancelled),
        ]
    );
    assert_initial(&s);
}

#[test]
fn test_failed_cancellation_keeps_ticket_and_restarts_countdown() {
    let mut s = at_ticket();
    for _ in 0..10 {
        s.handle(Event::Tick);
    }
    s.handle(Event::RequestCancel);
    let tag = cancel_tags(&s.handle(Event::ConfirmCancel))[0];
    let effects = s.handle(Event::TurnCancelled {
        tag,
        result: Err(ApiError::Rejected("El turno ya fue atendido".into())),
    });
    assert!(matches!(effects.as_slice(), [Effect::Alert(m)] if m.contains("ya fue atendido")));
    assert_eq!(s.step(), Step::Ticket);
    assert_eq!(s.active_modal(), Modal::None);
    assert_eq!(s.return_remaining(), Some(20));
    assert!(!s.is_cancelling());
}

#[test]
fn test_dismissing_cancel_restarts_countdown() {
    let mut s = at_ticket();
    s.handle(Event::RequestCancel);
    for _ in 0..100 {
        assert!(s.handle(Event::Tick).is_empty());
    }
    s.handle(Event::DismissCancel);
    assert_eq!(s.return_remaining(), Some(20));
}

#[test]
fn test_manual_return_is_blocked_while_cancelling() {
    let mut s = at_ticket();
    s.handle(Event::RequestCancel);
    s.handle(Event::ConfirmCancel);
    assert!(s.handle(Event::ManualReturn).is_empty());
    assert_eq!(s.step(), Step::Ticket);
}

#[test]
fn test_qr_ready_and_download_share_url() {
    let mut s = at_confirmation();
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    let effects = s.handle(Event::TurnCreated {
        tag,
        result: Ok(ticket("t-42", "42")),
    });
    let (qr_tag, payload) = match effects.as_slice() {
        [Effect::RenderQr { tag, payload }] => (*tag, payload.clone()),
        other => panic!("unexpected effects {other:?}"),
    };
    s.handle(Event::QrRendered {
        tag: qr_tag,
        result: encode_qr(&payload),
    });
    assert!(matches!(s.issued().unwrap().qr(), QrState::Ready(_)));

    let effects = s.handle(Event::DownloadTicket);
    let download_tag = match effects.as_slice() {
        [Effect::DownloadTicket { tag, url, file_name }] => {
            assert_eq!(url.as_str(), payload);
            assert_eq!(file_name, "turno-42.pdf");
            *tag
        }
        other => panic!("unexpected effects {other:?}"),
    };
    assert!(s.handle(Event::DownloadTicket).is_empty());

    let effects = s.handle(Event::TicketDownloaded {
        tag: download_tag,
        result: Ok("/tmp/turno-42.pdf".into()),
    });
    assert!(matches!(effects.as_slice(), [Effect::Notify(m)] if m.contains("turno-42.pdf")));
}

#[test]
fn test_qr_failure_does_not_hide_ticket() {
    let mut s = at_confirmation();
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    let qr_tag = match s
        .handle(Event::TurnCreated {
            tag,
            result: Ok(ticket("t-42", "42")),
        })
        .as_slice()
    {
        [Effect::RenderQr { tag, .. }] => *tag,
        other => panic!("unexpected effects {other:?}"),
    };
    s.handle(Event::QrRendered {
        tag: qr_tag,
        result: Err("encoder crashed".into()),
    });
    assert!(matches!(s.issued().unwrap().qr(), QrState::Failed(_)));
    assert_eq!(s.ticket().unwrap().number, "42");
    assert_eq!(s.step(), Step::Ticket);
}

#[test]
fn test_ticket_without_canonical_url_has_no_qr_or_download() {
    let opaque = KioskSettings {
        api_base: Url::parse("mailto:kiosk@turnos.test").unwrap(),
        ..settings()
    };
    let mut s = confirming(with_areas_loaded(KioskSession::new(centro(), opaque)));
    let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
    let effects = s.handle(Event::TurnCreated {
        tag,
        result: Ok(ticket("t-42", "42")),
    });
    assert!(effects.is_empty());
    assert_eq!(s.step(), Step::Ticket);
    assert_eq!(s.ticket().unwrap().number, "42");
    assert_eq!(s.return_remaining(), Some(20));

    let issued = s.issued().unwrap();
    assert!(issued.pdf_url().is_none());
    assert!(matches!(issued.qr(), QrState::Failed(_)));
    assert!(s.handle(Event::DownloadTicket).is_empty());
}

// ========================================================================
// Global resets
// ========================================================================

#[test]
fn test_branch_change_from_every_step_resets() {
    let sessions = [new_session(), at_service_selection(), at_confirmation(), at_ticket()];
    for mut s in sessions {
        let before = s.session_id();
        let effects = s.handle(Event::BranchChanged(Branch::new("b-norte", "Norte")));
        assert_eq!(effects, vec![Effect::SessionReset(ResetReason::BranchChanged)]);
        assert_initial(&s);
        assert_eq!(s.branch().name, "Norte");
        assert_ne!(s.session_id(), before);
    }
}

#[test]
fn test_back_navigation_forces_reset() {
    let mut s = at_confirmation();
    let effects = s.handle(Event::BackNavigation);
    assert_eq!(effects, vec![Effect::SessionReset(ResetReason::BackNavigation)]);
    assert_initial(&s);
}

fn reset_events() -> [(Event, ResetReason); 2] {
    [
        (
            Event::BranchChanged(Branch::new("b-norte", "Norte")),
            ResetReason::BranchChanged,
        ),
        (Event::BackNavigation, ResetReason::BackNavigation),
    ]
}

#[test]
fn test_late_creation_after_global_reset_is_discarded() {
    for (reset, reason) in reset_events() {
        let mut s = at_confirmation();
        let tag = create_tags(&s.handle(Event::ConfirmTurn))[0];
        assert_eq!(s.handle(reset), vec![Effect::SessionReset(reason)]);

        let effects = s.handle(Event::TurnCreated {
            tag,
            result: Ok(ticket("t-99", "99")),
        });
        assert!(effects.is_empty());
        assert_initial(&s);
    }
}

#[test]
fn test_late_cancellation_after_global_reset_is_discarded() {
    for (reset, reason) in reset_events() {
        let mut s = at_ticket();
        s.handle(Event::RequestCancel);
        let tag = cancel_tags(&s.handle(Event::ConfirmCancel))[0];
        assert_eq!(s.handle(reset), vec![Effect::SessionReset(reason)]);

        for result in [Ok("Turno cancelado".to_string()), Err(ApiError::Rejected("x".into()))] {
            let effects = s.handle(Event::TurnCancelled { tag, result });
            assert!(effects.is_empty());
        }
        assert_initial(&s);
    }
}

#[test]
fn test_modals_are_mutually_exclusive() {
    let mut s = at_confirmation();
    s.handle(Event::ShowPrivacyNotice);
    assert_eq!(s.active_modal(), Modal::Confirm);

    s.handle(Event::DismissConfirm);
    s.handle(Event::ShowPrivacyNotice);
    assert_eq!(s.active_modal(), Modal::PrivacyNotice);
    assert!(s.handle(Event::SelectService("s-recibo".into())).is_empty());
    assert_eq!(s.active_modal(), Modal::PrivacyNotice);
    s.handle(Event::DismissPrivacyNotice);
    assert_eq!(s.active_modal(), Modal::None);
}

#[test]
fn test_invariants_hold_over_mixed_event_stream() {
    // Deterministic pseudo-random walk over user and host events
    let mut s = new_session();
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    let mut pending: Vec<Effect> = Vec::new();

    for _ in 0..2_000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let event = match state % 22 {
            0 => Event::ChooseNonClient,
            1 => Event::SelectArea("a-fac".into()),
            2 => Event::SelectArea("a-caja".into()),
            3 => Event::SelectService("s-recibo".into()),
            4 => Event::ConfirmTurn,
            5 => Event::DismissConfirm,
            6 => Event::RequestCancel,
            7 => Event::ConfirmCancel,
            8 => Event::ManualReturn,
            9 | 10 => Event::Tick,
            11 => Event::BackNavigation,
            12 => Event::ChooseClient,
            13 => Event::ContractInput('7'),
            14 => Event::SubmitContract,
            15 => Event::DismissContract,
            16 => Event::DismissCancel,
            17 if (state >> 8) % 2 == 0 => {
                Event::BranchChanged(Branch::new("b-norte", "Norte"))
            }
            17 => Event::BranchChanged(centro()),
            _ => match pending.pop() {
                Some(Effect::LoadAreas { tag, .. }) => Event::AreasLoaded {
                    tag,
                    result: Ok(vec![area("a-fac", "Facturación"), area("a-caja", "Caja")]),
                },
                Some(Effect::LoadServices { tag, .. }) => Event::ServicesLoaded {
                    tag,
                    result: Ok(vec![service("s-recibo", "Consulta de Recibo")]),
                },
                Some(Effect::CreateTurn { tag, .. }) => Event::TurnCreated {
                    tag,
                    result: Ok(ticket("t-1", "1")),
                },
                Some(Effect::CancelTurn { tag, .. }) => Event::TurnCancelled {
                    tag,
                    result: Ok("ok".into()),
                },
                Some(Effect::ValidateContract { tag, .. }) if (state >> 8) % 3 == 0 => {
                    Event::ContractValidated {
                        tag,
                        result: Err(ApiError::Rejected("Contrato no encontrado".into())),
                    }
                }
                Some(Effect::ValidateContract { tag, .. }) => Event::ContractValidated {
                    tag,
                    result: Ok(client()),
                },
                _ => Event::Activity,
            },
        };
        pending.extend(s.handle(event));
        s.check_invariants().unwrap();
        assert_eq!(s.ticket().is_some(), s.step() == Step::Ticket);
        if s.validated_client().is_some() {
            assert_eq!(s.client_type(), Some(true));
        }
    }
}
