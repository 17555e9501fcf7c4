pub mod common;

use common::TestApp;
use ticket_desk::models::Status;

#[tokio::test]
async fn admin_resolves_with_a_response() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let root = app.admin("root").await;
    alice.create_ticket("Bug API", "Erreur 500", "").await;

    let response = root
        .post(
            "/tickets/1/admin",
            &[("status", "resolu"), ("admin_response", "Corrigé en production.")],
        )
        .await;
    assert_eq!(response.path(), Some("/"));
    assert_eq!(response.notice().as_deref(), Some("Ticket mis à jour."));
    assert_eq!(response.notice_level().as_deref(), Some("success"));

    let ticket = app.ticket(1).await;
    assert_eq!(ticket.status, Status::Resolved);
    assert_eq!(ticket.admin_response.as_deref(), Some("Corrigé en production."));
    assert_eq!(ticket.title, "Bug API");

    let listing = alice.api_tickets("?status=resolu").await;
    assert_eq!(listing["count"], 1);
    assert!(alice.get("/").await.body.contains("Corrigé en production."));
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let root = app.admin("root").await;
    alice.create_ticket("Bug API", "Erreur 500", "").await;

    let response = root
        .post("/tickets/1/admin", &[("status", "closed"), ("admin_response", "Vu")])
        .await;
    assert_eq!(response.notice().as_deref(), Some("Statut invalide."));
    assert_eq!(response.notice_level().as_deref(), Some("danger"));

    let ticket = app.ticket(1).await;
    assert_eq!(ticket.status, Status::Pending);
    assert_eq!(ticket.admin_response, None);
}

#[tokio::test]
async fn omitted_status_keeps_the_current_one() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let root = app.admin("root").await;
    alice.create_ticket("Bug API", "Erreur 500", "").await;

    root.post("/tickets/1/admin", &[("status", "en_cours"), ("admin_response", "Pris en charge")])
        .await;
    let response = root.post("/tickets/1/admin", &[("admin_response", "   ")]).await;
    assert_eq!(response.notice().as_deref(), Some("Ticket mis à jour."));

    let ticket = app.ticket(1).await;
    assert_eq!(ticket.status, Status::InProgress);
    // blank response clears it
    assert_eq!(ticket.admin_response, None);
}

#[tokio::test]
async fn ordinary_users_cannot_triage() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    alice.create_ticket("Bug API", "Erreur 500", "").await;

    for client in [alice, app.client()] {
        let response = client
            .post("/tickets/1/admin", &[("status", "resolu"), ("admin_response", "Done")])
            .await;
        assert_eq!(response.path(), Some("/"));
        assert_eq!(
            response.notice().as_deref(),
            Some("Accès réservé aux administrateurs.")
        );
        assert_eq!(response.notice_level().as_deref(), Some("danger"));
    }

    let ticket = app.ticket(1).await;
    assert_eq!(ticket.status, Status::Pending);
    assert_eq!(ticket.admin_response, None);
}

#[tokio::test]
async fn triage_of_a_missing_ticket() {
    let app = TestApp::new();
    let root = app.admin("root").await;

    let response = root.post("/tickets/7/admin", &[("status", "resolu")]).await;
    assert_eq!(response.notice().as_deref(), Some("Ticket introuvable."));
}

#[tokio::test]
async fn only_admins_see_the_triage_form() {
    let app = TestApp::new();
    let alice = app.user("alice").await;
    let root = app.admin("root").await;
    alice.create_ticket("Bug API", "Erreur 500", "").await;

    assert!(root.get("/").await.body.contains(r#"action="/tickets/1/admin""#));
    assert!(!alice.get("/").await.body.contains(r#"action="/tickets/1/admin""#));
}
