//! Records are only visible to their store, or to the head office.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use sav_integration_tests::{TestServer, send_json};
use serde_json::json;

fn client_body(last_name: &str) -> serde_json::Value {
    json!({ "last_name": last_name, "first_name": "Jeanne", "phone": "03 80 12 34 56" })
}

#[tokio::test]
async fn test_shop_sees_only_its_own_clients() {
    let server = TestServer::spawn().await;
    let dijon = server.signed_in("DIJ", "5310").await;
    let beaune = server.signed_in("BEA", "2741").await;

    let (status, created) = send_json(
        dijon
            .post(server.url("/api/clients"))
            .json(&client_body("MARTIN")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["magasin"], "DIJ");
    let id = created["id"].as_str().unwrap().to_string();

    let (_, listed) = send_json(beaune.get(server.url("/api/clients"))).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);

    let (status, _) = send_json(beaune.get(server.url(&format!("/api/clients/{id}")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(beaune.delete(server.url(&format!("/api/clients/{id}")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(server.store().count("clients").await, 1);
}

#[tokio::test]
async fn test_admin_sees_every_store() {
    let server = TestServer::spawn().await;
    let dijon = server.signed_in("DIJ", "5310").await;
    let beaune = server.signed_in("BEA", "2741").await;
    let admin = server.signed_in("ADMIN", "1988").await;

    for (client, name) in [(&dijon, "MARTIN"), (&beaune, "DUPONT")] {
        let (status, _) =
            send_json(client.post(server.url("/api/clients")).json(&client_body(name))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, listed) = send_json(admin.get(server.url("/api/clients"))).await;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["last_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["DUPONT", "MARTIN"]);
}

#[tokio::test]
async fn test_client_search_by_name_or_phone() {
    let server = TestServer::spawn().await;
    let dijon = server.signed_in("DIJ", "5310").await;
    for name in ["MARTIN", "MARTINEZ", "BERNARD"] {
        send_json(dijon.post(server.url("/api/clients")).json(&client_body(name))).await;
    }

    let (_, found) = send_json(dijon.get(server.url("/api/clients?q=martin"))).await;
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (_, found) = send_json(dijon.get(server.url("/api/clients?q=0380123456"))).await;
    assert_eq!(found.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_shop_cannot_create_for_another_store() {
    let server = TestServer::spawn().await;
    let dijon = server.signed_in("DIJ", "5310").await;

    let mut body = client_body("MARTIN");
    body["magasin"] = json!("BEA");
    let (status, _) = send_json(dijon.post(server.url("/api/clients")).json(&body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chain_wide_collaborators_are_admin_only() {
    let server = TestServer::spawn().await;
    let admin = server.signed_in("ADMIN", "1988").await;
    let dijon = server.signed_in("DIJ", "5310").await;

    let (status, _) = send_json(
        admin
            .post(server.url("/api/collaborators"))
            .json(&json!({ "name": "Paul Girard", "role": "technicien" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = send_json(
        dijon
            .post(server.url("/api/collaborators"))
            .json(&json!({ "name": "Claire Petit", "role": "audioprothesiste" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["magasin"], "DIJ");

    let (_, seen_by_shop) = send_json(dijon.get(server.url("/api/collaborators"))).await;
    assert_eq!(seen_by_shop.as_array().unwrap().len(), 1);

    let (_, seen_by_admin) = send_json(admin.get(server.url("/api/collaborators"))).await;
    assert_eq!(seen_by_admin.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_profiles() {
    let server = TestServer::spawn().await;
    let admin = server.signed_in("ADMIN", "1988").await;
    let dijon = server.signed_in("DIJ", "5310").await;

    let (_, stores) = send_json(dijon.get(server.url("/api/stores"))).await;
    let stores = stores.as_array().unwrap();
    assert_eq!(stores.len(), 6);
    assert!(stores.iter().all(|s| s.get("pin").is_none()));

    let profile = json!({ "address": "12 rue de la Liberté, 21000 Dijon", "phone": "03 80 00 00 00" });
    let (status, _) = send_json(
        dijon
            .put(server.url("/api/stores/DIJ/profile"))
            .json(&profile),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(
        admin
            .put(server.url("/api/stores/DIJ/profile"))
            .json(&profile),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(dijon.get(server.url("/api/stores/DIJ/profile"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "DIJ");
    assert_eq!(body["address"], "12 rue de la Liberté, 21000 Dijon");

    let (status, _) = send_json(dijon.get(server.url("/api/stores/BEA/profile"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        admin
            .put(server.url("/api/stores/DIJ/profile"))
            .json(&json!({ "address": "12 rue de la Liberté", "email": "pas-un-mail" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, body) = send_json(dijon.get(server.url("/api/stores/DIJ/profile"))).await;
    assert!(body["email"].is_null());
}
