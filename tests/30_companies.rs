mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::{failed_fields, TestServer};
use company_registry_api::database::models::company::current_year;
use company_registry_api::database::Store;

fn acme() -> Value {
    json!({
        "name": "Acme",
        "description": "x",
        "levelImpact": "Alto",
        "yearsTrajectory": 5,
        "category": "Tech"
    })
}

fn names(body: &Value) -> Vec<String> {
    body["data"]["companies"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|c| c["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn company_routes_require_admin() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, user_token) = server.create_user("plain").await?;

    let res = server.client.post(server.url("/company")).json(&acme()).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/company"))
        .bearer_auth(&user_token)
        .json(&acme())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(server.url("/company")).bearer_auth(&user_token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .delete(server.url(&format!("/company/{}", Uuid::new_v4())))
        .bearer_auth(&user_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn create_with_direct_trajectory() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin.clone().expect("admin");

    let res = server
        .client
        .post(server.url("/company"))
        .bearer_auth(server.admin_token())
        .json(&acme())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    let company = &body["data"];
    assert_eq!(company["yearsTrajectory"], 5);
    assert_eq!(company["levelImpact"], "Alto");
    assert_eq!(company["createdBy"], json!(admin.id));
    assert_eq!(company["status"], true);
    Ok(())
}

#[tokio::test]
async fn create_with_founding_year() -> Result<()> {
    let server = TestServer::start().await?;

    let mut body = acme();
    body.as_object_mut().expect("object").remove("yearsTrajectory");
    body["foundingYear"] = json!(2005);
    body["levelImpact"] = json!("High");

    let res = server
        .client
        .post(server.url("/company"))
        .bearer_auth(server.admin_token())
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let created = res.json::<Value>().await?;
    assert_eq!(created["data"]["yearsTrajectory"], json!(current_year() - 2005));
    // English aliases are stored under the canonical name
    assert_eq!(created["data"]["levelImpact"], "Alto");
    Ok(())
}

#[tokio::test]
async fn create_requires_exactly_one_trajectory() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token();

    let mut both = acme();
    both["foundingYear"] = json!(2005);
    let res = server.client.post(server.url("/company")).bearer_auth(&token).json(&both).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&res.json::<Value>().await?), vec!["yearsTrajectory"]);

    let mut neither = acme();
    neither.as_object_mut().expect("object").remove("yearsTrajectory");
    let res = server.client.post(server.url("/company")).bearer_auth(&token).json(&neither).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mut negative = acme();
    negative["yearsTrajectory"] = json!(-1);
    let res = server.client.post(server.url("/company")).bearer_auth(&token).json(&negative).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn create_rejects_duplicate_name_and_bad_level() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_company("Acme", 5, "Tech").await?;

    let mut body = acme();
    body["levelImpact"] = json!("Extreme");
    let res = server
        .client
        .post(server.url("/company"))
        .bearer_auth(server.admin_token())
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&res.json::<Value>().await?), vec!["name", "levelImpact"]);
    Ok(())
}

#[tokio::test]
async fn list_filters_and_totals() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_company("Delta", 2, "Tech").await?;
    server.create_company("alpha", 8, "tech").await?;
    server.create_company("Charlie", 15, "Retail").await?;
    server.create_company("Bravo", 30, "Tech").await?;
    let token = server.admin_token();

    let res = server.client.get(server.url("/company")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(names(&body), vec!["Delta", "alpha", "Charlie", "Bravo"]);

    let res = server
        .client
        .get(server.url("/company?category=TECH&minYears=5&order=asc"))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(names(&body), vec!["alpha", "Bravo"]);

    let res = server
        .client
        .get(server.url("/company?order=desc&limite=2&desde=1"))
        .bearer_auth(&token)
        .send()
        .await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(names(&body), vec!["Charlie", "Bravo"]);

    let res = server
        .client
        .get(server.url("/company?maxYears=10"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.json::<Value>().await?["data"]["total"], 2);
    Ok(())
}

#[tokio::test]
async fn list_rejects_bad_query() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.admin_token();

    for (query, field) in [
        ("order=sideways", "order"),
        ("limite=abc", "limite"),
        ("desde=-1", "desde"),
        ("minYears=9&maxYears=3", "minYears"),
    ] {
        let res = server
            .client
            .get(server.url(&format!("/company?{}", query)))
            .bearer_auth(&token)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query {}", query);
        assert_eq!(failed_fields(&res.json::<Value>().await?), vec![field]);
    }
    Ok(())
}

#[tokio::test]
async fn get_resolves_owner() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_company("Acme", 5, "Tech").await?;
    let token = server.admin_token();

    let res = server
        .client
        .get(server.url(&format!("/company/{}", created["id"].as_str().unwrap_or_default())))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let owner = &body["data"]["createdBy"];
    assert_eq!(owner["name"], "Admin");
    assert_eq!(owner["email"], "admin@admin.com");

    let res = server
        .client
        .get(server.url(&format!("/company/{}", Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.get(server.url("/company/abc")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_company_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_company("Acme", 5, "Tech").await?;
    server.create_company("Globex", 3, "Tech").await?;
    let id = created["id"].as_str().unwrap_or_default().to_string();
    let token = server.admin_token();

    let res = server
        .client
        .put(server.url(&format!("/company/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "name": "Acme", "foundingYear": 2000, "category": "Industry" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["yearsTrajectory"], json!(current_year() - 2000));
    assert_eq!(body["data"]["category"], "Industry");
    assert_eq!(body["data"]["description"], "Acme description");

    let res = server
        .client
        .put(server.url(&format!("/company/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "name": "Globex" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&res.json::<Value>().await?), vec!["name"]);

    let res = server
        .client
        .put(server.url(&format!("/company/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "createdBy": Uuid::new_v4() }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&res.json::<Value>().await?), vec!["createdBy"]);
    Ok(())
}

#[tokio::test]
async fn update_unknown_company_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_company("Acme", 5, "Tech").await?;

    let res = server
        .client
        .put(server.url(&format!("/company/{}", Uuid::new_v4())))
        .bearer_auth(server.admin_token())
        .json(&json!({ "category": "Changed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .put(server.url(&format!("/company/{}", Uuid::new_v4())))
        .bearer_auth(server.admin_token())
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let id: Uuid = created["id"].as_str().unwrap_or_default().parse()?;
    let stored = server.store.find_company(id).await?.expect("company");
    assert_eq!(stored.category, "Tech");
    Ok(())
}

#[tokio::test]
async fn delete_is_logical() -> Result<()> {
    let server = TestServer::start().await?;
    let created = server.create_company("Acme", 5, "Tech").await?;
    server.create_company("Globex", 3, "Tech").await?;
    let id_str = created["id"].as_str().unwrap_or_default().to_string();
    let token = server.admin_token();

    let res = server
        .client
        .delete(server.url(&format!("/company/{}", id_str)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["company"]["status"], false);

    let id: Uuid = id_str.parse()?;
    let stored = server.store.find_company(id).await?.expect("still stored");
    assert!(!stored.status);

    let res = server.client.get(server.url("/company")).bearer_auth(&token).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(names(&body), vec!["Globex"]);

    let res = server
        .client
        .delete(server.url(&format!("/company/{}", id_str)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url(&format!("/company/{}", id_str)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn company_names_are_unique_ignoring_case() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_company("Acme", 5, "Tech").await?;

    let res = server
        .client
        .post(server.url("/company"))
        .bearer_auth(server.admin_token())
        .json(&json!({
            "name": "ACME", "description": "x", "levelImpact": "Alto",
            "yearsTrajectory": 2, "category": "Tech"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(failed_fields(&res.json::<Value>().await?), vec!["name"]);
    Ok(())
}
