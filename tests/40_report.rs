mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};

use common::TestServer;

#[tokio::test]
async fn report_without_companies_is_not_found() -> Result<()> {
    let server = TestServer::start().await?;

    let res = server
        .client
        .get(server.url("/company/report/excel"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn report_downloads_xlsx() -> Result<()> {
    let server = TestServer::start().await?;
    server.create_company("Acme", 5, "Tech").await?;
    server.create_company("Globex", 3, "Retail").await?;

    let res = server
        .client
        .get(server.url("/company/report/excel"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = res.headers()[header::CONTENT_DISPOSITION].to_str()?.to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("companies.xlsx"));

    let bytes = res.bytes().await?;
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..2], b"PK");
    Ok(())
}

#[tokio::test]
async fn report_requires_admin() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, user_token) = server.create_user("plain").await?;

    let res = server.client.get(server.url("/company/report/excel")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/company/report/excel"))
        .bearer_auth(user_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}
