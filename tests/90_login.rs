mod common;

use anyhow::Result;

use backoffice_admin::pages::login::LoginForm;
use backoffice_admin::pages::{PageContext, TableKind};
use backoffice_admin::session::guard::{check, Access, Route};
use backoffice_admin::session::SessionContext;
use common::{TestServer, ADMIN, SUPERUSER};

#[tokio::test]
async fn login_form_lands_on_orders() -> Result<()> {
    let server = TestServer::start().await?;
    let client = server.client()?;
    let mut session = SessionContext::anonymous();

    assert_eq!(check(&session, Route::Orders), Access::Redirect(Route::Login));

    let mut form = LoginForm::new(ADMIN.0, ADMIN.1);
    assert_eq!(form.submit(&mut session, &client).await, Some(Route::Orders));
    assert!(matches!(check(&session, Route::Users), Access::Allow(_)));
    assert_eq!(check(&session, Route::Login), Access::Redirect(Route::Orders));
    assert_eq!(Route::visible_for(session.user()), vec![Route::Orders, Route::Users, Route::Products]);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_keep_the_form() -> Result<()> {
    let server = TestServer::start().await?;
    let client = server.client()?;
    let mut session = SessionContext::anonymous();

    let mut form = LoginForm::new(ADMIN.0, "nope");
    assert_eq!(form.submit(&mut session, &client).await, None);
    assert_eq!(form.error.as_deref(), Some("Invalid username or password."));
    assert_eq!(form.username, "admin");
    assert!(form.password.is_empty());
    assert!(!session.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn unreachable_server_shows_a_generic_message() -> Result<()> {
    let port = portpicker::pick_unused_port().expect("free port");
    let client = backoffice_admin::client::AdminClient::new(
        &format!("http://127.0.0.1:{}", port),
        std::time::Duration::from_secs(1),
    )?;
    let mut session = SessionContext::anonymous();

    let mut form = LoginForm::new(ADMIN.0, ADMIN.1);
    assert_eq!(form.submit(&mut session, &client).await, None);
    assert_eq!(form.error.as_deref(), Some("Login failed. Please try again."));
    Ok(())
}

#[tokio::test]
async fn superusers_are_kept_off_the_users_page() -> Result<()> {
    let server = TestServer::start().await?;
    let (client, session) = server.login(SUPERUSER).await?;

    assert_eq!(check(&session, Route::Users), Access::Redirect(Route::Orders));
    assert_eq!(Route::visible_for(session.user()), vec![Route::Orders, Route::Products]);

    // the server enforces the same rule if the guard is bypassed
    let ctx = PageContext::new(client, &session);
    let mut users = ctx.table(TableKind::Users).await;
    users.mount().await;
    assert_eq!(users.state().error(), Some("Failed to load data."));
    assert!(users.state().rows().is_empty());
    Ok(())
}
