//! Login/logout commands.

use cartwheel_storefront::session;

use super::context;

/// Log in against the remote API and persist the credential.
#[allow(clippy::print_stdout)]
pub async fn login(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (gateway, store) = context()?;
    let user = session::login(&gateway, &store, email, password).await?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

/// Drop the stored credential and actor record.
#[allow(clippy::print_stdout)]
pub fn logout() -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = context()?;
    session::logout(&store)?;
    println!("Logged out");
    Ok(())
}
