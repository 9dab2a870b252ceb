//! Administrator bootstrap

use anyhow::{Context, Result};

use biblio_core::{Config, Registration, Store};

use crate::output::Output;

/// Create an administrator account
pub fn create(
    config: Config,
    name: String,
    email: String,
    password: String,
    output: &Output,
) -> Result<()> {
    let mut store = Store::open_with_config(config).context("Failed to open database")?;
    let admin = store.create_admin(Registration {
        name,
        email,
        password,
    })?;

    output.print_user(&admin);
    output.success(&format!("Created administrator {}", admin.email));
    Ok(())
}
