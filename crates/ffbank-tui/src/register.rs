//! `ffbank --register`: create an account from the command line.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use ffbank_core::registration::{success_message, RegistrationError, RegistrationForm};
use ffbank_core::{ApiClient, Config};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Ask for every field, validate, and create the account.
pub async fn run(config: &Config) -> Result<()> {
    let api = ApiClient::new(&config.api_base_url())?;

    println!("Create your FFBank account");
    println!();

    let mut form = RegistrationForm::new();
    form.name = prompt("Full name")?;
    form.set_cpf(&prompt("CPF")?);
    if !form.cpf().is_empty() {
        println!("CPF: {}", form.cpf());
    }
    form.nickname = prompt("Nickname")?;
    form.password = rpassword::prompt_password("Password: ")?;
    form.confirm_password = rpassword::prompt_password("Confirm password: ")?;

    match form.submit(&api).await {
        Ok(account) => {
            info!(nickname = %account.nickname, "Account created");
            println!();
            println!("{}", success_message(&account.nickname));
            println!("Run `ffbank` to sign in.");
            Ok(())
        }
        Err(RegistrationError::Api(e)) => {
            warn!(error = %e, "Registration rejected");
            anyhow::bail!("{}", e.user_message())
        }
        Err(e) => anyhow::bail!("{}", e),
    }
}
