//! Terminal registration form. Prompts for each field, validates locally and
//! submits to the registration service.

use std::{io::Write, time::Duration};

use anyhow::Context;
use signup::{
    form::{FormField, HttpTransport, RegistrationForm},
    telemetry,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init("signup=warn");

    let base_url =
        std::env::var("REGISTER_API_URL").unwrap_or_else(|_| "http://localhost:5000".into());
    let timeout = std::env::var("REGISTER_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(10);

    let transport = HttpTransport::new(&base_url, Duration::from_secs(timeout))
        .context("build HTTP client")?;
    let form = RegistrationForm::new(transport);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Registration Form");
    loop {
        for field in FormField::ALL {
            let current = form.state().get(field).to_string();
            let Some(input) = prompt(&mut lines, field, &current).await? else {
                return Ok(());
            };
            if input.is_empty() && !current.is_empty() {
                continue;
            }
            form.update_field(field, &input);
            if field == FormField::Username {
                let kept = form.state().username;
                if kept != input {
                    println!("  username set to \"{kept}\"");
                }
            }
        }

        let outcome = form.submit().await;
        println!("{}", outcome.message());
        if outcome.is_success() {
            return Ok(());
        }

        print!("Correct and retry? [Y/n] ");
        std::io::stdout().flush()?;
        match lines.next_line().await? {
            Some(answer) if retry_requested(&answer) => {}
            _ => return Ok(()),
        }
    }
}

/// Anything but an explicit "n" means try again.
fn retry_requested(answer: &str) -> bool {
    !answer.trim().eq_ignore_ascii_case("n")
}

/// Read one value; `None` on end of input. An empty answer keeps `current`.
async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    field: FormField,
    current: &str,
) -> anyhow::Result<Option<String>> {
    let shown = if field == FormField::Password && !current.is_empty() {
        "********"
    } else {
        current
    };
    if shown.is_empty() {
        print!("{}: ", field.placeholder());
    } else {
        print!("{} [{}]: ", field.placeholder(), shown);
    }
    std::io::stdout().flush()?;
    let line = lines.next_line().await?;
    Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_n_declines_a_retry() {
        assert!(!retry_requested("n"));
        assert!(!retry_requested(" N \n"));
        assert!(retry_requested(""));
        assert!(retry_requested("y"));
        assert!(retry_requested("no thanks"));
    }
}
