//! Command handling for the GoBarber CLI.
//!
//! `App` owns the configuration and the session store. Commands that need
//! the app screens check the store's navigation stack first, the same way
//! the mobile app chooses between its sign-in and app routes.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use gobarber_core::models::{AvailabilitySlot, NewAppointment, PasswordChange, ProfileUpdate, SignUp};
use gobarber_core::utils::{format_appointment_date, mask_token};
use gobarber_core::{ApiClient, Config, NavigationStack, RestoreOutcome, SessionStore, User};

use crate::Command;

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length accepted at sign-up.
const MIN_PASSWORD_LENGTH: usize = 6;

pub struct App {
    config: Config,
    store: SessionStore,
}

impl App {
    /// Build the session store and restore any saved session
    pub async fn start(config: Config) -> Result<Self> {
        let storage = config.open_storage()?;
        let api = ApiClient::new(config.api_url())?;
        let store = SessionStore::with_keys(storage, api, config.storage_keys());

        match store.initialize().await {
            RestoreOutcome::Restored => debug!("Saved session restored"),
            RestoreOutcome::NoSession => debug!("No saved session"),
            RestoreOutcome::RestoreFailed(reason) => {
                warn!(reason = %reason, "Saved session could not be restored");
            }
        }

        Ok(Self { config, store })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email } => self.login(email).await,
            Command::Logout => self.logout().await,
            Command::Whoami { json } => self.whoami(json),
            Command::Signup { name, email } => self.signup(name, email).await,
            Command::Profile {
                name,
                email,
                change_password,
            } => self.profile(name, email, change_password).await,
            Command::Avatar { path } => self.avatar(&path).await,
            Command::Providers => self.providers().await,
            Command::Availability { provider, date } => self.availability(&provider, date).await,
            Command::Book { provider, hour, date } => self.book(&provider, hour, date).await,
            Command::Status => self.status(),
        }
    }

    /// The signed-in user, or an error pointing at `gobarber login`
    fn require_app_stack(&self) -> Result<User> {
        match (self.store.navigation(), self.store.user()) {
            (NavigationStack::App, Some(user)) => Ok(user),
            _ => bail!("Not signed in. Run `gobarber login` first."),
        }
    }

    // ===== Auth screens =====

    async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(last) => {
                let input = prompt(&format!("Email [{}]: ", last))?;
                if input.is_empty() {
                    last
                } else {
                    input
                }
            }
            None => prompt("Email: ")?,
        };
        validate_email(&email)?;
        let password = rpassword::prompt_password("Password: ")?;

        println!("Signing in...");
        let session = self.store.sign_in(&email, &password).await?;

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Welcome, {}!", session.user.first_name());
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        let was_signed_in = self.store.is_authenticated();
        self.store.sign_out().await?;
        if was_signed_in {
            println!("Signed out.");
        } else {
            println!("Already signed out.");
        }
        Ok(())
    }

    async fn signup(&mut self, name: String, email: String) -> Result<()> {
        if name.trim().is_empty() {
            bail!("Name is required");
        }
        validate_email(&email)?;
        let password = rpassword::prompt_password("Password: ")?;
        validate_new_password(&password)?;
        let confirmation = rpassword::prompt_password("Confirm password: ")?;
        if confirmation != password {
            bail!("Passwords do not match");
        }

        self.store
            .api()
            .create_user(&SignUp {
                name,
                email: email.clone(),
                password,
            })
            .await?;

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!("Account created. Run `gobarber login` to sign in.");
        Ok(())
    }

    // ===== Profile screen =====

    fn whoami(&self, json: bool) -> Result<()> {
        let user = self.require_app_stack()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&user)?);
        } else {
            println!("{} <{}>", user.name, user.email);
            if user.has_avatar() {
                println!("Avatar: {}", user.avatar_url);
            }
        }
        Ok(())
    }

    async fn profile(&mut self, name: Option<String>, email: Option<String>, change_password: bool) -> Result<()> {
        let user = self.require_app_stack()?;
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let mut update = ProfileUpdate::new(name.unwrap_or(user.name), email.unwrap_or(user.email));
        if change_password {
            let old_password = rpassword::prompt_password("Current password: ")?;
            let password = rpassword::prompt_password("New password: ")?;
            let password_confirmation = rpassword::prompt_password("Confirm new password: ")?;
            update = update.with_password_change(password_change(old_password, password, password_confirmation)?);
        }

        let updated = self.store.update_profile(&update).await?;
        println!("Profile updated: {} <{}>", updated.name, updated.email);
        Ok(())
    }

    async fn avatar(&mut self, path: &std::path::Path) -> Result<()> {
        self.require_app_stack()?;
        let image = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let updated = self.store.update_avatar(image).await?;
        println!("Avatar updated: {}", updated.avatar_url);
        Ok(())
    }

    // ===== Dashboard & booking screens =====

    async fn providers(&self) -> Result<()> {
        let user = self.require_app_stack()?;
        let providers = self.store.api().fetch_providers().await?;

        println!("Hi {}, pick a provider:", user.first_name());
        if providers.is_empty() {
            println!("  (no providers available)");
        }
        for provider in providers {
            println!("  {}  {}", provider.id, provider.name);
        }
        Ok(())
    }

    async fn availability(&self, provider_id: &str, date: Option<NaiveDate>) -> Result<()> {
        self.require_app_stack()?;
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let availability = self.store.api().fetch_day_availability(provider_id, date).await?;

        println!("Availability on {}", date.format("%Y-%m-%d"));
        println!("Morning:   {}", slot_line(&availability.morning()));
        println!("Afternoon: {}", slot_line(&availability.afternoon()));
        Ok(())
    }

    async fn book(&self, provider_id: &str, hour: u32, date: Option<NaiveDate>) -> Result<()> {
        self.require_app_stack()?;
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let api = self.store.api();

        let (providers, availability) = futures::future::try_join(
            api.fetch_providers(),
            api.fetch_day_availability(provider_id, date),
        )
        .await?;

        let provider = providers
            .iter()
            .find(|p| p.id == provider_id)
            .with_context(|| format!("Unknown provider {}", provider_id))?;
        if !availability.is_available(hour) {
            bail!("{} is not available at {:02}:00 on {}", provider.name, hour, date);
        }

        let appointment = NewAppointment::at_hour(provider_id, date, hour)
            .with_context(|| format!("{:02}:00 on {} is not a valid local time", hour, date))?;
        api.create_appointment(&appointment).await?;

        println!(
            "Appointment booked with {} on {}",
            provider.name,
            format_appointment_date(&appointment.local_date())
        );
        Ok(())
    }

    fn status(&self) -> Result<()> {
        println!("API:       {}", self.config.api_url());
        println!("Storage:   {:?} ({})", self.config.storage, self.store.keys().token);
        match self.store.navigation() {
            NavigationStack::App => {
                let token = self.store.token().unwrap_or_default();
                let user = self.store.user().map(|u| u.email).unwrap_or_default();
                println!("Session:   signed in as {} (token {})", user, mask_token(&token));
            }
            NavigationStack::Auth | NavigationStack::Splash => println!("Session:   signed out"),
        }
        Ok(())
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Rough shape check: `local@domain.tld`, no whitespace
fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        bail!("Enter a valid email address");
    }
    Ok(())
}

fn validate_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
    }
    Ok(())
}

fn password_change(old_password: String, password: String, password_confirmation: String) -> Result<PasswordChange> {
    if old_password.is_empty() {
        bail!("Current password is required to change it");
    }
    validate_new_password(&password)?;
    if password != password_confirmation {
        bail!("Passwords do not match");
    }
    Ok(PasswordChange {
        old_password,
        password,
        password_confirmation,
    })
}

/// One line of slot labels, unavailable hours struck out with `-`
fn slot_line(slots: &[AvailabilitySlot]) -> String {
    if slots.is_empty() {
        return "(none)".to_string();
    }
    slots
        .iter()
        .map(|slot| {
            if slot.available {
                slot.label.clone()
            } else {
                format!("-{}-", slot.label)
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(hour: u32, available: bool) -> AvailabilitySlot {
        AvailabilitySlot {
            hour,
            available,
            label: format!("{:02}:00", hour),
        }
    }

    #[test]
    fn test_slot_line() {
        assert_eq!(slot_line(&[]), "(none)");
        assert_eq!(slot_line(&[slot(8, true), slot(9, false)]), "08:00  -09:00-");
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last@mail.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("a.b.com").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a@b.com.").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("a b@c.com").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("12345").is_err());
        assert!(validate_new_password("123456").is_ok());
    }

    #[test]
    fn test_password_change_rules() {
        assert!(password_change(String::new(), "secret1".into(), "secret1".into()).is_err());
        assert!(password_change("old".into(), "secret1".into(), "secret2".into()).is_err());
        assert!(password_change("old".into(), "short".into(), "short".into()).is_err());

        let change = password_change("old".into(), "secret1".into(), "secret1".into()).unwrap();
        assert_eq!(change.password, "secret1");
    }
}
