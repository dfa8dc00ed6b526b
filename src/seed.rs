use crate::AppState;
use crate::error::ApiError;
use crate::models::{DemoAccount, ROLE_ADMIN, ROLE_USER, User};
use crate::service::NewUser;

/// One demo account as shipped with the lab.
struct SeedUser {
    email: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    phone: &'static str,
    balance: f64,
    passport: &'static str,
    national_id: Option<&'static str>,
    admin: bool,
}

fn seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            email: "user@example.com",
            password: "password123",
            first_name: "John",
            last_name: "Doe",
            phone: "+33612345678",
            balance: 1000.0,
            passport: "FR123456789",
            national_id: None,
            admin: false,
        },
        SeedUser {
            email: "admin@example.com",
            password: "admin123",
            first_name: "Jane",
            last_name: "Smith",
            phone: "+33698765432",
            balance: 5000.0,
            passport: "FR987654321",
            national_id: None,
            admin: true,
        },
        SeedUser {
            email: "alice@example.com",
            password: "alice123",
            first_name: "Alice",
            last_name: "Johnson",
            phone: "+33656781234",
            balance: 2500.0,
            passport: "FR456789123",
            national_id: Some("1234567890123"),
            admin: false,
        },
    ]
}

/// run
///
/// Seeds the well-known roles and demo accounts. Idempotent: roles are only
/// inserted into an empty roles table, users into an empty users table, so
/// restarting against an existing database changes nothing.
pub async fn run(state: &AppState) -> Result<(), ApiError> {
    if state.repo.count_roles().await? == 0 {
        state
            .repo
            .create_role(ROLE_USER, Some("Standard user"))
            .await?;
        state
            .repo
            .create_role(ROLE_ADMIN, Some("Administrator"))
            .await?;
        tracing::info!("seeded roles {ROLE_USER}, {ROLE_ADMIN}");
    }

    if state.repo.count_users().await? > 0 {
        tracing::debug!("demo accounts already present, skipping user seed");
        return Ok(());
    }

    for account in seed_users() {
        let created = state
            .users
            .create_user(NewUser {
                email: account.email.to_string(),
                password: account.password.to_string(),
                first_name: account.first_name.to_string(),
                last_name: account.last_name.to_string(),
                role: ROLE_USER.to_string(),
            })
            .await?;

        // Enrich with the demo fields account creation does not cover.
        let enriched = User {
            phone_number: Some(account.phone.to_string()),
            account_balance: Some(account.balance),
            passport_number: Some(account.passport.to_string()),
            national_id: account.national_id.map(str::to_string),
            ..created
        };
        state.repo.save_user(&enriched).await?;

        if account.admin {
            state.users.grant_role(enriched.id, ROLE_ADMIN).await?;
        }

        tracing::info!(email = %enriched.email, admin = account.admin, "seeded demo account");
    }

    Ok(())
}

/// demo_accounts
///
/// The seeded credentials as advertised by `GET /info`.
pub fn demo_accounts() -> Vec<DemoAccount> {
    seed_users()
        .into_iter()
        .map(|account| DemoAccount {
            email: account.email.to_string(),
            password: account.password.to_string(),
            roles: if account.admin {
                vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()]
            } else {
                vec![ROLE_USER.to_string()]
            },
        })
        .collect()
}
