//! Repository implementations for the Accounts domain

pub mod refresh_tokens;
pub mod users;

use sqlx::PgPool;

pub use refresh_tokens::RefreshTokenRepository;
pub use users::UserRepository;

/// Combined repository access for the Accounts domain
#[derive(Clone)]
pub struct AccountsRepositories {
    pub users: UserRepository,
    pub refresh_tokens: RefreshTokenRepository,
}

impl AccountsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            refresh_tokens: RefreshTokenRepository::new(pool),
        }
    }
}
