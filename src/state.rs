use crate::db::{DbPool, OrmConn};
use crate::notify::Notifier;
use crate::pricing::PricingPolicy;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub pricing: PricingPolicy,
    pub notifier: Notifier,
}
